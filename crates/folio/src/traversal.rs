//! Traversal contract.
//!
//! Node kinds form a closed set, so a whole-graph operation is a
//! [`Visitor`] with one method per kind and [`accept`] is the only
//! dispatch: an exhaustive `match` on [`Value`]. The context `C` carries
//! whatever the operation needs to reach node data (a [`Registry`] for
//! plain walks, a clone session for the cloner).

use std::collections::BTreeSet;

use crate::error::Result;
use crate::objects::{NodeId, Reference, Value};
use crate::registry::Registry;

pub trait Visitor<C: ?Sized> {
    type Output;

    /// Every scalar kind and `Null`.
    fn visit_scalar(&mut self, cx: &mut C, value: &Value) -> Result<Self::Output>;

    fn visit_array(&mut self, cx: &mut C, id: NodeId) -> Result<Self::Output>;

    fn visit_dictionary(&mut self, cx: &mut C, id: NodeId) -> Result<Self::Output>;

    fn visit_stream(&mut self, cx: &mut C, id: NodeId) -> Result<Self::Output>;

    fn visit_reference(&mut self, cx: &mut C, reference: Reference) -> Result<Self::Output>;

    /// The indirect object behind `reference`, as a unit.
    fn visit_object(&mut self, cx: &mut C, reference: Reference) -> Result<Self::Output>;
}

/// Dispatch `value` to the matching visitor method.
pub fn accept<C, V>(visitor: &mut V, cx: &mut C, value: &Value) -> Result<V::Output>
where
    C: ?Sized,
    V: Visitor<C> + ?Sized,
{
    match value {
        Value::Null
        | Value::Boolean(_)
        | Value::Integer(_)
        | Value::Real(_)
        | Value::Name(_)
        | Value::String(_)
        | Value::Date(_) => visitor.visit_scalar(cx, value),
        Value::Array(id) => visitor.visit_array(cx, *id),
        Value::Dictionary(id) => visitor.visit_dictionary(cx, *id),
        Value::Stream(id) => visitor.visit_stream(cx, *id),
        Value::Reference(reference) => visitor.visit_reference(cx, *reference),
    }
}

// ── Reachability ──────────────────────────────────────────────────────────

/// Collects the numbers of every object reachable from a value.
///
/// Each object is entered once, so reference cycles terminate.
#[derive(Debug, Default)]
pub struct Reachability {
    visited: BTreeSet<u32>,
}

impl Reachability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_visited(self) -> BTreeSet<u32> {
        self.visited
    }

    fn visit_children(&mut self, registry: &mut Registry, children: Vec<Value>) -> Result<()> {
        for child in &children {
            accept(self, registry, child)?;
        }
        Ok(())
    }
}

impl Visitor<Registry> for Reachability {
    type Output = ();

    fn visit_scalar(&mut self, _cx: &mut Registry, _value: &Value) -> Result<()> {
        Ok(())
    }

    fn visit_array(&mut self, cx: &mut Registry, id: NodeId) -> Result<()> {
        let items = cx.array_items(id)?;
        self.visit_children(cx, items)
    }

    fn visit_dictionary(&mut self, cx: &mut Registry, id: NodeId) -> Result<()> {
        let values = cx.dict_entries(id)?.into_iter().map(|(_, v)| v).collect();
        self.visit_children(cx, values)
    }

    fn visit_stream(&mut self, cx: &mut Registry, id: NodeId) -> Result<()> {
        self.visit_dictionary(cx, id)
    }

    fn visit_reference(&mut self, cx: &mut Registry, reference: Reference) -> Result<()> {
        if self.visited.insert(reference.number) {
            self.visit_object(cx, reference)?;
        }
        Ok(())
    }

    fn visit_object(&mut self, cx: &mut Registry, reference: Reference) -> Result<()> {
        let data = cx.object_data(reference)?;
        accept(self, cx, &data)
    }
}

impl Registry {
    /// Object numbers reachable from `value` through references.
    pub fn reachable(&mut self, value: &Value) -> Result<BTreeSet<u32>> {
        let mut walk = Reachability::new();
        accept(&mut walk, self, value)?;
        Ok(walk.into_visited())
    }
}
