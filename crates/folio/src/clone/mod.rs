//! Deep copy of subgraphs, within a registry or across registries.
//!
//! # Overview
//!
//! | Mode | References | Entry point |
//! |------|------------|-------------|
//! | local | copied as-is (same registry) | [`Cloner::clone_local`] |
//! | alien | remapped to fresh objects in the target | [`Cloner::clone`], [`Cloner::session`] |
//!
//! Composites are rebuilt child by child. Each composite is governed by the
//! first [`CloneFilter`] whose `matches` holds, falling back to
//! [`DefaultFilter`]; the filter may veto entries and adjust the clone once
//! it is built.
//!
//! An alien clone allocates the target object before cloning its data and
//! remembers it by source object number for the rest of the session, so
//! reference cycles terminate and an object reached twice is cloned once.

mod annotation;
mod filter;
mod page;

pub use annotation::AnnotationFilter;
pub use filter::{CloneFilter, DefaultFilter, Slot};
pub use page::PageFilter;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::config::CloneConfig;
use crate::error::Result;
use crate::objects::{NodeId, Reference, Value};
use crate::registry::Registry;
use crate::traversal::{accept, Visitor};

pub struct Cloner {
    filters: Vec<Box<dyn CloneFilter>>,
}

impl fmt::Debug for Cloner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}

impl Default for Cloner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cloner {
    /// Cloner with the built-in page and annotation filters.
    pub fn new() -> Self {
        Self::from_config(&CloneConfig::default())
    }

    /// Cloner without filters.
    pub fn bare() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn from_config(config: &CloneConfig) -> Self {
        let mut cloner = Self::bare();
        if config.page_consolidation {
            cloner = cloner.with_filter(PageFilter::new(config.inheritable_keys.clone()));
        }
        if config.annotation_registration {
            cloner = cloner.with_filter(AnnotationFilter);
        }
        cloner
    }

    /// Append `filter` to the chain; earlier filters take precedence.
    pub fn with_filter(mut self, filter: impl CloneFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Clone `value` from `source` into `target`.
    pub fn clone(&self, source: &mut Registry, value: &Value, target: &mut Registry) -> Result<Value> {
        debug!(source = source.id(), target = target.id(), "alien clone");
        self.session(source, target).clone_value(value)
    }

    /// Open an alien clone session; objects are shared across its calls.
    pub fn session<'a>(&'a self, source: &'a mut Registry, target: &'a mut Registry) -> CloneContext<'a> {
        CloneContext {
            cloner: self,
            mode: Mode::Alien { source, target },
            in_flight: HashMap::new(),
        }
    }

    /// Deep copy inside one registry; references are kept.
    pub fn clone_local(&self, registry: &mut Registry, value: &Value) -> Result<Value> {
        let mut cx = CloneContext {
            cloner: self,
            mode: Mode::Local(registry),
            in_flight: HashMap::new(),
        };
        cx.clone_value(value)
    }
}

// ── Context ───────────────────────────────────────────────────────────────

enum Mode<'a> {
    Local(&'a mut Registry),
    Alien {
        source: &'a mut Registry,
        target: &'a mut Registry,
    },
}

/// State of one clone session, handed to every filter hook.
pub struct CloneContext<'a> {
    cloner: &'a Cloner,
    mode: Mode<'a>,
    in_flight: HashMap<u32, Reference>,
}

impl<'a> CloneContext<'a> {
    /// Registry the values being cloned live in.
    pub fn source(&mut self) -> &mut Registry {
        match &mut self.mode {
            Mode::Local(registry) => &mut **registry,
            Mode::Alien { source, .. } => &mut **source,
        }
    }

    /// Registry the clones are built in.
    pub fn target(&mut self) -> &mut Registry {
        match &mut self.mode {
            Mode::Local(registry) => &mut **registry,
            Mode::Alien { target, .. } => &mut **target,
        }
    }

    pub fn is_alien(&self) -> bool {
        matches!(self.mode, Mode::Alien { .. })
    }

    /// Target reference already allocated for a source object, if any.
    pub fn cloned_object(&self, number: u32) -> Option<Reference> {
        self.in_flight.get(&number).copied()
    }

    /// Clone one source value into the target.
    pub fn clone_value(&mut self, value: &Value) -> Result<Value> {
        accept(&mut CloneVisitor, self, value)
    }

    fn select(&mut self, value: &Value) -> Result<&'a dyn CloneFilter> {
        let cloner: &'a Cloner = self.cloner;
        for filter in &cloner.filters {
            if filter.matches(self, value)? {
                return Ok(filter.as_ref());
            }
        }
        Ok(&DefaultFilter)
    }

    fn clone_entries(&mut self, filter: &dyn CloneFilter, source: NodeId, clone: NodeId) -> Result<()> {
        let entries = self.source().dict_entries(source)?;
        for (key, value) in &entries {
            if !filter.before_clone_entry(self, source, Slot::Key(key), value)? {
                continue;
            }
            let cloned = self.clone_value(value)?;
            self.target().dict_set(clone, key.clone(), cloned.clone())?;
            filter.after_clone_entry(self, clone, Slot::Key(key), &cloned)?;
        }
        Ok(())
    }

    fn finish(&mut self, filter: &dyn CloneFilter, source: NodeId, clone: NodeId) -> Result<()> {
        filter.after_clone(self, clone, source)?;
        if self.source().is_virtual(source)? {
            self.target().node_mut(clone)?.virtual_ = true;
        }
        Ok(())
    }
}

// ── Visitor ───────────────────────────────────────────────────────────────

struct CloneVisitor;

impl<'a> Visitor<CloneContext<'a>> for CloneVisitor {
    type Output = Value;

    fn visit_scalar(&mut self, _cx: &mut CloneContext<'a>, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }

    fn visit_array(&mut self, cx: &mut CloneContext<'a>, id: NodeId) -> Result<Value> {
        let filter = cx.select(&Value::Array(id))?;
        let clone_id = cx.target().alloc_array();
        let items = cx.source().array_items(id)?;
        for (index, item) in items.iter().enumerate() {
            if !filter.before_clone_entry(cx, id, Slot::Index(index), item)? {
                continue;
            }
            let cloned = cx.clone_value(item)?;
            cx.target().array_push(clone_id, cloned.clone())?;
            filter.after_clone_entry(cx, clone_id, Slot::Index(index), &cloned)?;
        }
        cx.finish(filter, id, clone_id)?;
        Ok(Value::Array(clone_id))
    }

    fn visit_dictionary(&mut self, cx: &mut CloneContext<'a>, id: NodeId) -> Result<Value> {
        let filter = cx.select(&Value::Dictionary(id))?;
        let clone_id = cx.target().alloc_dictionary();
        cx.clone_entries(filter, id, clone_id)?;
        cx.finish(filter, id, clone_id)?;
        Ok(Value::Dictionary(clone_id))
    }

    fn visit_stream(&mut self, cx: &mut CloneContext<'a>, id: NodeId) -> Result<Value> {
        let filter = cx.select(&Value::Stream(id))?;
        let decoded = cx.source().is_decoded(id)?;
        // an external body stays linked to its file so the /F header still describes it
        let external = cx
            .source()
            .node(id)?
            .stream_body()
            .and_then(|body| body.external_path())
            .map(|path| path.to_path_buf());
        let clone_id = match external {
            Some(path) => cx.target().alloc_external_stream(path, decoded),
            None => {
                let body = cx.source().stream_body(id)?;
                cx.target().alloc_stream(body)
            }
        };
        cx.clone_entries(filter, id, clone_id)?;
        cx.target().set_decoded(clone_id, decoded)?;
        cx.finish(filter, id, clone_id)?;
        Ok(Value::Stream(clone_id))
    }

    fn visit_reference(&mut self, cx: &mut CloneContext<'a>, reference: Reference) -> Result<Value> {
        if !cx.is_alien() {
            return Ok(Value::Reference(reference));
        }
        if let Some(cloned) = cx.cloned_object(reference.number) {
            return Ok(Value::Reference(cloned));
        }
        self.visit_object(cx, reference)
    }

    fn visit_object(&mut self, cx: &mut CloneContext<'a>, reference: Reference) -> Result<Value> {
        let data = cx.source().object_data(reference)?;
        let adopted = cx.target().adopt(reference);
        cx.in_flight.insert(reference.number, adopted);
        let cloned = cx.clone_value(&data)?;
        cx.target().set_object_data(adopted.number, cloned)?;
        Ok(Value::Reference(adopted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equal::equivalent;
    use crate::objects::Primitive;

    #[test]
    fn test_local_clone_keeps_references() {
        let mut registry = Registry::new();
        let value = registry.import(&Primitive::dict([
            ("Ref", Primitive::reference(1, 0)),
            ("Arr", Primitive::array([Primitive::Integer(1)])),
        ]));
        let objects = registry.len();
        let clone = Cloner::new().clone_local(&mut registry, &value).unwrap();
        assert_ne!(clone, value);
        assert_eq!(registry.view(&clone).unwrap(), registry.view(&value).unwrap());
        assert_eq!(registry.len(), objects);
    }

    #[test]
    fn test_alien_clone_remaps_references() {
        let mut source = Registry::new();
        let leaf = source.import(&Primitive::dict([("V", Primitive::Integer(7))]));
        let leaf_ref = source.register(leaf).unwrap();
        let root = source.import(&Primitive::array([Primitive::Reference(leaf_ref)]));

        let mut target = Registry::new();
        let clone = Cloner::new().clone(&mut source, &root, &mut target).unwrap();
        let item = target.array_get(clone.node().unwrap(), 0).unwrap().clone();
        let cloned_ref = item.as_reference().unwrap();
        assert!(target.is_registered(cloned_ref));
        assert!(equivalent(&mut source, &root, &mut target, &clone).unwrap());
    }

    #[test]
    fn test_alien_clone_shares_objects_within_session() {
        let mut source = Registry::new();
        let shared = source.register(Value::Integer(1)).unwrap();
        let a = source.import(&Primitive::array([Primitive::Reference(shared)]));
        let b = source.import(&Primitive::array([Primitive::Reference(shared)]));

        let mut target = Registry::new();
        let cloner = Cloner::new();
        let mut session = cloner.session(&mut source, &mut target);
        let ca = session.clone_value(&a).unwrap();
        let cb = session.clone_value(&b).unwrap();
        let first = session.target().array_get(ca.node().unwrap(), 0).unwrap().clone();
        let second = session.target().array_get(cb.node().unwrap(), 0).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_cycle_terminates() {
        let mut source = Registry::new();
        let a = source.create_dictionary();
        let a_ref = source.register(a.clone()).unwrap();
        source
            .dict_set(a.node().unwrap(), "Self", Value::Reference(a_ref))
            .unwrap();

        let mut target = Registry::new();
        let clone = Cloner::bare()
            .clone(&mut source, &Value::Reference(a_ref), &mut target)
            .unwrap();
        let clone_ref = clone.as_reference().unwrap();
        let data = target.resolve(&clone).unwrap();
        assert_eq!(
            target.dict_get(data.node().unwrap(), "Self").unwrap(),
            Some(&Value::Reference(clone_ref))
        );
    }

    #[test]
    fn test_virtual_flag_survives_clone() {
        let mut registry = Registry::new();
        let dict = registry.create_dictionary().node().unwrap();
        let placeholder = registry
            .get_or_insert_virtual(dict, "Opt", &Primitive::array([]))
            .unwrap();
        let clone = Cloner::bare()
            .clone_local(&mut registry, &Value::Dictionary(dict))
            .unwrap();
        let cloned_placeholder = registry
            .dict_get(clone.node().unwrap(), "Opt")
            .unwrap()
            .cloned()
            .unwrap();
        assert_ne!(cloned_placeholder, placeholder);
        assert!(registry.is_virtual(cloned_placeholder.node().unwrap()).unwrap());
    }
}
