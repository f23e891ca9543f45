use crate::error::Result;
use crate::objects::{Name, NodeId, Value};

use super::CloneContext;

/// Position of an entry inside the composite being cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'k> {
    Index(usize),
    Key(&'k Name),
}

impl Slot<'_> {
    pub fn is_key(&self, key: &str) -> bool {
        matches!(self, Slot::Key(name) if name.as_str() == key)
    }
}

/// Clone-time hook pair for one family of composite nodes.
///
/// The first filter of a [`Cloner`](super::Cloner) whose [`matches`] holds
/// governs a composite; its children pick their own filter.
///
/// [`matches`]: CloneFilter::matches
pub trait CloneFilter {
    fn name(&self) -> &str;

    /// Whether this filter governs the source composite `value`.
    fn matches(&self, cx: &mut CloneContext<'_>, value: &Value) -> Result<bool>;

    /// Called with the source composite and entry; `false` skips the entry.
    fn before_clone_entry(
        &self,
        _cx: &mut CloneContext<'_>,
        _source: NodeId,
        _slot: Slot<'_>,
        _value: &Value,
    ) -> Result<bool> {
        Ok(true)
    }

    /// Called with the clone under construction and the entry just added.
    fn after_clone_entry(
        &self,
        _cx: &mut CloneContext<'_>,
        _clone: NodeId,
        _slot: Slot<'_>,
        _value: &Value,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once the clone holds every entry.
    fn after_clone(&self, _cx: &mut CloneContext<'_>, _clone: NodeId, _source: NodeId) -> Result<()> {
        Ok(())
    }
}

/// Governs every composite no other filter claims.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFilter;

impl CloneFilter for DefaultFilter {
    fn name(&self) -> &str {
        "default"
    }

    fn matches(&self, _cx: &mut CloneContext<'_>, _value: &Value) -> Result<bool> {
        Ok(true)
    }
}
