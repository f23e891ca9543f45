use std::collections::HashSet;

use crate::error::Result;
use crate::objects::{NodeId, Value};
use crate::registry::Registry;

use super::Facade;

/// A page dictionary of the page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    base: Value,
}

impl Facade for Page {
    fn wrap(base: Value) -> Self {
        Self { base }
    }

    fn base(&self) -> &Value {
        &self.base
    }

    fn into_base(self) -> Value {
        self.base
    }
}

impl Page {
    pub fn node(&self, registry: &mut Registry) -> Result<NodeId> {
        registry.resolve_dictionary(&self.base, "page")
    }

    /// Whether `node` is tagged `/Type /Page`.
    pub fn is_page(registry: &mut Registry, node: NodeId) -> Result<bool> {
        Ok(registry
            .resolve_entry(node, "Type")?
            .map(|t| t.is_name("Page"))
            .unwrap_or(false))
    }

    /// `key` from the page itself or, failing that, its nearest ancestor.
    pub fn inherited_attribute(&self, registry: &mut Registry, key: &str) -> Result<Option<Value>> {
        let node = self.node(registry)?;
        if let Some(value) = registry.dict_get(node, key)?.cloned() {
            return Ok(Some(value));
        }
        Self::ancestor_attribute(registry, node, key)
    }

    /// `key` from the nearest `/Parent` ancestor of `node` defining it.
    ///
    /// The value is returned as stored in that ancestor. A `/Parent` cycle
    /// ends the search.
    pub fn ancestor_attribute(registry: &mut Registry, node: NodeId, key: &str) -> Result<Option<Value>> {
        let mut seen = HashSet::from([node]);
        let mut current = node;
        while let Some(parent) = registry.dict_get(current, "Parent")?.cloned() {
            let parent = registry.resolve_dictionary(&parent, "page /Parent")?;
            if !seen.insert(parent) {
                break;
            }
            if let Some(value) = registry.dict_get(parent, key)?.cloned() {
                return Ok(Some(value));
            }
            current = parent;
        }
        Ok(None)
    }

    pub fn resources(&self, registry: &mut Registry) -> Result<Option<Value>> {
        self.inherited_attribute(registry, "Resources")
    }

    pub fn media_box(&self, registry: &mut Registry) -> Result<Option<Value>> {
        self.inherited_attribute(registry, "MediaBox")
    }

    /// `/Rotate`, defaulting to `0`.
    pub fn rotation(&self, registry: &mut Registry) -> Result<i64> {
        match self.inherited_attribute(registry, "Rotate")? {
            Some(value) => Ok(registry.resolve(&value)?.as_integer().unwrap_or(0)),
            None => Ok(0),
        }
    }
}
