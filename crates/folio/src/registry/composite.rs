//! Composite node operations: the only mutators of array and dictionary
//! children.
//!
//! Every attach goes through [`Registry::include`] and every change ends in
//! [`Registry::update`] on the mutated node. Values that fall out of a
//! composite are returned detached; feed them to [`Registry::release`] to
//! reclaim their arena slots.

use std::path::PathBuf;

use super::node::{NodeBody, StreamBody};
use super::{Entries, Owner, Registry};
use crate::error::{Error, Result};
use crate::objects::{Kind, Name, NodeId, Value};

impl Registry {
    // ── Creation ──────────────────────────────────────────────────────────

    pub fn create_array(&mut self) -> Value {
        Value::Array(self.alloc_array())
    }

    pub fn create_dictionary(&mut self) -> Value {
        Value::Dictionary(self.alloc_dictionary())
    }

    /// New stream with an empty header and a decoded, in-memory body.
    pub fn create_stream(&mut self, body: Vec<u8>) -> Value {
        Value::Stream(self.alloc_stream(body))
    }

    pub(crate) fn alloc_array(&mut self) -> NodeId {
        self.alloc(NodeBody::Array(Vec::new()))
    }

    pub(crate) fn alloc_dictionary(&mut self) -> NodeId {
        self.alloc(NodeBody::Dictionary(Entries::new()))
    }

    pub(crate) fn alloc_stream(&mut self, body: Vec<u8>) -> NodeId {
        let mut body = StreamBody::in_memory(body, true);
        body.dirty = true;
        self.alloc(NodeBody::Stream {
            header: Entries::new(),
            body,
        })
    }

    pub(crate) fn alloc_external_stream(&mut self, path: PathBuf, decoded: bool) -> NodeId {
        let mut body = StreamBody::external(path, decoded);
        body.dirty = true;
        self.alloc(NodeBody::Stream {
            header: Entries::new(),
            body,
        })
    }

    // ── Raw access ────────────────────────────────────────────────────────

    pub(crate) fn entries(&self, id: NodeId) -> Result<&Entries> {
        let slot = self.node(id)?;
        match &slot.body {
            NodeBody::Dictionary(entries) | NodeBody::Stream { header: entries, .. } => Ok(entries),
            NodeBody::Array(_) => Err(Error::type_mismatch(
                Kind::Dictionary,
                Kind::Array,
                format!("node {}", id.0),
            )),
        }
    }

    pub(crate) fn entries_mut(&mut self, id: NodeId) -> Result<&mut Entries> {
        let slot = self.node_mut(id)?;
        match &mut slot.body {
            NodeBody::Dictionary(entries) | NodeBody::Stream { header: entries, .. } => Ok(entries),
            NodeBody::Array(_) => Err(Error::type_mismatch(
                Kind::Dictionary,
                Kind::Array,
                format!("node {}", id.0),
            )),
        }
    }

    pub(crate) fn items(&self, id: NodeId) -> Result<&Vec<Value>> {
        let slot = self.node(id)?;
        match &slot.body {
            NodeBody::Array(items) => Ok(items),
            _ => Err(Error::type_mismatch(
                Kind::Array,
                slot.kind(),
                format!("node {}", id.0),
            )),
        }
    }

    pub(crate) fn items_mut(&mut self, id: NodeId) -> Result<&mut Vec<Value>> {
        let slot = self.node_mut(id)?;
        let kind = slot.kind();
        match &mut slot.body {
            NodeBody::Array(items) => Ok(items),
            _ => Err(Error::type_mismatch(
                Kind::Array,
                kind,
                format!("node {}", id.0),
            )),
        }
    }

    // ── Dictionaries ──────────────────────────────────────────────────────

    /// Entry `key` of a dictionary or stream header, unresolved.
    pub fn dict_get(&self, id: NodeId, key: &str) -> Result<Option<&Value>> {
        Ok(self.entries(id)?.get(key))
    }

    /// Entry `key`, following a reference if it holds one.
    pub fn resolve_entry(&mut self, id: NodeId, key: &str) -> Result<Option<Value>> {
        match self.dict_get(id, key)?.cloned() {
            Some(value) => self.resolve(&value).map(Some),
            None => Ok(None),
        }
    }

    pub fn dict_contains(&self, id: NodeId, key: &str) -> Result<bool> {
        Ok(self.entries(id)?.contains_key(key))
    }

    pub fn dict_len(&self, id: NodeId) -> Result<usize> {
        Ok(self.entries(id)?.len())
    }

    pub fn dict_keys(&self, id: NodeId) -> Result<Vec<Name>> {
        Ok(self.entries(id)?.keys().cloned().collect())
    }

    pub fn dict_entries(&self, id: NodeId) -> Result<Vec<(Name, Value)>> {
        Ok(self
            .entries(id)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Set `key` to `value`; returns the previous value, detached.
    ///
    /// An owned composite `value` is copied before it is attached.
    pub fn dict_set(
        &mut self,
        id: NodeId,
        key: impl Into<Name>,
        value: Value,
    ) -> Result<Option<Value>> {
        self.entries(id)?;
        self.ensure_mutable(id)?;
        let value = self.include(value, Owner::Node(id))?;
        let old = self.entries_mut(id)?.insert(key.into(), value);
        if let Some(old) = &old {
            self.exclude(old);
        }
        self.update(id)?;
        Ok(old)
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn dict_remove(&mut self, id: NodeId, key: &str) -> Result<Option<Value>> {
        self.ensure_mutable(id)?;
        let old = self.entries_mut(id)?.shift_remove(key);
        if let Some(old) = &old {
            self.exclude(old);
            self.update(id)?;
        }
        Ok(old)
    }

    // ── Arrays ────────────────────────────────────────────────────────────

    pub fn array_len(&self, id: NodeId) -> Result<usize> {
        Ok(self.items(id)?.len())
    }

    pub fn array_get(&self, id: NodeId, index: usize) -> Result<&Value> {
        let items = self.items(id)?;
        items.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: items.len(),
        })
    }

    /// Item `index`, following a reference if it holds one.
    pub fn resolve_item(&mut self, id: NodeId, index: usize) -> Result<Value> {
        let value = self.array_get(id, index)?.clone();
        self.resolve(&value)
    }

    pub fn array_items(&self, id: NodeId) -> Result<Vec<Value>> {
        Ok(self.items(id)?.clone())
    }

    pub fn array_position(&self, id: NodeId, value: &Value) -> Result<Option<usize>> {
        Ok(self.items(id)?.iter().position(|v| v == value))
    }

    pub fn array_push(&mut self, id: NodeId, value: Value) -> Result<()> {
        self.items(id)?;
        self.ensure_mutable(id)?;
        let value = self.include(value, Owner::Node(id))?;
        self.items_mut(id)?.push(value);
        self.update(id)
    }

    pub fn array_insert(&mut self, id: NodeId, index: usize, value: Value) -> Result<()> {
        let len = self.array_len(id)?;
        self.ensure_mutable(id)?;
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let value = self.include(value, Owner::Node(id))?;
        self.items_mut(id)?.insert(index, value);
        self.update(id)
    }

    /// Replace item `index`; returns the previous item, detached.
    pub fn array_set(&mut self, id: NodeId, index: usize, value: Value) -> Result<Value> {
        let len = self.array_len(id)?;
        self.ensure_mutable(id)?;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let value = self.include(value, Owner::Node(id))?;
        let old = std::mem::replace(&mut self.items_mut(id)?[index], value);
        self.exclude(&old);
        self.update(id)?;
        Ok(old)
    }

    pub fn array_remove(&mut self, id: NodeId, index: usize) -> Result<Value> {
        let len = self.array_len(id)?;
        self.ensure_mutable(id)?;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let old = self.items_mut(id)?.remove(index);
        self.exclude(&old);
        self.update(id)?;
        Ok(old)
    }

    /// Remove items `range`, returned detached and in order.
    pub fn array_drain(
        &mut self,
        id: NodeId,
        range: std::ops::Range<usize>,
    ) -> Result<Vec<Value>> {
        let len = self.array_len(id)?;
        self.ensure_mutable(id)?;
        if range.start > range.end || range.end > len {
            return Err(Error::IndexOutOfBounds {
                index: range.end,
                len,
            });
        }
        let removed: Vec<Value> = self.items_mut(id)?.drain(range).collect();
        for value in &removed {
            self.exclude(value);
        }
        if !removed.is_empty() {
            self.update(id)?;
        }
        Ok(removed)
    }

    pub fn array_clear(&mut self, id: NodeId) -> Result<Vec<Value>> {
        let len = self.array_len(id)?;
        self.array_drain(id, 0..len)
    }
}
