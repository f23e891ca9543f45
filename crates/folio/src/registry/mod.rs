//! Indirect-object registry.
//!
//! # Overview
//!
//! A [`Registry`] is the in-memory representation of one open document. It
//! owns every node: an arena of composite slots addressed by [`NodeId`] and a
//! table of [`IndirectObject`]s keyed by object number. Every link between
//! nodes is a non-owning handle resolved through the registry at use time,
//! so the logical graph may be cyclic while ownership stays a tree.
//!
//! Objects backed by a file are materialized lazily through the
//! [`ObjectSource`] the registry was opened with. Mutations go through the
//! composite operations in [`composite`], which route every attach through
//! [`Registry::include`] (copy-on-attach) and every change through
//! [`Registry::update`] (dirty propagation).

pub mod composite;
mod convert;
mod node;
mod object;
mod source;
mod stream;

pub use node::{Entries, NodeSlot, Owner, StreamBody};
pub use object::{IndirectObject, Location, Usage, XrefEntry};
pub use source::{ObjectSource, ObjectStreamInfo, StreamFilter};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::clone::Cloner;
use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::objects::{Kind, Name, NodeId, Primitive, Reference, Value, UNREUSABLE_GENERATION};
use node::NodeBody;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

pub struct Registry {
    id: u64,
    config: RegistryConfig,
    nodes: Vec<Option<NodeSlot>>,
    free_nodes: Vec<u32>,
    objects: BTreeMap<u32, IndirectObject>,
    next_number: u32,
    trailer: NodeId,
    source: Option<Box<dyn ObjectSource>>,
    filters: HashMap<String, Box<dyn StreamFilter>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("objects", &self.objects.len())
            .field("nodes", &(self.nodes.len() - self.free_nodes.len()))
            .field("lazy", &self.source.is_some())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty document: a trailer whose `/Root` is a fresh catalog.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let mut registry = Self::empty(config);
        let catalog = registry.import(&Primitive::dict([("Type", Primitive::name("Catalog"))]));
        let root = registry.register_value(catalog, true);
        if let Ok(entries) = registry.entries_mut(registry.trailer) {
            entries.insert(Name::from("Root"), Value::Reference(root));
        }
        registry
    }

    /// Open a document backed by an object source.
    ///
    /// `entries` is the cross-reference table; `trailer` must be a
    /// dictionary. No object is loaded until it is first resolved.
    pub fn open(
        source: Box<dyn ObjectSource>,
        trailer: &Primitive,
        entries: impl IntoIterator<Item = XrefEntry>,
        config: RegistryConfig,
    ) -> Result<Self> {
        let Primitive::Dictionary(trailer_entries) = trailer else {
            return Err(Error::type_mismatch(Kind::Dictionary, trailer.kind(), "trailer"));
        };
        let mut registry = Self::empty(config);
        for (key, value) in trailer_entries {
            let value = registry.import_child(value, Owner::Node(registry.trailer));
            registry.entries_mut(registry.trailer)?.insert(key.clone(), value);
        }
        for entry in entries {
            let number = entry.reference.number;
            registry.next_number = registry.next_number.max(number + 1);
            registry.objects.insert(
                number,
                IndirectObject::new(entry.reference, entry.usage, entry.location),
            );
        }
        registry.source = Some(source);
        debug!(
            registry = registry.id,
            objects = registry.objects.len(),
            "opened lazy registry"
        );
        Ok(registry)
    }

    fn empty(config: RegistryConfig) -> Self {
        let mut registry = Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            config,
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            objects: BTreeMap::new(),
            next_number: 1,
            trailer: NodeId(0),
            source: None,
            filters: HashMap::new(),
        };
        registry.trailer = registry.alloc(NodeBody::Dictionary(Entries::new()));
        registry
    }

    /// Process-unique identity of this registry.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Trailer dictionary; owned by the registry itself.
    pub fn trailer(&self) -> NodeId {
        self.trailer
    }

    /// Catalog dictionary named by the trailer's `/Root`.
    pub fn catalog(&mut self) -> Result<NodeId> {
        let root = self
            .dict_get(self.trailer, "Root")?
            .cloned()
            .ok_or_else(|| Error::corrupt("trailer has no /Root entry"))?;
        self.resolve_dictionary(&root, "catalog")
    }

    pub fn register_filter(&mut self, name: impl Into<String>, filter: Box<dyn StreamFilter>) {
        self.filters.insert(name.into(), filter);
    }

    pub(crate) fn filter(&self, name: &str) -> Result<&dyn StreamFilter> {
        self.filters
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::filter(name, "no codec registered"))
    }

    // ── Arena ─────────────────────────────────────────────────────────────

    pub(crate) fn alloc(&mut self, body: NodeBody) -> NodeId {
        let slot = NodeSlot::new(body);
        match self.free_nodes.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(slot);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(slot));
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    /// Live arena slot behind `id`.
    pub fn node(&self, id: NodeId) -> Result<&NodeSlot> {
        self.nodes
            .get(id.index())
            .and_then(|slot| slot.as_ref())
            .ok_or(Error::InvalidNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot> {
        self.nodes
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
            .ok_or(Error::InvalidNode(id))
    }

    /// Number of live arena nodes, the trailer included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// Free a detached composite and every composite it owns.
    ///
    /// Attached nodes are left alone: only values that fell out of their
    /// owner (returned by `dict_set`, `array_remove`, …) can be released.
    pub fn release(&mut self, value: &Value) -> Result<()> {
        let Some(id) = value.node() else {
            return Ok(());
        };
        if self.node(id)?.parent.is_some() || id == self.trailer {
            return Ok(());
        }
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(slot) = self.nodes.get_mut(id.index()).and_then(|s| s.take()) else {
                continue;
            };
            self.free_nodes.push(id.0);
            for child in slot.children() {
                if let Some(child_id) = child.node() {
                    let owned = self
                        .node(child_id)
                        .map(|c| c.parent == Some(Owner::Node(id)))
                        .unwrap_or(false);
                    if owned {
                        pending.push(child_id);
                    }
                }
            }
        }
        Ok(())
    }

    // ── Objects ───────────────────────────────────────────────────────────

    fn allocate(&mut self) -> Reference {
        let reference = Reference::new(self.next_number, 0);
        self.next_number += 1;
        reference
    }

    fn register_value(&mut self, value: Value, updated: bool) -> Reference {
        let reference = self.allocate();
        let mut object = IndirectObject::new(reference, Usage::InUse, Location::None);
        object.updated = updated;
        self.objects.insert(reference.number, object);
        if let Some(id) = value.node() {
            if let Ok(slot) = self.node_mut(id) {
                slot.parent = Some(Owner::Object(reference.number));
            }
        }
        if let Some(object) = self.objects.get_mut(&reference.number) {
            object.data = Some(value);
        }
        reference
    }

    /// Turn `value` into a new indirect object and return its reference.
    pub fn register(&mut self, value: Value) -> Result<Reference> {
        let reference = self.allocate();
        self.objects.insert(
            reference.number,
            IndirectObject::new(reference, Usage::InUse, Location::None),
        );
        let value = self.include(value, Owner::Object(reference.number))?;
        if let Some(object) = self.objects.get_mut(&reference.number) {
            object.data = Some(value);
            object.updated = true;
        }
        trace!(registry = self.id, %reference, "registered object");
        Ok(reference)
    }

    /// Create a virtual indirect object: addressable, but neither counted nor
    /// serialized until its first real mutation.
    pub fn add_virtual(&mut self, value: Value) -> Result<Reference> {
        let reference = self.allocate();
        let mut object = IndirectObject::new(reference, Usage::InUse, Location::None);
        object.virtual_ = true;
        self.objects.insert(reference.number, object);
        let value = self.include(value, Owner::Object(reference.number))?;
        if let Some(id) = value.node() {
            self.node_mut(id)?.virtual_ = true;
        }
        if let Some(object) = self.objects.get_mut(&reference.number) {
            object.data = Some(value);
        }
        Ok(reference)
    }

    /// Allocate a fresh slot for an object coming from another registry.
    ///
    /// The slot is in use with no data yet; the cloner fills it once the
    /// external data has been copied.
    pub fn adopt(&mut self, external: Reference) -> Reference {
        let reference = self.allocate();
        let mut object = IndirectObject::new(reference, Usage::InUse, Location::None);
        object.updated = true;
        self.objects.insert(reference.number, object);
        trace!(registry = self.id, %external, %reference, "adopted external object");
        reference
    }

    /// Free an object slot, returning its (detached) data.
    ///
    /// The generation is bumped so outstanding references dangle.
    pub fn delete(&mut self, number: u32) -> Result<Option<Value>> {
        let object = self
            .objects
            .get_mut(&number)
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))?;
        if object.is_unreusable() {
            return Err(Error::UnreusableSlot(number));
        }
        let data = object.data.take();
        object.usage = Usage::Free;
        object.location = Location::None;
        object.updated = true;
        object.virtual_ = false;
        object.reference.generation = object.reference.generation.saturating_add(1);
        if let Some(value) = &data {
            self.exclude(value);
            self.release(value)?;
        }
        debug!(registry = self.id, number, "deleted object");
        Ok(data)
    }

    pub fn object(&self, number: u32) -> Option<&IndirectObject> {
        self.objects.get(&number)
    }

    /// Number of registered objects: in use and not virtual.
    pub fn len(&self) -> usize {
        self.objects
            .values()
            .filter(|o| o.is_in_use() && !o.virtual_)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// References of every registered object, in number order.
    pub fn references(&self) -> Vec<Reference> {
        self.objects
            .values()
            .filter(|o| o.is_in_use() && !o.virtual_)
            .map(|o| o.reference)
            .collect()
    }

    /// Every entry of the object table, free slots included, in number order.
    pub fn objects(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.values()
    }

    /// Whether `reference` addresses an in-use, non-virtual object.
    pub fn is_registered(&self, reference: Reference) -> bool {
        self.objects
            .get(&reference.number)
            .map(|o| o.reference == reference && o.is_in_use() && !o.virtual_)
            .unwrap_or(false)
    }

    fn live_object(&self, reference: Reference) -> Result<&IndirectObject> {
        self.objects
            .get(&reference.number)
            .filter(|o| o.is_in_use() && o.reference.generation == reference.generation)
            .ok_or(Error::DanglingReference(reference))
    }

    /// Data of an object, materializing it on first access.
    pub fn object_data(&mut self, reference: Reference) -> Result<Value> {
        self.ensure_loaded(reference)?;
        Ok(self
            .live_object(reference)?
            .data
            .clone()
            .unwrap_or(Value::Null))
    }

    /// Replace an object's data; the old data is returned detached.
    pub fn set_object_data(&mut self, number: u32, value: Value) -> Result<Option<Value>> {
        let object = self
            .objects
            .get(&number)
            .filter(|o| o.is_in_use())
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))?;
        if object.is_unreusable() {
            return Err(Error::UnreusableSlot(number));
        }
        let reference = object.reference;
        self.ensure_loaded(reference)?;
        let value = self.include(value, Owner::Object(number))?;
        let old = match self.objects.get_mut(&number) {
            Some(object) => object.data.replace(value),
            None => None,
        };
        if let Some(old) = &old {
            self.exclude(old);
        }
        self.update_object(number)?;
        Ok(old)
    }

    /// Move an object into an object stream. Identity is unchanged.
    pub fn compress(&mut self, number: u32, container: u32, index: u32) -> Result<()> {
        let reference = self.reference_of(number)?;
        if reference.generation == UNREUSABLE_GENERATION {
            return Err(Error::UnreusableSlot(number));
        }
        self.ensure_loaded(reference)?;
        if let Some(object) = self.objects.get_mut(&number) {
            object.usage = Usage::InUseCompressed;
            object.location = Location::Compressed { container, index };
        }
        self.update_object(number)
    }

    /// Move an object out of its object stream. Identity is unchanged.
    pub fn uncompress(&mut self, number: u32) -> Result<()> {
        let reference = self.reference_of(number)?;
        if reference.generation == UNREUSABLE_GENERATION {
            return Err(Error::UnreusableSlot(number));
        }
        self.ensure_loaded(reference)?;
        if let Some(object) = self.objects.get_mut(&number) {
            if object.usage == Usage::InUseCompressed {
                object.usage = Usage::InUse;
                object.location = Location::None;
            }
        }
        self.update_object(number)
    }

    fn reference_of(&self, number: u32) -> Result<Reference> {
        self.objects
            .get(&number)
            .filter(|o| o.is_in_use())
            .map(|o| o.reference)
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))
    }

    /// Materialize every in-use object.
    pub fn load_all(&mut self) -> Result<()> {
        let references: Vec<Reference> = self
            .objects
            .values()
            .filter(|o| o.is_in_use())
            .map(|o| o.reference)
            .collect();
        for reference in references {
            self.ensure_loaded(reference)?;
        }
        Ok(())
    }

    // ── Lazy loading ──────────────────────────────────────────────────────

    pub(crate) fn ensure_loaded(&mut self, reference: Reference) -> Result<()> {
        let object = self.live_object(reference)?;
        if object.data.is_some() {
            return Ok(());
        }
        let primitive = match object.location {
            Location::None => return Ok(()),
            Location::Offset(offset) => {
                let source = self
                    .source
                    .as_mut()
                    .ok_or(Error::DanglingReference(reference))?;
                source.load(reference, offset).map_err(|source| Error::Source {
                    number: reference.number,
                    source,
                })?
            }
            Location::Compressed { container, index } => {
                self.load_compressed(reference.number, container, index)?
            }
        };
        let value = self.import_child(&primitive, Owner::Object(reference.number));
        if let Some(object) = self.objects.get_mut(&reference.number) {
            object.data = Some(value);
        }
        debug!(registry = self.id, %reference, "materialized object");
        Ok(())
    }

    fn load_compressed(&mut self, number: u32, container: u32, index: u32) -> Result<Primitive> {
        let container_ref = self
            .objects
            .get(&container)
            .filter(|o| o.is_in_use())
            .map(|o| o.reference)
            .ok_or(Error::DanglingReference(Reference::new(container, 0)))?;
        let Value::Stream(stream) = self.object_data(container_ref)? else {
            return Err(Error::CorruptContainer { number, container });
        };
        let is_object_stream = self
            .dict_get(stream, "Type")?
            .map(|t| t.is_name("ObjStm"))
            .unwrap_or(false);
        if !is_object_stream {
            return Err(Error::CorruptContainer { number, container });
        }
        let header_integer = |registry: &Self, key: &str| -> Result<i64> {
            registry
                .dict_get(stream, key)?
                .and_then(|v| v.as_integer())
                .ok_or_else(|| Error::corrupt(format!("object stream {container} has no /{key}")))
        };
        let info = ObjectStreamInfo {
            container: container_ref,
            count: header_integer(self, "N")?,
            first: header_integer(self, "First")?,
        };
        let body = self.decoded_bytes(stream)?;
        let source = self
            .source
            .as_mut()
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))?;
        source
            .load_inline(&info, &body, index)
            .map_err(|source| Error::Source { number, source })
    }

    // ── Resolution ────────────────────────────────────────────────────────

    /// Follow a reference to its data; direct values are returned unchanged.
    pub fn resolve(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Reference(reference) => self.object_data(*reference),
            other => Ok(other.clone()),
        }
    }

    /// Reference of the indirect object owning `value`, or `value` itself.
    pub fn unresolve(&self, value: &Value) -> Value {
        if let Some(id) = value.node() {
            if let Ok(NodeSlot {
                parent: Some(Owner::Object(number)),
                ..
            }) = self.node(id)
            {
                if let Some(object) = self.objects.get(number) {
                    return Value::Reference(object.reference);
                }
            }
        }
        value.clone()
    }

    /// Indirect object containing `id`, found through the parent chain.
    pub fn containing_object(&self, id: NodeId) -> Option<Reference> {
        let mut current = id;
        loop {
            match self.node(current).ok()?.parent? {
                Owner::Node(parent) => current = parent,
                Owner::Object(number) => return self.objects.get(&number).map(|o| o.reference),
            }
        }
    }

    /// Reject a change to `id` when its containing object has reached the
    /// last generation of its slot. Checked before any data is touched.
    pub(crate) fn ensure_mutable(&self, id: NodeId) -> Result<()> {
        match self.containing_object(id) {
            Some(reference) if reference.generation == UNREUSABLE_GENERATION => {
                Err(Error::UnreusableSlot(reference.number))
            }
            _ => Ok(()),
        }
    }

    fn resolve_kind(&mut self, value: &Value, expected: Kind, context: &str) -> Result<NodeId> {
        let data = self.resolve(value)?;
        match (expected, &data) {
            (Kind::Array, Value::Array(id))
            | (Kind::Dictionary, Value::Dictionary(id))
            | (Kind::Stream, Value::Stream(id)) => Ok(*id),
            _ => Err(Error::type_mismatch(expected, data.kind(), context)),
        }
    }

    pub fn resolve_array(&mut self, value: &Value, context: &str) -> Result<NodeId> {
        self.resolve_kind(value, Kind::Array, context)
    }

    pub fn resolve_dictionary(&mut self, value: &Value, context: &str) -> Result<NodeId> {
        self.resolve_kind(value, Kind::Dictionary, context)
    }

    pub fn resolve_stream(&mut self, value: &Value, context: &str) -> Result<NodeId> {
        self.resolve_kind(value, Kind::Stream, context)
    }

    /// Dictionary or stream header.
    pub fn resolve_entries_node(&mut self, value: &Value, context: &str) -> Result<NodeId> {
        match self.resolve(value)? {
            Value::Dictionary(id) | Value::Stream(id) => Ok(id),
            other => Err(Error::type_mismatch(Kind::Dictionary, other.kind(), context)),
        }
    }

    // ── Ownership ─────────────────────────────────────────────────────────

    /// Attach `value` under `owner`: the single choke-point for ownership.
    ///
    /// A composite that already has an owner (or that would become its own
    /// ancestor) is deep-cloned first, so the original owner keeps its copy
    /// and no node ever has two owners. Returns the value actually attached.
    pub fn include(&mut self, value: Value, owner: Owner) -> Result<Value> {
        let Some(id) = value.node() else {
            return Ok(value);
        };
        let owned = self.node(id)?.parent.is_some() || id == self.trailer;
        let value = if owned || self.is_ancestor(id, owner)? {
            trace!(registry = self.id, node = id.0, "copy-on-attach");
            Cloner::bare().clone_local(self, &value)?
        } else {
            value
        };
        if let Some(id) = value.node() {
            self.node_mut(id)?.parent = Some(owner);
        }
        Ok(value)
    }

    /// Detach a composite from its owner.
    pub fn exclude(&mut self, value: &Value) {
        if let Some(id) = value.node() {
            if let Ok(slot) = self.node_mut(id) {
                slot.parent = None;
            }
        }
    }

    fn is_ancestor(&self, candidate: NodeId, owner: Owner) -> Result<bool> {
        let mut current = owner;
        loop {
            match current {
                Owner::Object(_) => return Ok(false),
                Owner::Node(id) if id == candidate => return Ok(true),
                Owner::Node(id) => match self.node(id)?.parent {
                    Some(parent) => current = parent,
                    None => return Ok(false),
                },
            }
        }
    }

    // ── Dirty propagation ─────────────────────────────────────────────────

    /// Mark `id` dirty and propagate to its owners.
    ///
    /// Stops at the first node that is not updateable, or already dirty and
    /// concrete. The virtual flag is cleared on every node marked.
    pub fn update(&mut self, id: NodeId) -> Result<()> {
        let mut current = Owner::Node(id);
        loop {
            match current {
                Owner::Node(id) => {
                    let slot = self.node_mut(id)?;
                    if !slot.updateable || (slot.updated && !slot.virtual_) {
                        return Ok(());
                    }
                    slot.updated = true;
                    slot.virtual_ = false;
                    match slot.parent {
                        Some(parent) => current = parent,
                        None => return Ok(()),
                    }
                }
                Owner::Object(number) => return self.update_object(number),
            }
        }
    }

    /// Mark an indirect object dirty; a virtual object becomes registered.
    pub fn update_object(&mut self, number: u32) -> Result<()> {
        let registry = self.id;
        let object = self
            .objects
            .get_mut(&number)
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))?;
        if object.reference.generation == UNREUSABLE_GENERATION {
            return Err(Error::UnreusableSlot(number));
        }
        if !object.updateable || (object.updated && !object.virtual_) {
            return Ok(());
        }
        object.updated = true;
        if object.virtual_ {
            object.virtual_ = false;
            debug!(registry, number, "virtual object registered");
        }
        Ok(())
    }

    pub fn set_updateable(&mut self, id: NodeId, updateable: bool) -> Result<()> {
        self.node_mut(id)?.updateable = updateable;
        Ok(())
    }

    pub fn set_object_updateable(&mut self, number: u32, updateable: bool) -> Result<()> {
        let object = self
            .objects
            .get_mut(&number)
            .ok_or(Error::DanglingReference(Reference::new(number, 0)))?;
        object.updateable = updateable;
        Ok(())
    }

    pub fn is_updated(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.updated)
    }

    pub fn is_virtual(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.virtual_)
    }

    /// Whether `value` denotes concrete (non-virtual, existing) data.
    pub fn exists(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Reference(reference) => self.is_registered(*reference),
            Value::Array(id) | Value::Dictionary(id) | Value::Stream(id) => {
                self.node(*id).map(|slot| !slot.virtual_).unwrap_or(false)
            }
            _ => true,
        }
    }

    /// Clear every dirty flag, as after a save.
    pub fn mark_clean(&mut self) {
        for slot in self.nodes.iter_mut().flatten() {
            slot.updated = false;
            if let NodeBody::Stream { body, .. } = &mut slot.body {
                body.dirty = false;
            }
        }
        for object in self.objects.values_mut() {
            object.updated = false;
        }
    }

    // ── Virtual placeholders ──────────────────────────────────────────────

    /// Entry `key` of `dict`, materializing `default` as a virtual
    /// placeholder when absent.
    ///
    /// The placeholder is attached without `update()`: reading an optional
    /// entry never dirties the document or changes its serialization.
    /// Scalar defaults are returned without being stored.
    pub fn get_or_insert_virtual(
        &mut self,
        dict: NodeId,
        key: &str,
        default: &Primitive,
    ) -> Result<Value> {
        if let Some(existing) = self.dict_get(dict, key)? {
            return Ok(existing.clone());
        }
        let value = self.import(default);
        let Some(id) = value.node() else {
            return Ok(value);
        };
        let slot = self.node_mut(id)?;
        slot.virtual_ = true;
        slot.parent = Some(Owner::Node(dict));
        self.entries_mut(dict)?.insert(Name::from(key), value.clone());
        Ok(value)
    }
}
