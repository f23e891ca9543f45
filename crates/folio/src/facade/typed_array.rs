use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::objects::{NodeId, Value};
use crate::registry::Registry;

use super::Facade;

/// Array whose items are all wrapped as `T`.
///
/// Items are wrapped as stored: a reference item yields a facade over the
/// reference, not over its data.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray<T> {
    base: Value,
    _items: PhantomData<T>,
}

impl<T: Facade> Facade for TypedArray<T> {
    fn wrap(base: Value) -> Self {
        Self {
            base,
            _items: PhantomData,
        }
    }

    fn base(&self) -> &Value {
        &self.base
    }

    fn into_base(self) -> Value {
        self.base
    }
}

impl<T: Facade> TypedArray<T> {
    /// New, empty direct array.
    pub fn create(registry: &mut Registry) -> Self {
        Self::wrap(registry.create_array())
    }

    fn node(&self, registry: &mut Registry) -> Result<NodeId> {
        registry.resolve_array(&self.base, "typed array")
    }

    pub fn len(&self, registry: &mut Registry) -> Result<usize> {
        let node = self.node(registry)?;
        registry.array_len(node)
    }

    pub fn is_empty(&self, registry: &mut Registry) -> Result<bool> {
        Ok(self.len(registry)? == 0)
    }

    pub fn get(&self, registry: &mut Registry, index: usize) -> Result<T> {
        let node = self.node(registry)?;
        Ok(T::wrap(registry.array_get(node, index)?.clone()))
    }

    pub fn push(&self, registry: &mut Registry, item: T) -> Result<()> {
        let node = self.node(registry)?;
        registry.array_push(node, item.into_base())
    }

    pub fn insert(&self, registry: &mut Registry, index: usize, item: T) -> Result<()> {
        let node = self.node(registry)?;
        registry.array_insert(node, index, item.into_base())
    }

    pub fn remove(&self, registry: &mut Registry, index: usize) -> Result<T> {
        let node = self.node(registry)?;
        registry.array_remove(node, index).map(T::wrap)
    }

    pub fn items(&self, registry: &mut Registry) -> Result<Vec<T>> {
        let node = self.node(registry)?;
        Ok(registry.array_items(node)?.into_iter().map(T::wrap).collect())
    }

    pub fn position(&self, registry: &mut Registry, item: &T) -> Result<Option<usize>> {
        let node = self.node(registry)?;
        registry.array_position(node, item.base())
    }

    pub fn sub_list(&self, _registry: &mut Registry, _range: std::ops::Range<usize>) -> Result<Vec<T>> {
        Err(Error::Unsupported("TypedArray::sub_list"))
    }

    pub fn sort(&self, _registry: &mut Registry) -> Result<()> {
        Err(Error::Unsupported("TypedArray::sort"))
    }
}
