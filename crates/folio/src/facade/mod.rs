//! Typed wrappers over raw nodes.
//!
//! A facade holds one [`Value`] (usually a reference or a composite handle)
//! and borrows the registry per call; it never owns data. Facades are what
//! higher-level document code builds on.

mod catalog;
mod page;
mod typed_array;

pub use catalog::{Catalog, FieldList};
pub use page::Page;
pub use typed_array::TypedArray;

use crate::clone::Cloner;
use crate::error::Result;
use crate::objects::{PdfString, Value};
use crate::registry::Registry;
use crate::tree::Tree;

/// Sorted map from byte-string keys, stored under `/Names`.
pub type NameTree<V = Value> = Tree<PdfString, V>;

/// Sorted map from integer keys, stored under `/Nums`.
pub type NumberTree<V = Value> = Tree<i64, V>;

pub trait Facade: Sized {
    fn wrap(base: Value) -> Self;

    fn base(&self) -> &Value;

    fn into_base(self) -> Value;

    /// False when the base is absent, null or a virtual placeholder.
    fn exists(&self, registry: &Registry) -> bool {
        registry.exists(self.base())
    }

    /// Deep copy of the underlying graph into `target`.
    fn clone_to(&self, cloner: &Cloner, source: &mut Registry, target: &mut Registry) -> Result<Self> {
        cloner.clone(source, self.base(), target).map(Self::wrap)
    }
}

impl Facade for Value {
    fn wrap(base: Value) -> Self {
        base
    }

    fn base(&self) -> &Value {
        self
    }

    fn into_base(self) -> Value {
        self
    }
}
