use crate::error::Result;
use crate::objects::{NodeId, Primitive, Reference, Value};
use crate::registry::Registry;

use super::{Facade, NameTree, NumberTree};

/// The document catalog, reached through the trailer's `/Root`.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    base: Value,
}

impl Facade for Catalog {
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

impl Catalog {
    pub fn of(registry: &Registry) -> Result<Self> {
        let root = registry
            .dict_get(registry.trailer(), "Root")?
            .cloned()
            .unwrap_or(Value::Null);
        Ok(Self::wrap(root))
    }

    pub fn node(&self, registry: &mut Registry) -> Result<NodeId> {
        registry.resolve_dictionary(&self.base, "catalog")
    }

    /// Interactive form fields, materialized on demand.
    pub fn fields(&self, registry: &mut Registry) -> Result<FieldList> {
        let catalog = self.node(registry)?;
        let form = registry.get_or_insert_virtual(catalog, "AcroForm", &Primitive::dict::<&str>([]))?;
        let form = registry.resolve_dictionary(&form, "catalog /AcroForm")?;
        let fields = registry.get_or_insert_virtual(form, "Fields", &Primitive::array([]))?;
        Ok(FieldList::wrap(fields))
    }

    /// Name tree `/Names /<category>` (`Dests`, `EmbeddedFiles`, …).
    ///
    /// Missing levels are virtual until the tree is first modified.
    pub fn name_tree(&self, registry: &mut Registry, category: &str) -> Result<NameTree> {
        let catalog = self.node(registry)?;
        let names = registry.get_or_insert_virtual(catalog, "Names", &Primitive::dict::<&str>([]))?;
        let names = registry.resolve_dictionary(&names, "catalog /Names")?;
        let root = registry.get_or_insert_virtual(
            names,
            category,
            &Primitive::dict([("Names", Primitive::array([]))]),
        )?;
        Ok(NameTree::wrap(root))
    }

    /// Number tree `/PageLabels`, virtual until first modified.
    pub fn page_labels(&self, registry: &mut Registry) -> Result<NumberTree> {
        let catalog = self.node(registry)?;
        let root = registry.get_or_insert_virtual(
            catalog,
            "PageLabels",
            &Primitive::dict([("Nums", Primitive::array([]))]),
        )?;
        Ok(NumberTree::wrap(root))
    }
}

/// `/AcroForm /Fields`: references to the document's root fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList {
    base: Value,
}

impl Facade for FieldList {
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

impl FieldList {
    pub fn of(registry: &mut Registry) -> Result<Self> {
        Catalog::of(registry)?.fields(registry)
    }

    fn node(&self, registry: &mut Registry) -> Result<NodeId> {
        registry.resolve_array(&self.base, "/AcroForm /Fields")
    }

    pub fn len(&self, registry: &mut Registry) -> Result<usize> {
        let node = self.node(registry)?;
        registry.array_len(node)
    }

    pub fn is_empty(&self, registry: &mut Registry) -> Result<bool> {
        Ok(self.len(registry)? == 0)
    }

    pub fn fields(&self, registry: &mut Registry) -> Result<Vec<Reference>> {
        let node = self.node(registry)?;
        Ok(registry
            .array_items(node)?
            .iter()
            .filter_map(Value::as_reference)
            .collect())
    }

    pub fn contains(&self, registry: &mut Registry, field: Reference) -> Result<bool> {
        let node = self.node(registry)?;
        Ok(registry.array_position(node, &Value::Reference(field))?.is_some())
    }

    /// Append `field` unless already listed; returns whether it was added.
    pub fn add(&self, registry: &mut Registry, field: Reference) -> Result<bool> {
        if self.contains(registry, field)? {
            return Ok(false);
        }
        let node = self.node(registry)?;
        registry.array_push(node, Value::Reference(field))?;
        Ok(true)
    }
}
