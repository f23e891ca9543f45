use crate::error::Result;
use crate::facade::Page;
use crate::objects::{NodeId, Value};

use super::{CloneContext, CloneFilter, Slot};

/// Detaches cloned pages from their page tree.
///
/// The `/Parent` link is dropped, and every inheritable attribute the page
/// only had through its ancestors is copied into the clone, so the clone is
/// self-contained.
#[derive(Debug, Clone)]
pub struct PageFilter {
    keys: Vec<String>,
}

impl PageFilter {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl CloneFilter for PageFilter {
    fn name(&self) -> &str {
        "page"
    }

    fn matches(&self, cx: &mut CloneContext<'_>, value: &Value) -> Result<bool> {
        match value {
            Value::Dictionary(id) => Page::is_page(cx.source(), *id),
            _ => Ok(false),
        }
    }

    fn before_clone_entry(
        &self,
        _cx: &mut CloneContext<'_>,
        _source: NodeId,
        slot: Slot<'_>,
        _value: &Value,
    ) -> Result<bool> {
        Ok(!slot.is_key("Parent"))
    }

    fn after_clone(&self, cx: &mut CloneContext<'_>, clone: NodeId, source: NodeId) -> Result<()> {
        for key in &self.keys {
            if cx.target().dict_contains(clone, key)? {
                continue;
            }
            let Some(inherited) = Page::ancestor_attribute(cx.source(), source, key)? else {
                continue;
            };
            let cloned = cx.clone_value(&inherited)?;
            cx.target().dict_set(clone, key.as_str(), cloned)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clone::Cloner;
    use crate::objects::Primitive;
    use crate::registry::Registry;

    #[test]
    fn test_page_clone_drops_parent_and_inherits() {
        let mut source = Registry::new();
        let pages = source.import(&Primitive::dict([
            ("Type", Primitive::name("Pages")),
            ("Rotate", Primitive::Integer(180)),
        ]));
        let pages_ref = source.register(pages).unwrap();
        let page = source.import(&Primitive::dict([
            ("Type", Primitive::name("Page")),
            ("Parent", Primitive::Reference(pages_ref)),
        ]));

        let mut target = Registry::new();
        let cloner = Cloner::bare().with_filter(PageFilter::new(vec!["Rotate".into()]));
        let clone = cloner.clone(&mut source, &page, &mut target).unwrap();
        let node = clone.node().unwrap();
        assert!(!target.dict_contains(node, "Parent").unwrap());
        assert_eq!(target.dict_get(node, "Rotate").unwrap(), Some(&Value::Integer(180)));
        // only the catalog: the page tree root was never cloned
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn test_non_page_dictionary_keeps_parent() {
        let mut registry = Registry::new();
        let dict = registry.import(&Primitive::dict([("Parent", Primitive::Integer(1))]));
        let clone = Cloner::new().clone_local(&mut registry, &dict).unwrap();
        assert!(registry.dict_contains(clone.node().unwrap(), "Parent").unwrap());
    }
}
