use std::path::PathBuf;

use super::node::{NodeBody, StreamBody};
use super::{Entries, Owner, Registry};
use crate::error::Result;
use crate::objects::{NodeId, Primitive, PrimitiveDict, Value};

impl Registry {
    /// Materialize an owned tree as detached arena nodes.
    ///
    /// References stay symbolic; they are not checked against the table.
    pub fn import(&mut self, primitive: &Primitive) -> Value {
        match primitive {
            Primitive::Null => Value::Null,
            Primitive::Boolean(b) => Value::Boolean(*b),
            Primitive::Integer(i) => Value::Integer(*i),
            Primitive::Real(r) => Value::Real(*r),
            Primitive::Name(n) => Value::Name(n.clone()),
            Primitive::String(s) => Value::String(s.clone()),
            Primitive::Date(d) => Value::Date(*d),
            Primitive::Reference(r) => Value::Reference(*r),
            Primitive::Array(items) => {
                let items: Vec<Value> = items.iter().map(|item| self.import(item)).collect();
                let id = self.alloc(NodeBody::Array(items.clone()));
                self.claim(id, &items);
                Value::Array(id)
            }
            Primitive::Dictionary(dict) => {
                let entries = self.import_entries(dict);
                let children: Vec<Value> = entries.values().cloned().collect();
                let id = self.alloc(NodeBody::Dictionary(entries));
                self.claim(id, &children);
                Value::Dictionary(id)
            }
            Primitive::Stream { header, body } => {
                let decoded = !header.contains_key("Filter");
                let body = match self.external_path(header) {
                    Some(path) => StreamBody::external(path, decoded),
                    None => StreamBody::in_memory(body.clone(), decoded),
                };
                let header = self.import_entries(header);
                let children: Vec<Value> = header.values().cloned().collect();
                let id = self.alloc(NodeBody::Stream { header, body });
                self.claim(id, &children);
                Value::Stream(id)
            }
        }
    }

    pub(crate) fn import_child(&mut self, primitive: &Primitive, owner: Owner) -> Value {
        let value = self.import(primitive);
        if let Some(id) = value.node() {
            if let Ok(slot) = self.node_mut(id) {
                slot.parent = Some(owner);
            }
        }
        value
    }

    fn import_entries(&mut self, dict: &PrimitiveDict) -> Entries {
        dict.iter()
            .map(|(key, value)| (key.clone(), self.import(value)))
            .collect()
    }

    fn claim(&mut self, owner: NodeId, children: &[Value]) {
        for child in children {
            if let Some(id) = child.node() {
                if let Ok(slot) = self.node_mut(id) {
                    slot.parent = Some(Owner::Node(owner));
                }
            }
        }
    }

    /// File named by a stream header's `/F`, when external bodies are enabled.
    fn external_path(&self, header: &PrimitiveDict) -> Option<PathBuf> {
        if !self.config.external_streams {
            return None;
        }
        let spec = match header.get("F")? {
            Primitive::String(s) => s.to_text(),
            Primitive::Dictionary(file_spec) => match file_spec.get("UF").or(file_spec.get("F"))? {
                Primitive::String(s) => s.to_text(),
                _ => return None,
            },
            _ => return None,
        };
        let path = PathBuf::from(spec);
        Some(match &self.config.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        })
    }

    /// Copy a value out as an owned tree. References stay symbolic.
    ///
    /// Virtual placeholders held by a composite are left out, as in
    /// serialization. External stream bodies are loaded in the process.
    pub fn export(&mut self, value: &Value) -> Result<Primitive> {
        Ok(match value {
            Value::Null => Primitive::Null,
            Value::Boolean(b) => Primitive::Boolean(*b),
            Value::Integer(i) => Primitive::Integer(*i),
            Value::Real(r) => Primitive::Real(*r),
            Value::Name(n) => Primitive::Name(n.clone()),
            Value::String(s) => Primitive::String(s.clone()),
            Value::Date(d) => Primitive::Date(*d),
            Value::Reference(r) => Primitive::Reference(*r),
            Value::Array(id) => {
                let items = self.array_items(*id)?;
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    if self.is_invisible(item) {
                        continue;
                    }
                    out.push(self.export(item)?);
                }
                Primitive::Array(out)
            }
            Value::Dictionary(id) => Primitive::Dictionary(self.export_entries(*id)?),
            Value::Stream(id) => {
                let header = self.export_entries(*id)?;
                let body = self.stream_body(*id)?;
                Primitive::Stream { header, body }
            }
        })
    }

    fn export_entries(&mut self, id: NodeId) -> Result<PrimitiveDict> {
        let entries = self.dict_entries(id)?;
        let mut out = PrimitiveDict::with_capacity(entries.len());
        for (key, value) in entries {
            if self.is_invisible(&value) {
                continue;
            }
            let exported = self.export(&value)?;
            out.insert(key, exported);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RegistryConfig;
    use crate::objects::{PdfString, Primitive};
    use crate::registry::{Owner, Registry};

    #[test]
    fn test_import_sets_parents() {
        let mut registry = Registry::new();
        let value = registry.import(&Primitive::dict([(
            "Kids",
            Primitive::array([Primitive::Integer(1)]),
        )]));
        let dict = value.node().unwrap();
        let kids = registry.dict_get(dict, "Kids").unwrap().cloned().unwrap();
        assert_eq!(
            registry.node(kids.node().unwrap()).unwrap().parent(),
            Some(Owner::Node(dict))
        );
        assert!(registry.node(dict).unwrap().parent().is_none());
    }

    #[test]
    fn test_export_round_trips_structure() {
        let mut registry = Registry::new();
        let primitive = Primitive::dict([
            ("Type", Primitive::name("Page")),
            ("MediaBox", Primitive::rect(0.0, 0.0, 612.0, 792.0)),
            ("Parent", Primitive::reference(3, 0)),
            (
                "Contents",
                Primitive::stream([("Length", Primitive::Integer(3))], b"abc".to_vec()),
            ),
        ]);
        let value = registry.import(&primitive);
        assert_eq!(registry.export(&value).unwrap(), primitive);
    }

    #[test]
    fn test_export_skips_virtual_placeholders() {
        let mut registry = Registry::new();
        let value = registry.import(&Primitive::dict([("Type", Primitive::name("Page"))]));
        let dict = value.node().unwrap();
        registry
            .get_or_insert_virtual(dict, "Resources", &Primitive::dict([("Font", Primitive::dict::<&str>([]))]))
            .unwrap();
        assert!(registry.dict_contains(dict, "Resources").unwrap());

        let exported = registry.export(&value).unwrap();
        assert_eq!(exported, Primitive::dict([("Type", Primitive::name("Page"))]));

        let mut other = Registry::new();
        let reimported = other.import(&exported);
        assert!(!other.dict_contains(reimported.node().unwrap(), "Resources").unwrap());
    }

    #[test]
    fn test_external_stream_path_uses_base_dir() {
        let config = RegistryConfig {
            external_streams: true,
            base_dir: Some("/data".into()),
        };
        let mut registry = Registry::with_config(config);
        let value = registry.import(&Primitive::stream(
            [("F", Primitive::String(PdfString::new("body.bin")))],
            Vec::new(),
        ));
        let slot = registry.node(value.node().unwrap()).unwrap();
        assert_eq!(
            slot.stream_body().unwrap().external_path().unwrap(),
            std::path::Path::new("/data/body.bin")
        );
    }
}
