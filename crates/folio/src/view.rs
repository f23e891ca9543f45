//! JSON view of a value, for debugging and test assertions.
//!
//! References are rendered as `"n g R"` strings and never followed, so the
//! view of any value is finite. Names keep their leading `/`, and a stream
//! becomes `{"header": …, "length": n}`.

use serde_json::{json, Map, Value as Json};

use crate::error::Result;
use crate::objects::{NodeId, Value};
use crate::registry::Registry;

impl Registry {
    pub fn view(&mut self, value: &Value) -> Result<Json> {
        Ok(match value {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => json!(i),
            Value::Real(r) => json!(r),
            Value::Name(name) => Json::String(name.to_string()),
            Value::String(s) => Json::String(s.to_text()),
            Value::Date(date) => Json::String(folio_util::format_date(date)),
            Value::Reference(reference) => Json::String(reference.to_string()),
            Value::Array(id) => {
                let items = self.array_items(*id)?;
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    out.push(self.view(item)?);
                }
                Json::Array(out)
            }
            Value::Dictionary(id) => Json::Object(self.view_entries(*id)?),
            Value::Stream(id) => {
                let header = self.view_entries(*id)?;
                let length = self.stream_body(*id)?.len();
                json!({ "header": header, "length": length })
            }
        })
    }

    fn view_entries(&mut self, id: NodeId) -> Result<Map<String, Json>> {
        let mut out = Map::new();
        for (key, value) in self.dict_entries(id)? {
            let view = self.view(&value)?;
            out.insert(key.as_str().to_string(), view);
        }
        Ok(out)
    }
}
