use tracing::debug;

use crate::error::Result;
use crate::facade::FieldList;
use crate::objects::{NodeId, Value};

use super::{CloneContext, CloneFilter, Slot};

/// Registers cloned form-field widgets with the target's `/AcroForm`.
///
/// Governs annotation arrays (`/Annots`): arrays whose first item is a
/// dictionary with `/Subtype` and `/Rect`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotationFilter;

impl CloneFilter for AnnotationFilter {
    fn name(&self) -> &str {
        "annotation"
    }

    fn matches(&self, cx: &mut CloneContext<'_>, value: &Value) -> Result<bool> {
        let Value::Array(id) = value else {
            return Ok(false);
        };
        let source = cx.source();
        if source.array_len(*id)? == 0 {
            return Ok(false);
        }
        let Value::Dictionary(first) = source.resolve_item(*id, 0)? else {
            return Ok(false);
        };
        Ok(source.dict_contains(first, "Subtype")? && source.dict_contains(first, "Rect")?)
    }

    fn after_clone_entry(
        &self,
        cx: &mut CloneContext<'_>,
        _clone: NodeId,
        slot: Slot<'_>,
        value: &Value,
    ) -> Result<()> {
        let target = cx.target();
        let Value::Dictionary(annotation) = target.resolve(value)? else {
            return Ok(());
        };
        if !target.dict_contains(annotation, "FT")? {
            return Ok(());
        }
        match value.as_reference() {
            Some(field) => {
                FieldList::of(target)?.add(target, field)?;
            }
            None => debug!(?slot, "direct field annotation left out of /AcroForm"),
        }
        Ok(())
    }
}
