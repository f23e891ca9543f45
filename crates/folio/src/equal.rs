//! Structural equality across registries.
//!
//! Two values are equivalent when they have the same shape and scalars, and
//! references on both sides lead to equivalent objects. Object numbers and
//! generations are not compared, so a graph and its alien clone are
//! equivalent. Pairs of objects already under comparison are assumed equal,
//! which makes cyclic graphs terminate.

use std::collections::HashSet;

use crate::error::Result;
use crate::objects::{NodeId, Value};
use crate::registry::Registry;

/// Deep comparison of `a` in `left` with `b` in `right`.
pub fn equivalent(left: &mut Registry, a: &Value, right: &mut Registry, b: &Value) -> Result<bool> {
    let mut visited = HashSet::new();
    cmp(left, a, right, b, &mut visited)
}

fn cmp(
    left: &mut Registry,
    a: &Value,
    right: &mut Registry,
    b: &Value,
    visited: &mut HashSet<(u32, u32)>,
) -> Result<bool> {
    match (a, b) {
        (Value::Reference(ra), Value::Reference(rb)) => {
            if !visited.insert((ra.number, rb.number)) {
                return Ok(true);
            }
            let da = left.object_data(*ra)?;
            let db = right.object_data(*rb)?;
            cmp(left, &da, right, &db, visited)
        }
        (Value::Array(ia), Value::Array(ib)) => {
            let items_a = left.array_items(*ia)?;
            let items_b = right.array_items(*ib)?;
            if items_a.len() != items_b.len() {
                return Ok(false);
            }
            for (x, y) in items_a.iter().zip(&items_b) {
                if !cmp(left, x, right, y, visited)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Dictionary(ia), Value::Dictionary(ib)) => cmp_entries(left, *ia, right, *ib, visited),
        (Value::Stream(ia), Value::Stream(ib)) => {
            if left.stream_body(*ia)? != right.stream_body(*ib)? {
                return Ok(false);
            }
            cmp_entries(left, *ia, right, *ib, visited)
        }
        (Value::Array(_) | Value::Dictionary(_) | Value::Stream(_) | Value::Reference(_), _)
        | (_, Value::Array(_) | Value::Dictionary(_) | Value::Stream(_) | Value::Reference(_)) => {
            Ok(false)
        }
        (x, y) => Ok(x == y),
    }
}

fn cmp_entries(
    left: &mut Registry,
    ia: NodeId,
    right: &mut Registry,
    ib: NodeId,
    visited: &mut HashSet<(u32, u32)>,
) -> Result<bool> {
    let entries_a = left.dict_entries(ia)?;
    if entries_a.len() != right.dict_len(ib)? {
        return Ok(false);
    }
    for (key, x) in entries_a {
        let Some(y) = right.dict_get(ib, key.as_str())?.cloned() else {
            return Ok(false);
        };
        if !cmp(left, &x, right, &y, visited)? {
            return Ok(false);
        }
    }
    Ok(true)
}
