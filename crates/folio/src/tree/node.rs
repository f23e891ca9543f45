//! Tree node shape: which children collection a node holds and its limits.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::objects::{NodeId, Reference, Value};
use crate::registry::Registry;

use super::key::TreeKey;
use super::MIN_ORDER;

pub(super) const KIDS_KEY: &str = "Kids";
pub(super) const LIMITS_KEY: &str = "Limits";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChildKind {
    /// `/Kids`: references to child nodes, one item per child.
    Kids,
    /// Interleaved key/value pairs, two items per entry.
    Pairs,
}

/// The children collection of one tree node.
#[derive(Debug, Clone, Copy)]
pub(super) struct Children {
    pub kind: ChildKind,
    pub array: NodeId,
    pub count: usize,
}

impl Children {
    pub fn of<K: TreeKey>(registry: &mut Registry, node: NodeId) -> Result<Self> {
        let (kind, entry) = if let Some(kids) = registry.dict_get(node, KIDS_KEY)?.cloned() {
            (ChildKind::Kids, kids)
        } else if let Some(pairs) = registry.dict_get(node, K::PAIRS_KEY)?.cloned() {
            (ChildKind::Pairs, pairs)
        } else {
            return Err(Error::corrupt(format!(
                "tree node {} has neither /{KIDS_KEY} nor /{}",
                describe(registry, node),
                K::PAIRS_KEY
            )));
        };
        let array = registry.resolve_array(&entry, "tree node children")?;
        let count = registry.array_len(array)?;
        Ok(Self { kind, array, count })
    }

    pub fn key<K: TreeKey>(&self) -> &'static str {
        match self.kind {
            ChildKind::Kids => KIDS_KEY,
            ChildKind::Pairs => K::PAIRS_KEY,
        }
    }

    /// Items per logical child.
    pub fn unit(&self) -> usize {
        match self.kind {
            ChildKind::Kids => 1,
            ChildKind::Pairs => 2,
        }
    }

    pub fn min(&self) -> usize {
        MIN_ORDER * self.unit()
    }

    pub fn max(&self) -> usize {
        2 * self.min()
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max()
    }

    /// Whether removing one unit would leave the node under the minimum.
    pub fn is_at_minimum(&self) -> bool {
        self.count <= self.min()
    }

    pub fn can_lend(&self) -> bool {
        self.count > self.min()
    }

    /// Number of logical children.
    pub fn len(&self) -> usize {
        self.count / self.unit()
    }
}

/// Object number of `node`, for diagnostics.
pub(super) fn describe(registry: &Registry, node: NodeId) -> String {
    match registry.containing_object(node) {
        Some(reference) => reference.to_string(),
        None => format!("(direct node {})", node.index()),
    }
}

/// Dictionary of the kid at `index` of a `/Kids` array.
pub(super) fn kid_at(registry: &mut Registry, kids: NodeId, index: usize) -> Result<NodeId> {
    let item = registry.array_get(kids, index)?.clone();
    registry.resolve_dictionary(&item, "tree kid")
}

/// Reference addressing a registered tree node.
pub(super) fn reference_of(registry: &Registry, node: NodeId) -> Result<Reference> {
    registry
        .unresolve(&Value::Dictionary(node))
        .as_reference()
        .ok_or_else(|| Error::corrupt(format!("tree node {} is not an indirect object", node.index())))
}

/// Key stored at `index` of an array (pairs or limits).
pub(super) fn key_at<K: TreeKey>(registry: &mut Registry, array: NodeId, index: usize) -> Result<K> {
    let value = registry.array_get(array, index)?.clone();
    let value = registry.resolve(&value)?;
    K::from_value(&value)
}

/// Stored `/Limits` of a node.
pub(super) fn limits<K: TreeKey>(registry: &mut Registry, node: NodeId) -> Result<(K, K)> {
    let Some(entry) = registry.dict_get(node, LIMITS_KEY)?.cloned() else {
        return Err(Error::corrupt(format!(
            "tree node {} has no /{LIMITS_KEY}",
            describe(registry, node)
        )));
    };
    let array = registry.resolve_array(&entry, "tree node limits")?;
    if registry.array_len(array)? != 2 {
        return Err(Error::corrupt(format!(
            "tree node {} has malformed /{LIMITS_KEY}",
            describe(registry, node)
        )));
    }
    Ok((key_at(registry, array, 0)?, key_at(registry, array, 1)?))
}

/// Where `key` falls relative to a `[low, high]` range.
pub(super) fn locate<K: Ord>(key: &K, (low, high): &(K, K)) -> Ordering {
    if key < low {
        Ordering::Less
    } else if key > high {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// True key range of a node, derived from its children.
pub(super) fn compute_limits<K: TreeKey>(registry: &mut Registry, node: NodeId) -> Result<Option<(K, K)>> {
    let children = Children::of::<K>(registry, node)?;
    if children.count == 0 {
        return Ok(None);
    }
    match children.kind {
        ChildKind::Pairs => {
            let low = key_at(registry, children.array, 0)?;
            let high = key_at(registry, children.array, children.count - 2)?;
            Ok(Some((low, high)))
        }
        ChildKind::Kids => {
            let first = kid_at(registry, children.array, 0)?;
            let last = kid_at(registry, children.array, children.count - 1)?;
            let (low, _) = limits::<K>(registry, first)?;
            let (_, high) = limits::<K>(registry, last)?;
            Ok(Some((low, high)))
        }
    }
}

/// Recompute and store the `/Limits` of a non-root node.
///
/// Unchanged limits are left untouched so the node is not dirtied.
pub(super) fn refresh_limits<K: TreeKey>(registry: &mut Registry, node: NodeId) -> Result<()> {
    let Some((low, high)) = compute_limits::<K>(registry, node)? else {
        registry.dict_remove(node, LIMITS_KEY)?;
        return Ok(());
    };
    if registry.dict_contains(node, LIMITS_KEY)? {
        if let Ok(current) = limits::<K>(registry, node) {
            if current.0 == low && current.1 == high {
                return Ok(());
            }
        }
    }
    let array = registry.alloc_array();
    registry.array_push(array, low.to_value())?;
    registry.array_push(array, high.to_value())?;
    if let Some(old) = registry.dict_set(node, LIMITS_KEY, Value::Array(array))? {
        registry.release(&old)?;
    }
    Ok(())
}
