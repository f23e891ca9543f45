//! Balanced name/number tree.
//!
//! # Overview
//!
//! A sorted map whose nodes are registry dictionaries:
//!
//! | Node | Children entry | Items per child |
//! |------|----------------|-----------------|
//! | leaf | `/Names` or `/Nums`: `[k1 v1 k2 v2 …]` | 2 |
//! | intermediate | `/Kids`: `[r1 r2 …]` (references) | 1 |
//!
//! Every non-root node carries `/Limits [low high]`, the smallest and
//! largest key reachable below it, and holds between [`MIN_ORDER`] and
//! `2 * MIN_ORDER` children. The root has no limits and no minimum.
//!
//! Insertion splits full nodes on the way down, so the target leaf always
//! has room. Removal rebalances on the way down: a child at the minimum
//! borrows from a sibling (left first) or is merged with one (left first),
//! so the target leaf can always lose an entry. A root left with a single
//! kid collapses into it.

mod key;
mod node;

pub use key::TreeKey;

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::facade::Facade;
use crate::objects::{NodeId, Primitive, Reference, Value};
use crate::registry::Registry;
use node::{
    compute_limits, describe, key_at, kid_at, limits, locate, reference_of, refresh_limits,
    ChildKind, Children, KIDS_KEY,
};

/// Minimum number of children of a non-root node.
pub const MIN_ORDER: usize = 5;

pub struct Tree<K, V> {
    base: Value,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for Tree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tree").field(&self.base).finish()
    }
}

impl<K: TreeKey, V: Facade> Facade for Tree<K, V> {
    fn wrap(base: Value) -> Self {
        Self {
            base,
            _types: PhantomData,
        }
    }

    fn base(&self) -> &Value {
        &self.base
    }

    fn into_base(self) -> Value {
        self.base
    }
}

enum Search {
    Found(usize),
    Vacant(usize),
}

impl<K: TreeKey, V: Facade> Tree<K, V> {
    /// New empty tree rooted in a fresh indirect object.
    pub fn create(registry: &mut Registry) -> Result<Self> {
        let root = registry.import(&Primitive::dict([(K::PAIRS_KEY, Primitive::array([]))]));
        let reference = registry.register(root)?;
        Ok(Self::wrap(Value::Reference(reference)))
    }

    fn root(&self, registry: &mut Registry) -> Result<NodeId> {
        registry.resolve_dictionary(&self.base, "tree root")
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn get(&self, registry: &mut Registry, key: &K) -> Result<Option<V>> {
        let mut node = self.root(registry)?;
        loop {
            let children = Children::of::<K>(registry, node)?;
            match children.kind {
                ChildKind::Kids => match find_kid(registry, children, key)? {
                    Some((_, kid)) => node = kid,
                    None => return Ok(None),
                },
                ChildKind::Pairs => {
                    return match search_pairs(registry, children, key)? {
                        Search::Found(index) => {
                            let value = registry.array_get(children.array, 2 * index + 1)?.clone();
                            Ok(Some(V::wrap(value)))
                        }
                        Search::Vacant(_) => Ok(None),
                    };
                }
            }
        }
    }

    pub fn contains_key(&self, registry: &mut Registry, key: &K) -> Result<bool> {
        Ok(self.get(registry, key)?.is_some())
    }

    /// Value lookup would need a full scan per call.
    pub fn contains_value(&self, _registry: &mut Registry, _value: &V) -> Result<bool> {
        Err(Error::Unsupported("Tree::contains_value"))
    }

    // ── Insertion ─────────────────────────────────────────────────────────

    /// Insert or overwrite `key`; returns the previous value.
    pub fn put(&self, registry: &mut Registry, key: K, value: V) -> Result<Option<V>> {
        let root = self.root(registry)?;
        let children = Children::of::<K>(registry, root)?;
        if children.is_full() {
            grow::<K>(registry, root, children)?;
        }

        let mut path = Vec::new();
        let mut node = root;
        loop {
            let children = Children::of::<K>(registry, node)?;
            match children.kind {
                ChildKind::Kids if children.count == 0 => {
                    if let Some(old) = registry.dict_remove(node, KIDS_KEY)? {
                        registry.release(&old)?;
                    }
                    let pairs = registry.alloc_array();
                    registry.dict_set(node, K::PAIRS_KEY, Value::Array(pairs))?;
                }
                ChildKind::Kids => {
                    let kid = descend_for_insert(registry, children, &key)?;
                    path.push(node);
                    node = kid;
                }
                ChildKind::Pairs => {
                    let old = insert_at_leaf(registry, children, &key, value.into_base())?;
                    if old.is_none() {
                        if node != root {
                            refresh_limits::<K>(registry, node)?;
                        }
                        for &ancestor in path.iter().rev() {
                            if ancestor != root {
                                refresh_limits::<K>(registry, ancestor)?;
                            }
                        }
                    }
                    return Ok(old.map(V::wrap));
                }
            }
        }
    }

    pub fn put_all(&self, registry: &mut Registry, entries: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        for (key, value) in entries {
            self.put(registry, key, value)?;
        }
        Ok(())
    }

    // ── Removal ───────────────────────────────────────────────────────────

    pub fn remove(&self, registry: &mut Registry, key: &K) -> Result<Option<V>> {
        let root = self.root(registry)?;
        let mut path = Vec::new();
        let mut node = root;
        loop {
            let children = Children::of::<K>(registry, node)?;
            match children.kind {
                ChildKind::Kids => {
                    let Some((index, kid)) = find_kid(registry, children, key)? else {
                        return Ok(None);
                    };
                    let next = if Children::of::<K>(registry, kid)?.is_at_minimum() {
                        rebalance::<K>(registry, node, children, index, kid)?
                    } else {
                        kid
                    };
                    if next != node {
                        path.push(node);
                        node = next;
                    }
                }
                ChildKind::Pairs => {
                    let Search::Found(index) = search_pairs(registry, children, key)? else {
                        return Ok(None);
                    };
                    let removed = registry.array_drain(children.array, 2 * index..2 * index + 2)?;
                    let value = removed.into_iter().nth(1).unwrap_or(Value::Null);
                    if index == 0 || index + 1 == children.len() {
                        propagate_limits::<K>(registry, root, node, &path)?;
                    }
                    return Ok(Some(V::wrap(value)));
                }
            }
        }
    }

    /// Drop every entry, deleting every node object below the root.
    ///
    /// Only meaningful on a root: a subtree cleared in place would leave its
    /// ancestors' limits stale.
    pub fn clear(&self, registry: &mut Registry) -> Result<()> {
        let root = self.root(registry)?;
        let children = Children::of::<K>(registry, root)?;
        match children.kind {
            ChildKind::Kids => {
                let mut doomed = Vec::new();
                collect_nodes::<K>(registry, children.array, &mut doomed)?;
                if let Some(old) = registry.dict_remove(root, KIDS_KEY)? {
                    registry.release(&old)?;
                }
                for reference in doomed {
                    registry.delete(reference.number)?;
                }
                let pairs = registry.alloc_array();
                registry.dict_set(root, K::PAIRS_KEY, Value::Array(pairs))?;
            }
            ChildKind::Pairs => {
                for value in registry.array_clear(children.array)? {
                    registry.release(&value)?;
                }
            }
        }
        Ok(())
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    pub fn len(&self, registry: &mut Registry) -> Result<usize> {
        let root = self.root(registry)?;
        count_entries::<K>(registry, root)
    }

    pub fn is_empty(&self, registry: &mut Registry) -> Result<bool> {
        Ok(self.len(registry)? == 0)
    }

    /// Every entry in key order.
    pub fn entries(&self, registry: &mut Registry) -> Result<Vec<(K, V)>> {
        let root = self.root(registry)?;
        let mut out = Vec::new();
        collect_entries::<K>(registry, root, &mut out)?;
        Ok(out.into_iter().map(|(k, v)| (k, V::wrap(v))).collect())
    }

    pub fn keys(&self, registry: &mut Registry) -> Result<Vec<K>> {
        Ok(self.entries(registry)?.into_iter().map(|(k, _)| k).collect())
    }

    pub fn values(&self, registry: &mut Registry) -> Result<Vec<V>> {
        Ok(self.entries(registry)?.into_iter().map(|(_, v)| v).collect())
    }

    /// Verify order bounds, key order, limits and balance of the whole tree.
    pub fn check_invariants(&self, registry: &mut Registry) -> Result<()> {
        let root = self.root(registry)?;
        check_node::<K>(registry, root, true).map(|_| ())
    }
}

// ── Search ────────────────────────────────────────────────────────────────

/// Binary search of a `/Kids` array by the kids' limits.
fn find_kid<K: TreeKey>(
    registry: &mut Registry,
    children: Children,
    key: &K,
) -> Result<Option<(usize, NodeId)>> {
    let (mut low, mut high) = (0, children.count);
    while low < high {
        let mid = (low + high) / 2;
        let kid = kid_at(registry, children.array, mid)?;
        match locate(key, &limits::<K>(registry, kid)?) {
            Ordering::Less => high = mid,
            Ordering::Greater => low = mid + 1,
            Ordering::Equal => return Ok(Some((mid, kid))),
        }
    }
    Ok(None)
}

/// First kid whose upper limit is at least `key`: the kid covering it, or
/// the one after the gap it falls in. Keys past every kid go to the last.
fn insertion_kid<K: TreeKey>(registry: &mut Registry, children: Children, key: &K) -> Result<usize> {
    let (mut low, mut high) = (0, children.count);
    while low < high {
        let mid = (low + high) / 2;
        let kid = kid_at(registry, children.array, mid)?;
        let (_, upper) = limits::<K>(registry, kid)?;
        if *key <= upper {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Ok(low.min(children.count - 1))
}

/// Binary search of a pairs array; indexes count entries, not items.
fn search_pairs<K: TreeKey>(registry: &mut Registry, children: Children, key: &K) -> Result<Search> {
    let (mut low, mut high) = (0, children.count / 2);
    while low < high {
        let mid = (low + high) / 2;
        let candidate: K = key_at(registry, children.array, 2 * mid)?;
        match key.cmp(&candidate) {
            Ordering::Less => high = mid,
            Ordering::Greater => low = mid + 1,
            Ordering::Equal => return Ok(Search::Found(mid)),
        }
    }
    Ok(Search::Vacant(low))
}

// ── Insertion helpers ─────────────────────────────────────────────────────

/// Push a full root's children down into a new node, then split it.
fn grow<K: TreeKey>(registry: &mut Registry, root: NodeId, children: Children) -> Result<()> {
    let entry_key = children.key::<K>();
    let items = registry
        .dict_remove(root, entry_key)?
        .ok_or_else(|| Error::corrupt(format!("tree root {} lost its children", describe(registry, root))))?;
    let child = registry.alloc_dictionary();
    registry.dict_set(child, entry_key, items)?;
    let child_ref = registry.register(Value::Dictionary(child))?;
    refresh_limits::<K>(registry, child)?;

    let kids = registry.alloc_array();
    registry.array_push(kids, Value::Reference(child_ref))?;
    registry.dict_set(root, KIDS_KEY, Value::Array(kids))?;
    split::<K>(registry, kids, 0, child)?;
    debug!(root = %describe(registry, root), "tree grew one level");
    Ok(())
}

/// Move the lower half of the full kid at `index` into a new sibling placed
/// just before it. Returns the sibling.
fn split<K: TreeKey>(registry: &mut Registry, kids: NodeId, index: usize, full: NodeId) -> Result<NodeId> {
    let children = Children::of::<K>(registry, full)?;
    let lower = registry.array_drain(children.array, 0..children.min())?;
    let items = registry.alloc_array();
    for item in lower {
        registry.array_push(items, item)?;
    }
    let sibling = registry.alloc_dictionary();
    registry.dict_set(sibling, children.key::<K>(), Value::Array(items))?;
    let sibling_ref = registry.register(Value::Dictionary(sibling))?;
    registry.array_insert(kids, index, Value::Reference(sibling_ref))?;
    refresh_limits::<K>(registry, sibling)?;
    refresh_limits::<K>(registry, full)?;
    trace!(node = %describe(registry, full), sibling = %sibling_ref, "tree node split");
    Ok(sibling)
}

/// Kid of an intermediate node that should receive `key`, split first when
/// full.
fn descend_for_insert<K: TreeKey>(registry: &mut Registry, children: Children, key: &K) -> Result<NodeId> {
    let index = insertion_kid(registry, children, key)?;
    let kid = kid_at(registry, children.array, index)?;
    if !Children::of::<K>(registry, kid)?.is_full() {
        return Ok(kid);
    }
    let sibling = split::<K>(registry, children.array, index, kid)?;
    let (_, sibling_high) = limits::<K>(registry, sibling)?;
    Ok(if *key <= sibling_high { sibling } else { kid })
}

/// Overwrite or insert at a leaf; returns the overwritten value.
fn insert_at_leaf<K: TreeKey>(
    registry: &mut Registry,
    children: Children,
    key: &K,
    value: Value,
) -> Result<Option<Value>> {
    match search_pairs(registry, children, key)? {
        Search::Found(index) => registry
            .array_set(children.array, 2 * index + 1, value)
            .map(Some),
        Search::Vacant(index) => {
            registry.array_insert(children.array, 2 * index, key.to_value())?;
            registry.array_insert(children.array, 2 * index + 1, value)?;
            Ok(None)
        }
    }
}

// ── Removal helpers ───────────────────────────────────────────────────────

/// Give the kid at `index` (at the minimum) room to lose one unit.
///
/// Returns the node to continue the descent in: the kid itself, or `parent`
/// when the parent collapsed into it.
fn rebalance<K: TreeKey>(
    registry: &mut Registry,
    parent: NodeId,
    siblings: Children,
    index: usize,
    kid: NodeId,
) -> Result<NodeId> {
    let kid_children = Children::of::<K>(registry, kid)?;
    let unit = kid_children.unit();

    if index > 0 {
        let left = kid_at(registry, siblings.array, index - 1)?;
        let left_children = Children::of::<K>(registry, left)?;
        if left_children.can_lend() {
            let count = left_children.count;
            let moved = registry.array_drain(left_children.array, count - unit..count)?;
            for (offset, item) in moved.into_iter().enumerate() {
                registry.array_insert(kid_children.array, offset, item)?;
            }
            refresh_limits::<K>(registry, left)?;
            refresh_limits::<K>(registry, kid)?;
            trace!(node = %describe(registry, kid), "tree borrowed from left sibling");
            return Ok(kid);
        }
    }
    if index + 1 < siblings.count {
        let right = kid_at(registry, siblings.array, index + 1)?;
        let right_children = Children::of::<K>(registry, right)?;
        if right_children.can_lend() {
            for item in registry.array_drain(right_children.array, 0..unit)? {
                registry.array_push(kid_children.array, item)?;
            }
            refresh_limits::<K>(registry, right)?;
            refresh_limits::<K>(registry, kid)?;
            trace!(node = %describe(registry, kid), "tree borrowed from right sibling");
            return Ok(kid);
        }
    }

    if index > 0 {
        let left = kid_at(registry, siblings.array, index - 1)?;
        let left_children = Children::of::<K>(registry, left)?;
        let moved = registry.array_clear(left_children.array)?;
        for (offset, item) in moved.into_iter().enumerate() {
            registry.array_insert(kid_children.array, offset, item)?;
        }
        registry.array_remove(siblings.array, index - 1)?;
        let left_ref = reference_of(registry, left)?;
        registry.delete(left_ref.number)?;
        refresh_limits::<K>(registry, kid)?;
        debug!(node = %describe(registry, kid), merged = %left_ref, "tree merged left sibling");
    } else if index + 1 < siblings.count {
        let right = kid_at(registry, siblings.array, index + 1)?;
        let right_children = Children::of::<K>(registry, right)?;
        for item in registry.array_clear(right_children.array)? {
            registry.array_push(kid_children.array, item)?;
        }
        registry.array_remove(siblings.array, index + 1)?;
        let right_ref = reference_of(registry, right)?;
        registry.delete(right_ref.number)?;
        refresh_limits::<K>(registry, kid)?;
        debug!(node = %describe(registry, kid), merged = %right_ref, "tree merged right sibling");
    }

    if registry.array_len(siblings.array)? == 1 {
        collapse::<K>(registry, parent, kid)?;
        return Ok(parent);
    }
    Ok(kid)
}

/// Replace the parent's single kid by the kid's own children.
fn collapse<K: TreeKey>(registry: &mut Registry, parent: NodeId, kid: NodeId) -> Result<()> {
    let kid_children = Children::of::<K>(registry, kid)?;
    let entry_key = kid_children.key::<K>();
    let items = registry
        .dict_remove(kid, entry_key)?
        .ok_or_else(|| Error::corrupt(format!("tree node {} lost its children", describe(registry, kid))))?;
    if let Some(old) = registry.dict_remove(parent, KIDS_KEY)? {
        registry.release(&old)?;
    }
    registry.dict_set(parent, entry_key, items)?;
    let kid_ref = reference_of(registry, kid)?;
    registry.delete(kid_ref.number)?;
    debug!(node = %describe(registry, parent), removed = %kid_ref, "tree collapsed one level");
    Ok(())
}

/// Refresh limits from a leaf upward while the changed node sits at either
/// end of its parent's kids.
fn propagate_limits<K: TreeKey>(
    registry: &mut Registry,
    root: NodeId,
    leaf: NodeId,
    path: &[NodeId],
) -> Result<()> {
    if leaf == root {
        return Ok(());
    }
    refresh_limits::<K>(registry, leaf)?;
    let mut child = leaf;
    for &parent in path.iter().rev() {
        if parent == root {
            break;
        }
        let siblings = Children::of::<K>(registry, parent)?;
        let reference = Value::Reference(reference_of(registry, child)?);
        let position = registry.array_position(siblings.array, &reference)?;
        let boundary = matches!(position, Some(p) if p == 0 || p + 1 == siblings.count);
        if !boundary {
            break;
        }
        refresh_limits::<K>(registry, parent)?;
        child = parent;
    }
    Ok(())
}

// ── Traversal helpers ─────────────────────────────────────────────────────

fn count_entries<K: TreeKey>(registry: &mut Registry, node: NodeId) -> Result<usize> {
    let children = Children::of::<K>(registry, node)?;
    match children.kind {
        ChildKind::Pairs => Ok(children.len()),
        ChildKind::Kids => {
            let mut total = 0;
            for index in 0..children.count {
                let kid = kid_at(registry, children.array, index)?;
                total += count_entries::<K>(registry, kid)?;
            }
            Ok(total)
        }
    }
}

fn collect_entries<K: TreeKey>(registry: &mut Registry, node: NodeId, out: &mut Vec<(K, Value)>) -> Result<()> {
    let children = Children::of::<K>(registry, node)?;
    match children.kind {
        ChildKind::Pairs => {
            for index in 0..children.len() {
                let key = key_at(registry, children.array, 2 * index)?;
                let value = registry.array_get(children.array, 2 * index + 1)?.clone();
                out.push((key, value));
            }
        }
        ChildKind::Kids => {
            for index in 0..children.count {
                let kid = kid_at(registry, children.array, index)?;
                collect_entries::<K>(registry, kid, out)?;
            }
        }
    }
    Ok(())
}

/// References of every node object below a `/Kids` array.
fn collect_nodes<K: TreeKey>(registry: &mut Registry, kids: NodeId, out: &mut Vec<Reference>) -> Result<()> {
    for item in registry.array_items(kids)? {
        let kid = registry.resolve_dictionary(&item, "tree kid")?;
        let children = Children::of::<K>(registry, kid)?;
        if children.kind == ChildKind::Kids {
            collect_nodes::<K>(registry, children.array, out)?;
        }
        if let Some(reference) = item.as_reference() {
            out.push(reference);
        }
    }
    Ok(())
}

struct Summary<K> {
    range: Option<(K, K)>,
    depth: usize,
}

fn check_node<K: TreeKey>(registry: &mut Registry, node: NodeId, is_root: bool) -> Result<Summary<K>> {
    let children = Children::of::<K>(registry, node)?;
    let name = describe(registry, node);
    if children.count > children.max() {
        return Err(Error::corrupt(format!(
            "tree node {name} holds {} items, above {}",
            children.count,
            children.max()
        )));
    }
    if !is_root && children.count < children.min() {
        return Err(Error::corrupt(format!(
            "tree node {name} holds {} items, below {}",
            children.count,
            children.min()
        )));
    }

    let summary = match children.kind {
        ChildKind::Pairs => {
            if children.count % 2 != 0 {
                return Err(Error::corrupt(format!("tree leaf {name} has an odd item count")));
            }
            let mut range: Option<(K, K)> = None;
            for index in 0..children.len() {
                let key: K = key_at(registry, children.array, 2 * index)?;
                range = match range {
                    Some((_, ref high)) if *high >= key => {
                        return Err(Error::corrupt(format!("tree leaf {name} keys out of order at {key:?}")));
                    }
                    Some((low, _)) => Some((low, key)),
                    None => Some((key.clone(), key)),
                };
            }
            Summary { range, depth: 0 }
        }
        ChildKind::Kids => {
            let mut range: Option<(K, K)> = None;
            let mut depth = None;
            for index in 0..children.count {
                let kid = kid_at(registry, children.array, index)?;
                let kid_summary = check_node::<K>(registry, kid, false)?;
                let Some((low, high)) = kid_summary.range else {
                    return Err(Error::corrupt(format!("tree node {name} has an empty kid")));
                };
                match depth {
                    None => depth = Some(kid_summary.depth),
                    Some(d) if d != kid_summary.depth => {
                        return Err(Error::corrupt(format!("tree node {name} is unbalanced")));
                    }
                    Some(_) => {}
                }
                range = match range {
                    Some((_, ref previous)) if *previous >= low => {
                        return Err(Error::corrupt(format!("tree node {name} kids overlap at {low:?}")));
                    }
                    Some((first, _)) => Some((first, high)),
                    None => Some((low, high)),
                };
            }
            Summary {
                range,
                depth: depth.map_or(1, |d| d + 1),
            }
        }
    };

    if !is_root {
        let stored = limits::<K>(registry, node)?;
        let actual = compute_limits::<K>(registry, node)?;
        if summary.range.as_ref() != Some(&stored) || actual.as_ref() != Some(&stored) {
            return Err(Error::corrupt(format!("tree node {name} has stale limits {stored:?}")));
        }
    }
    Ok(summary)
}
