use std::collections::BTreeMap;

use folio::facade::Catalog;
use folio::{Error, Facade, NameTree, NumberTree, PdfString, Registry, Value};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
enum Op {
    Put(i64, i64),
    Remove(i64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0i64..120, any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (0i64..120).prop_map(Op::Remove),
    ]
}

fn kids(registry: &mut Registry, tree: &NumberTree) -> Vec<Value> {
    let root = registry.resolve_dictionary(tree.base(), "root").unwrap();
    match registry.dict_get(root, "Kids").unwrap().cloned() {
        Some(kids) => {
            let kids = registry.resolve_array(&kids, "kids").unwrap();
            registry.array_items(kids).unwrap()
        }
        None => Vec::new(),
    }
}

fn limits_of(registry: &mut Registry, kid: &Value) -> (i64, i64) {
    let node = registry.resolve_dictionary(kid, "kid").unwrap();
    let limits = registry.dict_get(node, "Limits").unwrap().cloned().unwrap();
    let limits = registry.resolve_array(&limits, "limits").unwrap();
    (
        registry.array_get(limits, 0).unwrap().as_integer().unwrap(),
        registry.array_get(limits, 1).unwrap().as_integer().unwrap(),
    )
}

proptest! {
    #[test]
    fn tree_matches_btree_model(ops in proptest::collection::vec(arb_op(), 1..300)) {
        let mut registry = Registry::new();
        let tree = NumberTree::create(&mut registry).unwrap();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let old = tree.put(&mut registry, k, Value::Integer(v)).unwrap();
                    prop_assert_eq!(old, model.insert(k, v).map(Value::Integer));
                }
                Op::Remove(k) => {
                    let old = tree.remove(&mut registry, &k).unwrap();
                    prop_assert_eq!(old, model.remove(&k).map(Value::Integer));
                }
            }
            tree.check_invariants(&mut registry).unwrap();
        }

        prop_assert_eq!(tree.len(&mut registry).unwrap(), model.len());
        let keys = tree.keys(&mut registry).unwrap();
        prop_assert_eq!(keys, model.keys().copied().collect::<Vec<_>>());
        for (k, v) in &model {
            prop_assert_eq!(tree.get(&mut registry, k).unwrap(), Some(Value::Integer(*v)));
        }
    }
}

#[test]
fn tree_seeded_differential_against_btree() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut registry = Registry::new();
    let tree = NumberTree::create(&mut registry).unwrap();
    let mut model = BTreeMap::new();

    for _ in 0..4000 {
        let key = rng.gen_range(0..600);
        if rng.gen_bool(0.6) {
            tree.put(&mut registry, key, Value::Integer(key * 2)).unwrap();
            model.insert(key, key * 2);
        } else {
            let removed = tree.remove(&mut registry, &key).unwrap();
            assert_eq!(removed, model.remove(&key).map(Value::Integer));
        }
    }
    tree.check_invariants(&mut registry).unwrap();
    let entries: Vec<(i64, Value)> = tree.entries(&mut registry).unwrap();
    let expected: Vec<(i64, Value)> = model.iter().map(|(k, v)| (*k, Value::Integer(*v))).collect();
    assert_eq!(entries, expected);
}

#[test]
fn tree_ascending_inserts_split_root_on_eleventh() {
    let mut registry = Registry::new();
    let tree = NumberTree::create(&mut registry).unwrap();
    for key in 1..=25 {
        tree.put(&mut registry, key, Value::Integer(key)).unwrap();
        tree.check_invariants(&mut registry).unwrap();
        if key == 10 {
            assert!(kids(&mut registry, &tree).is_empty());
        }
        if key == 11 {
            let kids = kids(&mut registry, &tree);
            assert_eq!(kids.len(), 2);
            let (low, high) = limits_of(&mut registry, &kids[0]);
            let (next_low, next_high) = limits_of(&mut registry, &kids[1]);
            assert_eq!(low, 1);
            assert!(high < next_low);
            assert_eq!(next_high, 11);
        }
    }
    let kids = kids(&mut registry, &tree);
    assert_eq!(limits_of(&mut registry, &kids[0]).0, 1);
    assert_eq!(limits_of(&mut registry, kids.last().unwrap()).1, 25);
    assert_eq!(tree.len(&mut registry).unwrap(), 25);
}

#[test]
fn tree_remove_max_with_last_child_at_minimum() {
    let mut registry = Registry::new();
    let tree = NumberTree::create(&mut registry).unwrap();
    for key in 1..=25 {
        tree.put(&mut registry, key, Value::Integer(key)).unwrap();
    }
    // shrink the last child down to the minimum
    loop {
        let kids = kids(&mut registry, &tree);
        let last = kids.last().unwrap();
        let node = registry.resolve_dictionary(last, "kid").unwrap();
        let nums = registry.dict_get(node, "Nums").unwrap().cloned().unwrap();
        let nums = registry.resolve_array(&nums, "nums").unwrap();
        if registry.array_len(nums).unwrap() == 10 {
            break;
        }
        let (_, high) = limits_of(&mut registry, last);
        tree.remove(&mut registry, &high).unwrap();
    }
    let before = kids(&mut registry, &tree);
    let (_, max) = limits_of(&mut registry, before.last().unwrap());

    assert_eq!(tree.remove(&mut registry, &max).unwrap(), Some(Value::Integer(max)));
    tree.check_invariants(&mut registry).unwrap();
    assert_eq!(tree.get(&mut registry, &max).unwrap(), None);

    let after = kids(&mut registry, &tree);
    if let Some(last) = after.last() {
        let (_, high) = limits_of(&mut registry, last);
        assert_eq!(high, max - 1);
    }
    assert_eq!(tree.keys(&mut registry).unwrap().last(), Some(&(max - 1)));
}

#[test]
fn tree_get_from_empty_and_single_entry() {
    let mut registry = Registry::new();
    let tree = NameTree::create(&mut registry).unwrap();
    assert_eq!(tree.get(&mut registry, &PdfString::from("a")).unwrap(), None);

    tree.put(&mut registry, PdfString::from("b"), Value::Integer(1)).unwrap();
    assert_eq!(tree.get(&mut registry, &PdfString::from("a")).unwrap(), None);
    assert_eq!(tree.get(&mut registry, &PdfString::from("c")).unwrap(), None);
}

#[test]
fn tree_name_keys_order_by_bytes() {
    let mut registry = Registry::new();
    let tree = NameTree::create(&mut registry).unwrap();
    for name in ["beta", "Alpha", "alpha", "gamma", "a"] {
        tree.put(&mut registry, PdfString::from(name), Value::string(name)).unwrap();
    }
    let keys: Vec<String> = tree
        .keys(&mut registry)
        .unwrap()
        .iter()
        .map(PdfString::to_text)
        .collect();
    assert_eq!(keys, ["Alpha", "a", "alpha", "beta", "gamma"]);
}

#[test]
fn tree_catalog_name_tree_materializes_on_put() {
    let mut registry = Registry::new();
    let catalog = Catalog::of(&registry).unwrap();
    let dests = catalog.name_tree(&mut registry, "Dests").unwrap();
    assert!(!dests.exists(&registry));

    dests.put(&mut registry, PdfString::from("intro"), Value::Integer(3)).unwrap();
    assert!(dests.exists(&registry));
    let text = String::from_utf8(registry.to_bytes().unwrap()).unwrap();
    assert!(text.contains("/Names << /Dests << /Names [(intro) 3] >> >>"), "{text}");

    let again = Catalog::of(&registry).unwrap().name_tree(&mut registry, "Dests").unwrap();
    assert_eq!(
        again.get(&mut registry, &PdfString::from("intro")).unwrap(),
        Some(Value::Integer(3))
    );
}

#[test]
fn tree_malformed_leaf_is_reported() {
    let mut registry = Registry::new();
    let tree = NumberTree::create(&mut registry).unwrap();
    tree.put(&mut registry, 1, Value::Integer(1)).unwrap();
    let root = registry.resolve_dictionary(tree.base(), "root").unwrap();
    let nums = registry.dict_get(root, "Nums").unwrap().cloned().unwrap();
    let nums = registry.resolve_array(&nums, "nums").unwrap();
    registry.array_push(nums, Value::Integer(9)).unwrap();
    assert!(matches!(
        tree.check_invariants(&mut registry),
        Err(Error::StructuralCorruption(_))
    ));
}

#[test]
fn tree_name_tree_splits_and_keeps_limits() {
    let mut registry = Registry::new();
    let tree = NameTree::create(&mut registry).unwrap();
    for i in 0..30 {
        let key = PdfString::from(format!("key{i:02}").as_str());
        tree.put(&mut registry, key, Value::Integer(i)).unwrap();
        tree.check_invariants(&mut registry).unwrap();
    }
    for i in (0..30).step_by(3) {
        let key = PdfString::from(format!("key{i:02}").as_str());
        assert_eq!(tree.remove(&mut registry, &key).unwrap(), Some(Value::Integer(i)));
        tree.check_invariants(&mut registry).unwrap();
    }
    assert_eq!(tree.len(&mut registry).unwrap(), 20);
    let first = tree.keys(&mut registry).unwrap().first().map(PdfString::to_text);
    assert_eq!(first.as_deref(), Some("key01"));
}
