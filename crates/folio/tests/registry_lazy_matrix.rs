use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use folio::config::RegistryConfig;
use folio::error::SourceError;
use folio::registry::{ObjectSource, ObjectStreamInfo, Owner, Usage, XrefEntry};
use folio::{Error, Primitive, Reference, Registry, Value};

/// Object source backed by prebuilt primitives; records every load.
#[derive(Default)]
struct FakeSource {
    by_offset: HashMap<u64, Primitive>,
    inline: HashMap<(u32, u32), Primitive>,
    loads: Rc<RefCell<Vec<u32>>>,
    bodies: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl ObjectSource for FakeSource {
    fn load(&mut self, reference: Reference, offset: u64) -> Result<Primitive, SourceError> {
        self.loads.borrow_mut().push(reference.number);
        self.by_offset
            .get(&offset)
            .cloned()
            .ok_or_else(|| format!("nothing at offset {offset}").into())
    }

    fn load_inline(
        &mut self,
        info: &ObjectStreamInfo,
        body: &[u8],
        index: u32,
    ) -> Result<Primitive, SourceError> {
        self.bodies.borrow_mut().push(body.to_vec());
        self.inline
            .get(&(info.container.number, index))
            .cloned()
            .ok_or_else(|| format!("no object {index} in {}", info.container).into())
    }
}

struct Fixture {
    registry: Registry,
    loads: Rc<RefCell<Vec<u32>>>,
    bodies: Rc<RefCell<Vec<Vec<u8>>>>,
}

/// 1: catalog, 2: pages, 3: object stream holding 4, 5: compressed into the
/// non-stream 2, 6 and 8: unreusable slots, 7: free.
fn open_fixture() -> Fixture {
    let mut source = FakeSource::default();
    source.by_offset.insert(
        10,
        Primitive::dict([
            ("Type", Primitive::name("Catalog")),
            ("Pages", Primitive::reference(2, 0)),
        ]),
    );
    source.by_offset.insert(
        20,
        Primitive::dict([
            ("Type", Primitive::name("Pages")),
            ("Kids", Primitive::array([])),
            ("Count", Primitive::Integer(0)),
        ]),
    );
    source.by_offset.insert(
        30,
        Primitive::stream(
            [
                ("Type", Primitive::name("ObjStm")),
                ("N", Primitive::Integer(1)),
                ("First", Primitive::Integer(4)),
            ],
            b"4 0 42".to_vec(),
        ),
    );
    source.by_offset.insert(60, Primitive::Integer(6));
    source.by_offset.insert(
        80,
        Primitive::dict([
            ("A", Primitive::Integer(1)),
            ("Items", Primitive::array([Primitive::Integer(1)])),
        ]),
    );
    source.inline.insert((3, 0), Primitive::Integer(42));
    let loads = source.loads.clone();
    let bodies = source.bodies.clone();

    let trailer = Primitive::dict([
        ("Size", Primitive::Integer(9)),
        ("Root", Primitive::reference(1, 0)),
    ]);
    let entries = [
        XrefEntry::in_use(1, 0, 10),
        XrefEntry::in_use(2, 0, 20),
        XrefEntry::in_use(3, 0, 30),
        XrefEntry::compressed(4, 3, 0),
        XrefEntry::compressed(5, 2, 0),
        XrefEntry::in_use(6, u16::MAX, 60),
        XrefEntry::free(7, 1),
        XrefEntry::in_use(8, u16::MAX, 80),
    ];
    let registry =
        Registry::open(Box::new(source), &trailer, entries, RegistryConfig::default()).unwrap();
    Fixture {
        registry,
        loads,
        bodies,
    }
}

#[test]
fn lazy_objects_load_on_first_resolve_only() {
    let mut fx = open_fixture();
    assert!(fx.loads.borrow().is_empty());

    let catalog = fx.registry.catalog().unwrap();
    assert_eq!(*fx.loads.borrow(), vec![1]);
    let pages = fx.registry.resolve_entry(catalog, "Pages").unwrap().unwrap();
    fx.registry.resolve(&Value::Reference(Reference::new(2, 0))).unwrap();
    assert_eq!(*fx.loads.borrow(), vec![1, 2]);

    let pages = pages.node().unwrap();
    assert_eq!(
        fx.registry.dict_get(pages, "Count").unwrap(),
        Some(&Value::Integer(0))
    );
    assert!(!fx.registry.has_changes());
}

#[test]
fn lazy_compressed_object_resolves_through_container() {
    let mut fx = open_fixture();
    let value = fx
        .registry
        .resolve(&Value::Reference(Reference::new(4, 0)))
        .unwrap();
    assert_eq!(value, Value::Integer(42));
    assert_eq!(*fx.loads.borrow(), vec![3]);
    assert_eq!(*fx.bodies.borrow(), vec![b"4 0 42".to_vec()]);
    assert_eq!(fx.registry.object(4).unwrap().usage(), Usage::InUseCompressed);
}

#[test]
fn lazy_compressed_into_non_stream_is_corrupt_container() {
    let mut fx = open_fixture();
    let err = fx
        .registry
        .resolve(&Value::Reference(Reference::new(5, 0)))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CorruptContainer {
            number: 5,
            container: 2
        }
    ));
}

#[test]
fn lazy_free_and_missing_entries_dangle() {
    let mut fx = open_fixture();
    for reference in [Reference::new(7, 1), Reference::new(99, 0), Reference::new(1, 3)] {
        assert!(matches!(
            fx.registry.resolve(&Value::Reference(reference)),
            Err(Error::DanglingReference(r)) if r == reference
        ));
    }
}

#[test]
fn lazy_unreusable_generation_refuses_mutation() {
    let mut fx = open_fixture();
    let reference = Reference::new(6, u16::MAX);
    assert_eq!(
        fx.registry.resolve(&Value::Reference(reference)).unwrap(),
        Value::Integer(6)
    );
    assert!(matches!(
        fx.registry.set_object_data(6, Value::Integer(7)),
        Err(Error::UnreusableSlot(6))
    ));
    assert!(matches!(fx.registry.delete(6), Err(Error::UnreusableSlot(6))));
}

#[test]
fn lazy_unreusable_object_keeps_composite_data() {
    let mut fx = open_fixture();
    let dict = fx
        .registry
        .resolve_dictionary(&Value::Reference(Reference::new(8, u16::MAX)), "object 8")
        .unwrap();
    let items = fx.registry.dict_get(dict, "Items").unwrap().cloned().unwrap();
    let items = items.node().unwrap();

    assert!(matches!(
        fx.registry.dict_set(dict, "B", Value::Integer(2)),
        Err(Error::UnreusableSlot(8))
    ));
    assert!(matches!(fx.registry.dict_remove(dict, "A"), Err(Error::UnreusableSlot(8))));
    assert!(matches!(
        fx.registry.array_push(items, Value::Integer(2)),
        Err(Error::UnreusableSlot(8))
    ));
    assert!(matches!(fx.registry.array_remove(items, 0), Err(Error::UnreusableSlot(8))));

    assert!(!fx.registry.dict_contains(dict, "B").unwrap());
    assert_eq!(fx.registry.dict_get(dict, "A").unwrap(), Some(&Value::Integer(1)));
    assert_eq!(fx.registry.array_items(items).unwrap(), vec![Value::Integer(1)]);
    assert!(!fx.registry.has_changes());
}

#[test]
fn lazy_unreusable_object_refuses_compression() {
    let mut fx = open_fixture();
    assert!(matches!(fx.registry.compress(6, 3, 1), Err(Error::UnreusableSlot(6))));
    assert!(matches!(fx.registry.uncompress(6), Err(Error::UnreusableSlot(6))));
    let object = fx.registry.object(6).unwrap();
    assert_eq!(object.usage(), Usage::InUse);
    assert!(!object.is_updated());
}

#[test]
fn lazy_compress_keeps_identity() {
    let mut fx = open_fixture();
    let before = fx.registry.object(2).unwrap().reference();
    fx.registry.compress(2, 3, 1).unwrap();
    assert_eq!(fx.registry.object(2).unwrap().usage(), Usage::InUseCompressed);
    fx.registry.uncompress(2).unwrap();
    assert_eq!(fx.registry.object(2).unwrap().usage(), Usage::InUse);
    assert_eq!(fx.registry.object(2).unwrap().reference(), before);
    assert!(fx.registry.has_changes());
}

#[test]
fn lazy_mutation_dirties_up_to_object() {
    let mut fx = open_fixture();
    let catalog = fx.registry.catalog().unwrap();
    let viewer = fx.registry.create_dictionary();
    fx.registry.dict_set(catalog, "ViewerPreferences", viewer).unwrap();
    let viewer = fx
        .registry
        .dict_get(catalog, "ViewerPreferences")
        .unwrap()
        .cloned()
        .unwrap()
        .node()
        .unwrap();
    fx.registry.mark_clean();

    fx.registry.dict_set(viewer, "FitWindow", Value::Boolean(true)).unwrap();
    assert!(fx.registry.is_updated(viewer).unwrap());
    assert!(fx.registry.is_updated(catalog).unwrap());
    assert!(fx.registry.object(1).unwrap().is_updated());
    assert!(!fx.registry.object(2).unwrap().is_updated());
}

#[test]
fn dirty_propagation_stops_at_non_updateable() {
    let mut registry = Registry::new();
    let outer = registry.create_dictionary();
    let inner = registry.create_dictionary();
    let outer_id = outer.node().unwrap();
    registry.dict_set(outer_id, "Inner", inner).unwrap();
    let reference = registry.register(outer).unwrap();
    let inner_id = registry
        .dict_get(outer_id, "Inner")
        .unwrap()
        .cloned()
        .unwrap()
        .node()
        .unwrap();
    registry.mark_clean();

    registry.set_updateable(outer_id, false).unwrap();
    registry.dict_set(inner_id, "K", Value::Integer(1)).unwrap();
    assert!(registry.is_updated(inner_id).unwrap());
    assert!(!registry.is_updated(outer_id).unwrap());
    assert!(!registry.object(reference.number).unwrap().is_updated());
}

#[test]
fn copy_on_attach_keeps_single_owner() {
    let mut registry = Registry::new();
    let shared = registry.import(&Primitive::dict([("V", Primitive::Integer(1))]));
    let first = registry.create_array();
    let second = registry.create_array();
    registry.array_push(first.node().unwrap(), shared.clone()).unwrap();
    registry.array_push(second.node().unwrap(), shared.clone()).unwrap();

    let attached = registry.array_get(second.node().unwrap(), 0).unwrap().clone();
    assert_ne!(attached, shared);
    assert_eq!(
        registry.node(shared.node().unwrap()).unwrap().parent(),
        Some(Owner::Node(first.node().unwrap()))
    );

    registry
        .dict_set(attached.node().unwrap(), "V", Value::Integer(2))
        .unwrap();
    assert_eq!(
        registry.dict_get(shared.node().unwrap(), "V").unwrap(),
        Some(&Value::Integer(1))
    );
}

#[test]
fn virtual_object_registers_once() {
    let mut registry = Registry::new();
    let placeholder = registry.create_dictionary();
    let reference = registry.add_virtual(placeholder.clone()).unwrap();
    let before = registry.to_bytes().unwrap();
    assert_eq!(registry.len(), 1);
    assert!(!registry.is_registered(reference));

    let node = placeholder.node().unwrap();
    registry.dict_set(node, "A", Value::Integer(1)).unwrap();
    registry.dict_set(node, "B", Value::Integer(2)).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.is_registered(reference));

    let after = String::from_utf8(registry.to_bytes().unwrap()).unwrap();
    assert_ne!(after.as_bytes(), before.as_slice());
    assert!(after.contains(&format!("{} 0 obj\n<< /A 1 /B 2 >>\nendobj", reference.number)), "{after}");
}

#[test]
fn reachable_follows_references_once() {
    let mut registry = Registry::new();
    let leaf = registry.register(Value::Integer(1)).unwrap();
    let middle = registry.import(&Primitive::array([
        Primitive::Reference(leaf),
        Primitive::Reference(leaf),
    ]));
    let middle = registry.register(middle).unwrap();
    let top = registry.import(&Primitive::dict([("M", Primitive::Reference(middle))]));
    let reached = registry.reachable(&top).unwrap();
    assert_eq!(reached.into_iter().collect::<Vec<_>>(), vec![leaf.number, middle.number]);
}
