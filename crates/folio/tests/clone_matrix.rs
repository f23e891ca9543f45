use folio::config::CloneConfig;
use folio::equal::equivalent;
use folio::facade::{FieldList, Page};
use folio::{Cloner, Facade, Primitive, Reference, Registry, Value};

/// Page tree root defining `/Resources`, with one page inheriting it.
fn source_with_page() -> (Registry, Reference, Reference) {
    let mut source = Registry::new();
    let font = source.import(&Primitive::dict([
        ("Type", Primitive::name("Font")),
        ("BaseFont", Primitive::name("Helvetica")),
    ]));
    let font = source.register(font).unwrap();
    let pages = source.import(&Primitive::dict([
        ("Type", Primitive::name("Pages")),
        (
            "Resources",
            Primitive::dict([("Font", Primitive::dict([("F1", Primitive::Reference(font))]))]),
        ),
        ("MediaBox", Primitive::rect(0.0, 0.0, 612.0, 792.0)),
    ]));
    let pages = source.register(pages).unwrap();
    let page = source.import(&Primitive::dict([
        ("Type", Primitive::name("Page")),
        ("Parent", Primitive::Reference(pages)),
        ("Contents", Primitive::stream([("Length", Primitive::Integer(2))], b"BT".to_vec())),
    ]));
    let page = source.register(page).unwrap();
    let pages_node = source
        .resolve_dictionary(&Value::Reference(pages), "pages")
        .unwrap();
    source.dict_set(pages_node, "Kids", Value::Reference(page)).unwrap();
    (source, pages, page)
}

#[test]
fn clone_page_carries_inherited_resources() {
    let (mut source, _, page) = source_with_page();
    let mut target = Registry::new();

    let clone = Page::wrap(Value::Reference(page))
        .clone_to(&Cloner::new(), &mut source, &mut target)
        .unwrap();
    let node = clone.node(&mut target).unwrap();
    assert!(!target.dict_contains(node, "Parent").unwrap());

    let resources = target.dict_get(node, "Resources").unwrap().cloned().unwrap();
    let resources = target.resolve_dictionary(&resources, "resources").unwrap();
    let fonts = target.resolve_entry(resources, "Font").unwrap().unwrap();
    let font = target
        .dict_get(fonts.node().unwrap(), "F1")
        .unwrap()
        .cloned()
        .unwrap();
    let font = target.resolve_dictionary(&font, "font").unwrap();
    assert!(target.dict_get(font, "BaseFont").unwrap().unwrap().is_name("Helvetica"));
    assert!(target.dict_contains(node, "MediaBox").unwrap());
    assert!(!target.dict_contains(node, "Rotate").unwrap());

    // catalog, page, font: the page tree root stayed behind
    assert_eq!(target.len(), 3);
}

#[test]
fn clone_is_independent_of_source() {
    let (mut source, pages, _) = source_with_page();
    let source_data = source.resolve(&Value::Reference(pages)).unwrap();
    let before = source.view(&source_data).unwrap();
    let mut target = Registry::new();
    let clone = Cloner::bare()
        .clone(&mut source, &Value::Reference(pages), &mut target)
        .unwrap();
    assert!(equivalent(&mut source, &Value::Reference(pages), &mut target, &clone).unwrap());

    let node = target.resolve_dictionary(&clone, "clone").unwrap();
    target.dict_set(node, "Count", Value::Integer(1)).unwrap();
    target.dict_remove(node, "MediaBox").unwrap();

    assert_eq!(source.view(&source_data).unwrap(), before);
    assert!(!equivalent(&mut source, &Value::Reference(pages), &mut target, &clone).unwrap());
}

#[test]
fn clones_in_two_targets_are_mutually_independent() {
    let (mut source, pages, _) = source_with_page();
    let source_value = Value::Reference(pages);
    let mut first = Registry::new();
    let mut second = Registry::new();
    let cloner = Cloner::bare();
    let first_clone = cloner.clone(&mut source, &source_value, &mut first).unwrap();
    let second_clone = cloner.clone(&mut source, &source_value, &mut second).unwrap();
    let second_data = second.resolve(&second_clone).unwrap();
    let second_view = second.view(&second_data).unwrap();

    let node = first.resolve_dictionary(&first_clone, "first").unwrap();
    first.dict_set(node, "Count", Value::Integer(7)).unwrap();
    assert_eq!(second.view(&second_data).unwrap(), second_view);
    assert!(equivalent(&mut source, &source_value, &mut second, &second_clone).unwrap());

    let first_data = first.resolve(&first_clone).unwrap();
    let first_view = first.view(&first_data).unwrap();
    let node = source.resolve_dictionary(&source_value, "source").unwrap();
    source.dict_remove(node, "MediaBox").unwrap();
    let resources = source.resolve_entry(node, "Resources").unwrap().unwrap();
    source
        .dict_set(resources.node().unwrap(), "ProcSet", Value::name("PDF"))
        .unwrap();

    assert_eq!(first.view(&first_data).unwrap(), first_view);
    assert_eq!(second.view(&second_data).unwrap(), second_view);
    let second_node = second.resolve_dictionary(&second_clone, "second").unwrap();
    assert!(second.dict_contains(second_node, "MediaBox").unwrap());
    assert!(!equivalent(&mut source, &source_value, &mut second, &second_clone).unwrap());
}

#[test]
fn clone_cycle_through_parent_without_page_filter() {
    let (mut source, _, page) = source_with_page();
    let mut target = Registry::new();
    let config: CloneConfig = toml::from_str("page_consolidation = false").unwrap();
    let cloner = Cloner::from_config(&config);
    assert_eq!(cloner.filter_names(), vec!["annotation"]);

    let clone = cloner
        .clone(&mut source, &Value::Reference(page), &mut target)
        .unwrap();
    let node = target.resolve_dictionary(&clone, "page").unwrap();
    let parent = target.resolve_entry(node, "Parent").unwrap().unwrap();
    let kids = target.dict_get(parent.node().unwrap(), "Kids").unwrap().cloned();
    assert_eq!(kids, Some(clone.clone()));
    // catalog, page, pages, font
    assert_eq!(target.len(), 4);
}

#[test]
fn clone_stream_copies_body() {
    let (mut source, _, page) = source_with_page();
    let mut target = Registry::new();
    let clone = Cloner::new()
        .clone(&mut source, &Value::Reference(page), &mut target)
        .unwrap();
    let node = target.resolve_dictionary(&clone, "page").unwrap();
    let contents = target.dict_get(node, "Contents").unwrap().cloned().unwrap();
    let contents = target.resolve_stream(&contents, "contents").unwrap();
    assert_eq!(target.stream_body(contents).unwrap(), b"BT".to_vec());
    let bytes = String::from_utf8(target.to_bytes().unwrap()).unwrap();
    assert!(bytes.contains("<< /Length 2 >>\nstream\r\nBT\r\nendstream"), "{bytes}");
}

#[test]
fn clone_annotation_fields_registered_once() {
    let mut source = Registry::new();
    let field = source.import(&Primitive::dict([
        ("Subtype", Primitive::name("Widget")),
        ("Rect", Primitive::rect(0.0, 0.0, 1.0, 1.0)),
        ("FT", Primitive::name("Btn")),
    ]));
    let field = source.register(field).unwrap();
    let annots = source.import(&Primitive::array([
        Primitive::Reference(field),
        Primitive::Reference(field),
    ]));

    let mut target = Registry::new();
    Cloner::new().clone(&mut source, &annots, &mut target).unwrap();
    let fields = FieldList::of(&mut target).unwrap();
    assert_eq!(fields.len(&mut target).unwrap(), 1);
}
