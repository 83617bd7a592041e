use kgraph_core::view::{abs_root, alias, attr, child, node, resolve, tag};
use kgraph_core::{ErrorKind, GraphStore, MemoryGraphStore, NodeId};

fn setup() -> (MemoryGraphStore, NodeId) {
    let mut store = MemoryGraphStore::new();
    let target = (abs_root() | child().with("notes.rust"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    (store, target)
}

#[test]
fn alias_fetch_returns_the_aliased_node() {
    let (mut store, target) = setup();
    let install = abs_root() | child().with("inbox") | alias().with(target);

    assert_eq!(install.create(&mut store).unwrap(), vec![target]);
    assert_eq!(install.try_node_vec(&store).unwrap(), vec![target]);
    assert_eq!(
        (abs_root() | child().with("inbox") | alias()).single(&store).unwrap(),
        target
    );
}

#[test]
fn alias_create_reuses_existing_alias() {
    let (mut store, target) = setup();
    let install = abs_root() | child().with("inbox") | alias().with("notes.rust");

    install.create(&mut store).unwrap();
    let after_first = store.len();
    assert_eq!(install.create(&mut store).unwrap(), vec![target]);
    assert_eq!(store.len(), after_first);
}

#[test]
fn alias_content_is_delegated_to_source() {
    let (mut store, target) = setup();
    store.update_body(target, "ownership notes").unwrap();
    let inbox = (abs_root() | child().with("inbox"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    (node(inbox) | alias().with(target)).create(&mut store).unwrap();

    let alias_node = store.fetch_children(inbox).unwrap()[0];
    assert!(store.is_alias(alias_node).unwrap());
    assert_eq!(store.fetch_heading(alias_node).unwrap(), "rust");
    assert_eq!(store.fetch_body(alias_node).unwrap(), "ownership notes");

    assert_eq!((node(alias_node) | resolve()).single(&store).unwrap(), target);
    assert_eq!((node(target) | resolve()).single(&store).unwrap(), target);
}

#[test]
fn alias_rejects_cycles_and_root() {
    let (mut store, _) = setup();
    let notes = (abs_root() | child().with("notes")).single(&store).unwrap();

    let cycle = (abs_root() | child().with("notes.inner") | alias().with(notes))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(cycle.kind(), ErrorKind::Uncategorized);

    let root = store.root_node();
    let rooted = (abs_root() | child().with("inbox") | alias().with(root))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(rooted.kind(), ErrorKind::Uncategorized);
}

#[test]
fn alias_refuses_to_retarget_an_existing_heading() {
    let (mut store, target) = setup();
    let inbox = (abs_root() | child().with("inbox"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    (node(inbox) | alias().with(target)).create(&mut store).unwrap();
    let other = (abs_root() | child().with("archive.rust"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    let before = store.len();

    let err = (node(inbox) | alias().with(other))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Uncategorized);
    assert_eq!(store.len(), before);
    assert_eq!((node(inbox) | alias()).single(&store).unwrap(), target);
}

#[test]
fn attribute_root_cannot_be_aliased() {
    let (mut store, target) = setup();
    let attr_root = (node(target) | attr()).fetch_or_create_node(&mut store).unwrap();
    let inbox = (abs_root() | child().with("inbox"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    let before = store.len();

    let err = (node(inbox) | alias().with(attr_root))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Uncategorized);
    assert_eq!(store.len(), before);
    assert!(!(node(inbox) | attr()).exists(&store));

    let definition = (node(inbox) | tag().with("topic"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    assert_eq!(
        kgraph_core::abs_path(&store, definition).unwrap(),
        "/meta.tag.topic"
    );
}

#[test]
fn alias_with_ambiguous_heading_source_fails() {
    let (mut store, _) = setup();
    (abs_root() | child().with("other.rust"))
        .create(&mut store)
        .unwrap();

    let err = (abs_root() | child().with("inbox") | alias().with("rust"))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousPath);
}

#[test]
fn attr_create_is_idempotent_and_hidden_from_children() {
    let (mut store, target) = setup();
    let tether = node(target) | attr();

    let first = tether.fetch_or_create_node(&mut store).unwrap();
    let second = tether.fetch_or_create_node(&mut store).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.fetch_heading(first).unwrap(), "$");
    assert!((node(target) | child()).try_node_vec(&store).unwrap().is_empty());
    assert_eq!(tether.single(&store).unwrap(), first);
}

#[test]
fn tag_create_installs_definition_and_alias() {
    let (mut store, target) = setup();
    let tagging = node(target) | tag().with("lang.systems");

    let definition = tagging.fetch_or_create_node(&mut store).unwrap();
    assert_eq!(
        kgraph_core::abs_path(&store, definition).unwrap(),
        "/meta.tag.lang.systems"
    );
    assert_eq!(tagging.single(&store).unwrap(), definition);
    assert_eq!((node(target) | tag()).try_node_vec(&store).unwrap(), vec![definition]);

    // Tag paths are matched from the tag root, not as suffixes.
    assert!((node(target) | tag().with("systems"))
        .try_node_vec(&store)
        .unwrap()
        .is_empty());

    let before = store.len();
    tagging.create(&mut store).unwrap();
    assert_eq!(store.len(), before);
}

#[test]
fn tag_definition_is_shared_between_nodes() {
    let (mut store, target) = setup();
    let other = (abs_root() | child().with("notes.go"))
        .fetch_or_create_node(&mut store)
        .unwrap();

    let first = (node(target) | tag().with("lang"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    let second = (node(other) | tag().with("lang"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(store.fetch_aliases_to(first).unwrap().len(), 2);
}

#[test]
fn tag_by_id_must_point_under_tag_root() {
    let (mut store, target) = setup();
    let notes = (abs_root() | child().with("notes")).single(&store).unwrap();

    let err = (node(target) | tag().with(notes))
        .create(&mut store)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Uncategorized);

    let definition = (node(notes) | tag().with("topic"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    assert_eq!(
        (node(target) | tag().with(definition))
            .fetch_or_create_node(&mut store)
            .unwrap(),
        definition
    );
}
