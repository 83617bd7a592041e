use kgraph_core::view::act::{abs_path_of, fetch_title, single, to_node_vec};
use kgraph_core::view::{abs_root, child, desc, node, selected, Tether};
use kgraph_core::{ErrorKind, GraphStore, MemoryGraphStore};
use uuid::Uuid;

#[test]
fn single_distinguishes_absent_unique_and_ambiguous() {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    let a = store.create_child(root, "a", "A").unwrap();
    store.create_child(root, "b", "B").unwrap();

    assert_eq!((abs_root() | child().with("a")).single(&store).unwrap(), a);

    let missing = (abs_root() | child().with("zzz")).single(&store).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let ambiguous = (abs_root() | child()).single(&store).unwrap_err();
    assert_eq!(ambiguous.kind(), ErrorKind::AmbiguousPath);
    assert_eq!(ambiguous.breadcrumb("count"), Some("2"));
    assert!(ambiguous.breadcrumb("tether").is_some());
}

#[test]
fn actors_pipe_after_tethers() {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    let a = store.create_child(root, "a", "Alpha").unwrap();

    let tether = abs_root() | child().with("a");
    assert_eq!((&tether | single(&store)).unwrap(), a);
    assert_eq!((&tether | fetch_title(&store)).unwrap(), "Alpha");
    assert_eq!((&tether | abs_path_of(&store)).unwrap(), "/a");
    assert_eq!(tether | to_node_vec(&store), vec![a]);
}

#[test]
fn exists_is_false_for_empty_and_failing_walks() {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    store.create_child(root, "a", "").unwrap();

    assert!((abs_root() | child().with("a")).exists(&store));
    assert!(!(abs_root() | child().with("b")).exists(&store));
    assert!(!(node(Uuid::new_v4()) | child()).exists(&store));
}

#[test]
fn create_is_idempotent() {
    let mut store = MemoryGraphStore::new();
    let tether = abs_root() | child().with("projects.kgraph.notes");

    let first = tether.create(&mut store).unwrap();
    assert_eq!(store.len(), 4);
    let second = tether.create(&mut store).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.len(), 4);

    assert_eq!(tether.abs_path(&store).unwrap(), "/projects.kgraph.notes");
    assert_eq!(tether.fetch_heading(&store).unwrap(), "notes");
    assert_eq!(tether.fetch_title(&store).unwrap(), "notes");
}

#[test]
fn fetch_or_create_reuses_descendant_matches() {
    let mut store = MemoryGraphStore::new();
    let deep = (abs_root() | child().with("a.b.target"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    let before = store.len();

    let found = (abs_root() | desc().with("target"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    assert_eq!(found, deep);
    assert_eq!(store.len(), before);

    let fresh = (abs_root() | desc().with("b.other"))
        .fetch_or_create_node(&mut store)
        .unwrap();
    assert_eq!(
        kgraph_core::abs_path(&store, fresh).unwrap(),
        "/b.other"
    );
}

#[test]
fn create_without_heading_predicate_cannot_synthesize_nodes() {
    let mut store = MemoryGraphStore::new();
    let err = (abs_root() | child()).create(&mut store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Uncategorized);
    assert_eq!(store.len(), 1);
}

#[test]
fn update_body_targets_single_node() {
    let mut store = MemoryGraphStore::new();
    let tether = abs_root() | child().with("journal");
    tether.create(&mut store).unwrap();

    tether.update_body(&mut store, "first entry").unwrap();
    assert_eq!(tether.fetch_body(&store).unwrap(), "first entry");

    let missing = (abs_root() | child().with("nope"))
        .update_body(&mut store, "ignored")
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[test]
fn to_node_vec_swallows_errors_and_try_node_vec_propagates_them() {
    let store = MemoryGraphStore::new();
    let tether = node(Uuid::new_v4()) | child();

    assert!(tether.to_node_vec(&store).is_empty());
    let err = tether.try_node_vec(&store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn selected_anchor_uses_caller_supplied_node() {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    let a = store.create_child(root, "a", "").unwrap();
    let b = store.create_child(a, "b", "").unwrap();

    let tether = selected() | child().with("b");
    assert_eq!((&tether | single(&store).selected(a)).unwrap(), b);

    let err = tether.single(&store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn empty_tether_resolves_its_anchor() {
    let store = MemoryGraphStore::new();
    let root = store.root_node();
    assert_eq!(Tether::new(abs_root()).single(&store).unwrap(), root);
    assert_eq!(Tether::new(abs_root()).abs_path(&store).unwrap(), "/");
}
