use kgraph_core::view::act::disambiguation;
use kgraph_core::view::{abs_root, desc, disambiguate, order};
use kgraph_core::{ErrorKind, GraphStore, MemoryGraphStore, NodeId};

struct Graph {
    store: MemoryGraphStore,
    a: NodeId,
    c: NodeId,
    d: NodeId,
}

// root -> a -> x (c), root -> b -> x (d)
fn setup() -> Graph {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    let a = store.create_child(root, "a", "").unwrap();
    let b = store.create_child(root, "b", "").unwrap();
    let c = store.create_child(a, "x", "").unwrap();
    let d = store.create_child(b, "x", "").unwrap();
    Graph { store, a, c, d }
}

#[test]
fn shared_heading_is_ambiguous_until_disambiguated() {
    let graph = setup();
    let tether = abs_root() | desc().with("x");

    assert_eq!(tether.try_node_vec(&graph.store).unwrap(), vec![graph.c, graph.d]);
    let err = tether.single(&graph.store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousPath);

    let labels = tether.disambiguation(&graph.store).unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels[&graph.c], "a.x");
    assert_eq!(labels[&graph.d], "b.x");
}

#[test]
fn disambiguate_link_annotates_without_changing_membership() {
    let graph = setup();
    let tether = abs_root() | desc().with("x") | disambiguate() | order();

    let set = tether.to_fetch_set(&graph.store).unwrap();
    assert_eq!(set.ids(), vec![graph.c, graph.d]);
    assert_eq!(
        set.get(graph.c).and_then(|node| node.disambiguation.as_deref()),
        Some("a.x")
    );

    let labels = (&tether | disambiguation(&graph.store)).unwrap();
    assert_eq!(labels[&graph.d], "b.x");
}

#[test]
fn lone_node_is_labelled_with_its_heading() {
    let graph = setup();
    let labels = kgraph_core::disambiguate(&graph.store, &[graph.c]).unwrap();
    assert_eq!(labels, vec![(graph.c, "x".to_string())]);
}

#[test]
fn labels_grow_until_unique() {
    let mut graph = setup();
    let p1 = graph.store.create_child(graph.c, "p", "").unwrap();
    let p2 = graph.store.create_child(graph.d, "p", "").unwrap();
    let other = graph.store.create_child(graph.a, "p", "").unwrap();

    let labels = kgraph_core::disambiguate(&graph.store, &[p1, p2, other]).unwrap();
    assert_eq!(
        labels,
        vec![
            (p1, "a.x.p".to_string()),
            (p2, "b.x.p".to_string()),
            (other, "a.p".to_string()),
        ]
    );
}

#[test]
fn disambiguate_rejects_duplicates() {
    let graph = setup();
    let err = kgraph_core::disambiguate(&graph.store, &[graph.c, graph.c]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateNode);
}
