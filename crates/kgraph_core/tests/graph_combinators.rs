use kgraph_core::view::{
    abs_root, all_of, ancestor, any_of, attr, child, desc, difference, exactly, intersect,
    left_lineal, node, none_of, parent, right_lineal, sibling, union, Link,
};
use kgraph_core::{ErrorKind, GraphStore, MemoryGraphStore, NodeId};

struct Graph {
    store: MemoryGraphStore,
    root: NodeId,
    a: NodeId,
    b: NodeId,
    ax: NodeId,
    ay: NodeId,
    bx: NodeId,
}

// root -> a -> {x, y, $}, root -> b -> {x}
fn setup() -> Graph {
    let mut store = MemoryGraphStore::new();
    let root = store.root_node();
    let a = store.create_child(root, "a", "").unwrap();
    let b = store.create_child(root, "b", "").unwrap();
    let ax = store.create_child(a, "x", "").unwrap();
    let ay = store.create_child(a, "y", "").unwrap();
    let bx = store.create_child(b, "x", "").unwrap();
    (node(a) | attr()).create(&mut store).unwrap();
    Graph {
        store,
        root,
        a,
        b,
        ax,
        ay,
        bx,
    }
}

#[test]
fn any_of_unions_in_link_order() {
    let graph = setup();
    let tether = node(graph.a) | any_of([child().with("y"), child().with("x")]);
    assert_eq!(tether.try_node_vec(&graph.store).unwrap(), vec![graph.ay, graph.ax]);
}

#[test]
fn all_of_requires_every_link_to_match() {
    let graph = setup();
    let both = all_of([child().with("x"), child().with("y")]);

    assert_eq!(
        (node(graph.a) | both.clone()).try_node_vec(&graph.store).unwrap(),
        vec![graph.ax, graph.ay]
    );
    assert!((node(graph.b) | both).try_node_vec(&graph.store).unwrap().is_empty());
}

#[test]
fn none_of_subtracts_predicated_links() {
    let graph = setup();
    let tether = node(graph.a) | none_of([child(), child().with("x")]);
    assert_eq!(tether.try_node_vec(&graph.store).unwrap(), vec![graph.ay]);
}

#[test]
fn exactly_matches_only_complete_sets() {
    let mut graph = setup();
    let exact = exactly([child().with("x"), child().with("y"), child()]);

    assert_eq!(
        (node(graph.a) | exact.clone()).try_node_vec(&graph.store).unwrap(),
        vec![graph.ax, graph.ay]
    );
    assert!((node(graph.b) | exact.clone())
        .try_node_vec(&graph.store)
        .unwrap()
        .is_empty());

    graph.store.create_child(graph.a, "z", "").unwrap();
    assert!((node(graph.a) | exact).try_node_vec(&graph.store).unwrap().is_empty());
}

#[test]
fn exactly_compares_against_the_predicate_free_links() {
    let graph = setup();
    let exact = exactly([child().with("x"), child().with("y")]);

    assert_eq!(
        (node(graph.a) | exact.clone()).try_node_vec(&graph.store).unwrap(),
        vec![graph.ax, graph.ay]
    );
    assert!((node(graph.a) | exactly([child().with("x")]))
        .try_node_vec(&graph.store)
        .unwrap()
        .is_empty());
}

#[test]
fn only_all_of_can_create() {
    let mut graph = setup();
    let created = (abs_root() | all_of([child().with("c1"), child().with("c2")]))
        .create(&mut graph.store)
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(
        kgraph_core::abs_path(&graph.store, created[1]).unwrap(),
        "/c2"
    );

    let err = (abs_root() | any_of([child().with("c3")]))
        .create(&mut graph.store)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Uncategorized);
}

#[test]
fn set_transformations_use_nested_tethers() {
    let graph = setup();
    let xs = abs_root() | desc().with("x");

    let unioned = node(graph.a) | child() | union(abs_root() | child().with("b"));
    assert_eq!(
        unioned.try_node_vec(&graph.store).unwrap(),
        vec![graph.ax, graph.ay, graph.b]
    );
    assert_eq!(
        (&xs | intersect(node(graph.a) | child()))
            .try_node_vec(&graph.store)
            .unwrap(),
        vec![graph.ax]
    );
    assert_eq!(
        (&xs | difference(node(graph.a) | child()))
            .try_node_vec(&graph.store)
            .unwrap(),
        vec![graph.bx]
    );
}

#[test]
fn navigation_links_walk_the_tree() {
    let graph = setup();
    let from_ax = |link: Link| (node(graph.ax) | link).try_node_vec(&graph.store).unwrap();

    assert_eq!(from_ax(parent()), vec![graph.a]);
    assert_eq!(from_ax(sibling()), vec![graph.ay]);
    assert_eq!(from_ax(ancestor()), vec![graph.a, graph.root]);
    assert_eq!(from_ax(ancestor().with("a")), vec![graph.a]);
    assert_eq!(from_ax(left_lineal()), vec![graph.root, graph.a, graph.ax]);
    assert_eq!(
        (node(graph.a) | right_lineal()).try_node_vec(&graph.store).unwrap(),
        vec![graph.a, graph.ax, graph.ay]
    );
    assert!((abs_root() | parent()).try_node_vec(&graph.store).unwrap().is_empty());
}

#[test]
fn chain_and_tether_predicates_filter_candidates() {
    let graph = setup();

    let with_y = abs_root() | child().with(child().with("y"));
    assert_eq!(with_y.try_node_vec(&graph.store).unwrap(), vec![graph.a]);

    let under_a = abs_root() | desc().with(node(graph.a) | child());
    assert_eq!(
        under_a.try_node_vec(&graph.store).unwrap(),
        vec![graph.ax, graph.ay]
    );

    let by_id = abs_root() | desc().with(graph.bx);
    assert_eq!(by_id.single(&graph.store).unwrap(), graph.bx);
}

#[test]
fn desc_heading_paths_match_trailing_segments() {
    let graph = setup();
    assert_eq!(
        (abs_root() | desc().with("b.x")).single(&graph.store).unwrap(),
        graph.bx
    );
    assert!((node(graph.a) | desc().with("a.x"))
        .try_node_vec(&graph.store)
        .unwrap()
        .is_empty());
}

#[test]
fn links_render_their_predicates() {
    assert_eq!(child().with("a").to_string(), "child('a')");
    assert_eq!(
        (abs_root() | any_of([child().with("a"), desc()])).to_string(),
        "abs_root | any_of[child('a'), desc]"
    );
}
