//! Ancestry walks.
//!
//! # Invariants
//! - Ancestry is returned root-first and never contains the queried node.
//! - An orphan or a parent cycle is `invalid_parent`, never a hang.

use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use crate::store::GraphStore;
use std::collections::HashSet;

/// Returns the strict ancestors of `node`, root first.
pub fn fetch_ancestry_ordered(store: &dyn GraphStore, node: NodeId) -> PathResult<Vec<NodeId>> {
    let mut ancestry = fetch_upward_lineage(store, node)?;
    if ancestry[0] != store.root_node() {
        return Err(PathError::invalid_parent("root is unreachable")
            .with_breadcrumb("node", node)
            .with_breadcrumb("top", ancestry[0]));
    }
    ancestry.pop();
    Ok(ancestry)
}

/// Walks parents from `node` up to the first parentless node.
///
/// Returns that node first and `node` last. Never empty.
pub(crate) fn fetch_upward_lineage(store: &dyn GraphStore, node: NodeId) -> PathResult<Vec<NodeId>> {
    let mut lineage = vec![node];
    let mut seen = HashSet::from([node]);
    let mut current = node;

    while let Some(parent) = store.fetch_parent(current)? {
        if !seen.insert(parent) {
            return Err(PathError::invalid_parent("parent cycle detected")
                .with_breadcrumb("node", node)
                .with_breadcrumb("parent", parent));
        }
        lineage.push(parent);
        current = parent;
    }

    lineage.reverse();
    Ok(lineage)
}

/// Returns the ancestry of `node` followed by `node` itself.
pub fn fetch_lineage(store: &dyn GraphStore, node: NodeId) -> PathResult<Vec<NodeId>> {
    let mut lineage = fetch_ancestry_ordered(store, node)?;
    lineage.push(node);
    Ok(lineage)
}

/// Returns `true` when `ancestor` is a strict ancestor of `node`.
pub fn is_ancestor(store: &dyn GraphStore, ancestor: NodeId, node: NodeId) -> PathResult<bool> {
    Ok(fetch_ancestry_ordered(store, node)?.contains(&ancestor))
}

/// Renders `node` as an absolute heading path (`/a.b.c`, root is `/`).
pub fn abs_path(store: &dyn GraphStore, node: NodeId) -> PathResult<String> {
    let lineage = fetch_lineage(store, node)?;
    let headings = lineage
        .iter()
        .skip(1)
        .map(|id| store.fetch_heading(*id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("/{}", headings.join(".")))
}

#[cfg(test)]
mod tests {
    use super::{abs_path, fetch_ancestry_ordered, is_ancestor};
    use crate::store::{GraphStore, MemoryGraphStore};

    #[test]
    fn ancestry_is_root_first_and_excludes_the_node() {
        let mut store = MemoryGraphStore::new();
        let root = store.root_node();
        let a = store.create_child(root, "a", "").unwrap();
        let b = store.create_child(a, "b", "").unwrap();

        assert_eq!(fetch_ancestry_ordered(&store, b).unwrap(), vec![root, a]);
        assert!(fetch_ancestry_ordered(&store, root).unwrap().is_empty());
        assert_eq!(abs_path(&store, b).unwrap(), "/a.b");
        assert_eq!(abs_path(&store, root).unwrap(), "/");
    }

    #[test]
    fn is_ancestor_is_strict_and_ignores_cousins() {
        let mut store = MemoryGraphStore::new();
        let root = store.root_node();
        let a = store.create_child(root, "a", "").unwrap();
        let b = store.create_child(a, "b", "").unwrap();
        let c = store.create_child(root, "c", "").unwrap();

        assert!(is_ancestor(&store, a, b).unwrap());
        assert!(!is_ancestor(&store, b, a).unwrap());
        assert!(!is_ancestor(&store, a, a).unwrap());
        assert!(!is_ancestor(&store, c, b).unwrap());
    }
}
