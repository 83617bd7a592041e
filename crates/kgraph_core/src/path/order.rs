//! Canonical sibling-order reconstruction.
//!
//! # Responsibility
//! - Reorder an arbitrary node set into the depth-first pre-order the store
//!   would produce when walking children in persisted order.
//!
//! # Invariants
//! - Output is a permutation of the input.
//! - Duplicate input is `duplicate_node`.
//! - Input reaching a parentless node other than the store root is
//!   `uncategorized`; a parent cycle is `invalid_parent`.
//! - Ordering an already ordered set returns it unchanged.

use super::ancestry::fetch_upward_lineage;
use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use crate::store::GraphStore;
use std::collections::HashSet;

/// Orders `ids` by lineage: parents before children, siblings in store order.
pub fn order(store: &dyn GraphStore, ids: &[NodeId]) -> PathResult<Vec<NodeId>> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(PathError::duplicate_node("order input repeats a node")
                .with_breadcrumb("node", id));
        }
    }

    let lineages = ids
        .iter()
        .map(|id| fetch_upward_lineage(store, *id))
        .collect::<PathResult<Vec<_>>>()?;
    let common_root = store.root_node();
    if let Some(stray) = lineages.iter().find(|lineage| lineage[0] != common_root) {
        return Err(PathError::uncategorized("order input does not share one root")
            .with_breadcrumb("root", common_root)
            .with_breadcrumb("other_root", stray[0]));
    }

    let mut ordered = Vec::with_capacity(ids.len());
    let mut below_root = Vec::new();
    for lineage in &lineages {
        match lineage.as_slice() {
            [only] => ordered.push(*only),
            [_, rest @ ..] => below_root.push(rest),
            [] => {}
        }
    }
    place_under(store, common_root, below_root, &mut ordered)?;

    if ordered.len() != ids.len() {
        return Err(PathError::uncategorized(
            "order could not place every node under its parent",
        )
        .with_breadcrumb("expected", ids.len())
        .with_breadcrumb("placed", ordered.len()));
    }
    Ok(ordered)
}

/// Emits every lineage tail whose first element is a child of `parent`,
/// following the parent's persisted child order.
fn place_under(
    store: &dyn GraphStore,
    parent: NodeId,
    tails: Vec<&[NodeId]>,
    ordered: &mut Vec<NodeId>,
) -> PathResult<()> {
    if tails.is_empty() {
        return Ok(());
    }

    for child in store.fetch_children(parent)? {
        let mut deeper = Vec::new();
        for tail in tails.iter().copied().filter(|tail| tail[0] == child) {
            match tail {
                [only] => ordered.push(*only),
                [_, rest @ ..] => deeper.push(rest),
                [] => {}
            }
        }
        place_under(store, child, deeper, ordered)?;
    }
    Ok(())
}
