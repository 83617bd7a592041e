//! Minimal disambiguating heading suffixes.
//!
//! # Responsibility
//! - Label each node of a set with the shortest dot-joined heading suffix
//!   that no other node in the set shares.
//!
//! # Invariants
//! - Chains are taken relative to the deepest common strict ancestor of the
//!   whole set, so a lone node is labelled with its own heading.
//! - Labels are pairwise distinct whenever the nodes are.

use super::ancestry::fetch_lineage;
use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use crate::store::GraphStore;
use std::collections::HashSet;

/// Returns `(node, label)` pairs in input order.
pub fn disambiguate(store: &dyn GraphStore, ids: &[NodeId]) -> PathResult<Vec<(NodeId, String)>> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(PathError::duplicate_node("disambiguation input repeats a node")
                .with_breadcrumb("node", id));
        }
    }

    let lineages = ids
        .iter()
        .map(|id| fetch_lineage(store, *id))
        .collect::<PathResult<Vec<_>>>()?;
    let prefix_len = common_strict_prefix_len(&lineages);

    let chains = lineages
        .iter()
        .map(|lineage| {
            lineage[prefix_len..]
                .iter()
                .map(|id| store.fetch_heading(*id))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids
        .iter()
        .zip(&chains)
        .enumerate()
        .map(|(index, (id, chain))| (*id, shortest_unique_suffix(index, &chains, chain)))
        .collect())
}

fn common_strict_prefix_len(lineages: &[Vec<NodeId>]) -> usize {
    let Some(first) = lineages.first() else {
        return 0;
    };
    let shortest = lineages.iter().map(Vec::len).min().unwrap_or(0);
    let mut len = 0;
    while len + 1 < shortest && lineages.iter().all(|lineage| lineage[len] == first[len]) {
        len += 1;
    }
    len
}

fn suffix(chain: &[String], k: usize) -> String {
    chain[chain.len().saturating_sub(k)..].join(".")
}

fn shortest_unique_suffix(index: usize, chains: &[Vec<String>], chain: &[String]) -> String {
    for k in 1..=chain.len() {
        let candidate = suffix(chain, k);
        let clashes = chains
            .iter()
            .enumerate()
            .any(|(other, other_chain)| other != index && suffix(other_chain, k) == candidate);
        if !clashes {
            return candidate;
        }
    }
    chain.join(".")
}
