//! Insertion-ordered result sets.
//!
//! # Invariants
//! - A node id appears at most once; the first insertion wins its slot.
//! - Iteration order is insertion order until a transformation reorders it.

use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use std::collections::{HashMap, HashSet};

/// One resolved node, optionally labelled by a disambiguation step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkNode {
    pub id: NodeId,
    pub disambiguation: Option<String>,
}

impl LinkNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            disambiguation: None,
        }
    }
}

/// Working set threaded through a tether walk.
#[derive(Debug, Clone, Default)]
pub struct FetchSet {
    nodes: Vec<LinkNode>,
    index: HashSet<NodeId>,
}

impl PartialEq for FetchSet {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for FetchSet {}

impl FetchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id` at the end. Returns `false` when already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        self.insert_node(LinkNode::new(id))
    }

    /// Inserts a labelled node at the end. Returns `false` when already present.
    pub fn insert_node(&mut self, node: LinkNode) -> bool {
        if !self.index.insert(node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Appends every node of `other` not already present.
    pub fn extend(&mut self, other: FetchSet) {
        for node in other.nodes {
            self.insert_node(node);
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinkNode> {
        self.nodes.iter()
    }

    pub fn get(&self, id: NodeId) -> Option<&LinkNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Returns the ids in set order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    pub fn into_ids(self) -> Vec<NodeId> {
        self.nodes.into_iter().map(|node| node.id).collect()
    }

    /// Keeps the nodes matching `keep`, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&LinkNode) -> bool) {
        let index = &mut self.index;
        self.nodes.retain(|node| {
            let kept = keep(node);
            if !kept {
                index.remove(&node.id);
            }
            kept
        });
    }

    /// Attaches a disambiguation label. No-op when `id` is absent.
    pub fn set_disambiguation(&mut self, id: NodeId, label: impl Into<String>) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) {
            node.disambiguation = Some(label.into());
        }
    }

    /// Rebuilds the set in the order of `ids`, keeping labels.
    ///
    /// Ids missing from the set are skipped.
    pub fn reordered(self, ids: &[NodeId]) -> FetchSet {
        let mut by_id = self
            .nodes
            .into_iter()
            .map(|node| (node.id, node))
            .collect::<HashMap<_, _>>();
        ids.iter()
            .filter_map(|id| by_id.remove(id))
            .fold(FetchSet::new(), |mut set, node| {
                set.insert_node(node);
                set
            })
    }

    /// Requires exactly one node.
    pub fn single(&self) -> PathResult<NodeId> {
        match self.nodes.as_slice() {
            [only] => Ok(only.id),
            [] => Err(PathError::not_found("no node matched")),
            many => Err(PathError::ambiguous_path("more than one node matched")
                .with_breadcrumb("count", many.len())),
        }
    }
}

impl FromIterator<NodeId> for FetchSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = FetchSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a FetchSet {
    type Item = &'a LinkNode;
    type IntoIter = std::slice::Iter<'a, LinkNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl IntoIterator for FetchSet {
    type Item = LinkNode;
    type IntoIter = std::vec::IntoIter<LinkNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::FetchSet;
    use crate::error::ErrorKind;
    use uuid::Uuid;

    #[test]
    fn insert_is_unique_and_order_preserving() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut set = FetchSet::new();
        assert!(set.insert(b));
        assert!(set.insert(a));
        assert!(!set.insert(b));
        assert_eq!(set.ids(), vec![b, a]);
    }

    #[test]
    fn reordered_keeps_labels() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut set = [a, b].into_iter().collect::<FetchSet>();
        set.set_disambiguation(a, "x.a");
        let set = set.reordered(&[b, a]);
        assert_eq!(set.ids(), vec![b, a]);
        assert_eq!(set.get(a).and_then(|node| node.disambiguation.as_deref()), Some("x.a"));
    }

    #[test]
    fn retain_updates_membership() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut set = [a, b].into_iter().collect::<FetchSet>();
        set.retain(|node| node.id == b);
        assert!(!set.contains(a));
        assert!(set.insert(a));
        assert_eq!(set.ids(), vec![b, a]);
    }

    #[test]
    fn single_reports_cardinality() {
        let empty = FetchSet::new();
        assert_eq!(empty.single().unwrap_err().kind(), ErrorKind::NotFound);

        let pair = [Uuid::new_v4(), Uuid::new_v4()].into_iter().collect::<FetchSet>();
        assert_eq!(pair.single().unwrap_err().kind(), ErrorKind::AmbiguousPath);
    }
}
