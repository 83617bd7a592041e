//! In-process graph store.
//!
//! # Responsibility
//! - Hold the node tree and alias edges in a `HashMap`.
//! - Serve as the reference `GraphStore` for engine tests and scratch graphs.
//!
//! # Invariants
//! - Each record's `children` list is the persisted sibling order.
//! - Alias heading uniqueness is checked against the source heading.

use super::{check_alias_install, check_child_heading, GraphStore, StoreError, StoreResult};
use crate::model::node::{Node, NodeId, ROOT_HEADING};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct NodeRecord {
    parent: Option<NodeId>,
    heading: String,
    title: String,
    body: String,
    alias_source: Option<NodeId>,
    children: Vec<NodeId>,
}

/// `HashMap`-backed graph store.
#[derive(Debug, Clone)]
pub struct MemoryGraphStore {
    root: NodeId,
    nodes: HashMap<NodeId, NodeRecord>,
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraphStore {
    /// Creates a store holding only the root node.
    pub fn new() -> Self {
        let root = Uuid::new_v4();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeRecord {
                parent: None,
                heading: ROOT_HEADING.to_string(),
                title: ROOT_HEADING.to_string(),
                body: String::new(),
                alias_source: None,
                children: Vec::new(),
            },
        );
        Self { root, nodes }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root cannot be erased.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn record(&self, id: NodeId) -> StoreResult<&NodeRecord> {
        self.nodes.get(&id).ok_or(StoreError::NodeNotFound(id))
    }

    fn record_mut(&mut self, id: NodeId) -> StoreResult<&mut NodeRecord> {
        self.nodes.get_mut(&id).ok_or(StoreError::NodeNotFound(id))
    }

    /// Follows an alias to the record that owns content.
    fn content_record(&self, id: NodeId) -> StoreResult<&NodeRecord> {
        let record = self.record(id)?;
        match record.alias_source {
            Some(src) => self.record(src),
            None => Ok(record),
        }
    }

    fn content_id(&self, id: NodeId) -> StoreResult<NodeId> {
        Ok(self.record(id)?.alias_source.unwrap_or(id))
    }

    fn strict_ancestors(&self, id: NodeId) -> StoreResult<Vec<NodeId>> {
        let mut ancestors = Vec::new();
        let mut current = self.record(id)?.parent;
        while let Some(parent) = current {
            if ancestors.contains(&parent) {
                return Err(StoreError::InvalidData(format!(
                    "parent cycle detected at {parent}"
                )));
            }
            ancestors.push(parent);
            current = self.record(parent)?.parent;
        }
        Ok(ancestors)
    }

    fn ensure_heading_free(&self, parent: NodeId, heading: &str) -> StoreResult<()> {
        for child in &self.record(parent)?.children {
            if self.content_record(*child)?.heading == heading {
                return Err(StoreError::DuplicateHeading {
                    parent,
                    heading: heading.to_string(),
                });
            }
        }
        Ok(())
    }

    fn ensure_can_own_children(&self, parent: NodeId) -> StoreResult<()> {
        if self.record(parent)?.alias_source.is_some() {
            return Err(StoreError::InvalidAlias(format!(
                "alias {parent} cannot own children"
            )));
        }
        Ok(())
    }
}

impl GraphStore for MemoryGraphStore {
    fn root_node(&self) -> NodeId {
        self.root
    }

    fn exists(&self, id: NodeId) -> StoreResult<bool> {
        Ok(self.nodes.contains_key(&id))
    }

    fn fetch_node(&self, id: NodeId) -> StoreResult<Node> {
        let record = self.record(id)?;
        let content = self.content_record(id)?;
        Ok(Node {
            id,
            parent: record.parent,
            heading: content.heading.clone(),
            title: content.title.clone(),
            body: content.body.clone(),
            alias_source: record.alias_source,
        })
    }

    fn fetch_parent(&self, id: NodeId) -> StoreResult<Option<NodeId>> {
        Ok(self.record(id)?.parent)
    }

    fn fetch_children(&self, id: NodeId) -> StoreResult<Vec<NodeId>> {
        Ok(self.record(id)?.children.clone())
    }

    fn fetch_heading(&self, id: NodeId) -> StoreResult<String> {
        Ok(self.content_record(id)?.heading.clone())
    }

    fn fetch_title(&self, id: NodeId) -> StoreResult<String> {
        Ok(self.content_record(id)?.title.clone())
    }

    fn fetch_body(&self, id: NodeId) -> StoreResult<String> {
        Ok(self.content_record(id)?.body.clone())
    }

    fn update_title(&mut self, id: NodeId, title: &str) -> StoreResult<()> {
        let target = self.content_id(id)?;
        self.record_mut(target)?.title = title.to_string();
        Ok(())
    }

    fn update_body(&mut self, id: NodeId, body: &str) -> StoreResult<()> {
        let target = self.content_id(id)?;
        self.record_mut(target)?.body = body.to_string();
        Ok(())
    }

    fn create_child(
        &mut self,
        parent: NodeId,
        heading: &str,
        title: &str,
    ) -> StoreResult<NodeId> {
        check_child_heading(heading)?;
        self.ensure_can_own_children(parent)?;
        self.ensure_heading_free(parent, heading)?;

        let id = Uuid::new_v4();
        self.nodes.insert(
            id,
            NodeRecord {
                parent: Some(parent),
                heading: heading.to_string(),
                title: title.to_string(),
                body: String::new(),
                alias_source: None,
                children: Vec::new(),
            },
        );
        self.record_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn erase_node(&mut self, id: NodeId) -> StoreResult<()> {
        if id == self.root {
            return Err(StoreError::RootImmutable);
        }
        let record = self.record(id)?;
        if !record.children.is_empty() {
            return Err(StoreError::NodeHasChildren(id));
        }
        if !self.fetch_aliases_to(id)?.is_empty() {
            return Err(StoreError::InvalidAlias(format!(
                "node {id} is still referenced by aliases"
            )));
        }
        let parent = record.parent;
        self.nodes.remove(&id);
        if let Some(parent) = parent {
            self.record_mut(parent)?.children.retain(|child| *child != id);
        }
        Ok(())
    }

    fn is_alias(&self, id: NodeId) -> StoreResult<bool> {
        Ok(self.record(id)?.alias_source.is_some())
    }

    fn fetch_alias_source(&self, id: NodeId) -> StoreResult<Option<NodeId>> {
        Ok(self.record(id)?.alias_source)
    }

    fn fetch_aliases_to(&self, src: NodeId) -> StoreResult<Vec<NodeId>> {
        self.record(src)?;
        let mut aliases = self
            .nodes
            .iter()
            .filter(|(_, record)| record.alias_source == Some(src))
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        aliases.sort();
        Ok(aliases)
    }

    fn install_alias(&mut self, src: NodeId, dst: NodeId) -> StoreResult<NodeId> {
        let src_is_alias = self.record(src)?.alias_source.is_some();
        let heading = self.record(src)?.heading.clone();
        self.ensure_can_own_children(dst)?;
        let ancestors = self.strict_ancestors(dst)?;
        check_alias_install(self.root, src, dst, &heading, src_is_alias, &ancestors)?;
        self.ensure_heading_free(dst, &heading)?;

        let id = Uuid::new_v4();
        self.nodes.insert(
            id,
            NodeRecord {
                parent: Some(dst),
                heading,
                title: String::new(),
                body: String::new(),
                alias_source: Some(src),
                children: Vec::new(),
            },
        );
        self.record_mut(dst)?.children.push(id);
        Ok(id)
    }
}
