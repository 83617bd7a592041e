//! Node domain model.
//!
//! # Responsibility
//! - Define the canonical node record read back from a `GraphStore`.
//! - Validate headings and dotted heading paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another node.
//! - Exactly one node (the root) has `parent == None`.
//! - An alias node never owns content: `heading`, `title` and `body` are
//!   read from `alias_source`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every node in the graph.
pub type NodeId = Uuid;

/// Reserved heading of a node's attribute root.
pub const ATTR_HEADING: &str = "$";
/// Heading given to the root when a store is created.
pub const ROOT_HEADING: &str = "root";
/// Path (from the root) of the global tag namespace.
pub const TAG_ROOT_PATH: &str = "meta.tag";
/// Heading of the attribute child that holds tag aliases.
pub const TAG_ATTR_HEADING: &str = "tag";

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid heading regex"));

/// Node read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable node id.
    pub id: NodeId,
    /// Structural parent. `None` only for the root.
    pub parent: Option<NodeId>,
    /// Programmatic name, delegated to the source for aliases.
    pub heading: String,
    /// Display string.
    pub title: String,
    /// Text payload.
    pub body: String,
    /// Canonical source when this node is an alias.
    pub alias_source: Option<NodeId>,
}

impl Node {
    /// Returns `true` when this node is an alias of another node.
    pub fn is_alias(&self) -> bool {
        self.alias_source.is_some()
    }

    /// Returns `true` when this node is an attribute root. Aliases never are.
    pub fn is_attr_root(&self) -> bool {
        self.heading == ATTR_HEADING && !self.is_alias()
    }
}

/// Returns `true` when `heading` is a single valid heading.
pub fn is_valid_heading(heading: &str) -> bool {
    HEADING_RE.is_match(heading)
}

/// Splits a dotted heading path (`a.b.c`) into its segments.
///
/// Returns `None` when the path is empty or any segment is invalid.
pub fn split_heading_path(path: &str) -> Option<Vec<&str>> {
    let segments = path.split('.').collect::<Vec<_>>();
    if segments.iter().all(|segment| is_valid_heading(segment)) {
        Some(segments)
    } else {
        None
    }
}
