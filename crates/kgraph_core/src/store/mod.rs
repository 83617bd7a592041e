//! Graph storage contracts.
//!
//! # Responsibility
//! - Define the `GraphStore` seam every query evaluation runs against.
//! - Keep persistence details (memory maps, SQL) behind that seam.
//!
//! # Invariants
//! - Children are returned in persisted sibling order.
//! - Heading, title and body reads on an alias return the source's content.
//! - Aliases are leaves; `create_child` under an alias is rejected.
//! - `erase_node` removes exactly one childless, unreferenced node.
//!
//! # See also
//! - `crate::view` for the query algebra evaluated over this trait.

use crate::db::DbError;
use crate::model::node::{is_valid_heading, Node, NodeId, ATTR_HEADING};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryGraphStore;
pub use sqlite::SqliteGraphStore;

/// Result type used by graph store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from graph store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Target node does not exist.
    NodeNotFound(NodeId),
    /// A sibling with the same heading already exists.
    DuplicateHeading { parent: NodeId, heading: String },
    /// Heading does not match `[A-Za-z0-9_]+` and is not reserved.
    InvalidHeading(String),
    /// Alias install or alias-dependent mutation violates alias rules.
    InvalidAlias(String),
    /// The root cannot be erased or re-parented.
    RootImmutable,
    /// Erase target still owns children.
    NodeHasChildren(NodeId),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table or column is missing.
    MissingSchema(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::DuplicateHeading { parent, heading } => {
                write!(f, "heading `{heading}` already exists under {parent}")
            }
            Self::InvalidHeading(heading) => write!(f, "invalid heading `{heading}`"),
            Self::InvalidAlias(message) => write!(f, "invalid alias: {message}"),
            Self::RootImmutable => write!(f, "root node cannot be modified"),
            Self::NodeHasChildren(id) => write!(f, "node still has children: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "graph store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingSchema(what) => write!(f, "graph store requires {what}"),
            Self::InvalidData(message) => write!(f, "invalid graph data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage interface the query engine evaluates against.
pub trait GraphStore {
    /// Returns the root node id.
    fn root_node(&self) -> NodeId;
    /// Returns `true` when the node exists.
    fn exists(&self, id: NodeId) -> StoreResult<bool>;
    /// Loads one full node record.
    fn fetch_node(&self, id: NodeId) -> StoreResult<Node>;
    /// Returns the structural parent. `None` for the root.
    fn fetch_parent(&self, id: NodeId) -> StoreResult<Option<NodeId>>;
    /// Returns direct children in sibling order, aliases and attribute roots included.
    fn fetch_children(&self, id: NodeId) -> StoreResult<Vec<NodeId>>;
    /// Returns the heading, delegated for aliases.
    fn fetch_heading(&self, id: NodeId) -> StoreResult<String>;
    /// Returns the title, delegated for aliases.
    fn fetch_title(&self, id: NodeId) -> StoreResult<String>;
    /// Returns the body, delegated for aliases.
    fn fetch_body(&self, id: NodeId) -> StoreResult<String>;
    /// Replaces the title of the node (or of its alias source).
    fn update_title(&mut self, id: NodeId, title: &str) -> StoreResult<()>;
    /// Replaces the body of the node (or of its alias source).
    fn update_body(&mut self, id: NodeId, body: &str) -> StoreResult<()>;
    /// Appends a new child and returns its id.
    ///
    /// `heading` must be a valid heading or the reserved attribute heading.
    fn create_child(&mut self, parent: NodeId, heading: &str, title: &str)
        -> StoreResult<NodeId>;
    /// Removes one childless node that no alias points to.
    fn erase_node(&mut self, id: NodeId) -> StoreResult<()>;
    /// Returns `true` when the node is an alias.
    fn is_alias(&self, id: NodeId) -> StoreResult<bool>;
    /// Returns the alias source, or `None` for ordinary nodes.
    fn fetch_alias_source(&self, id: NodeId) -> StoreResult<Option<NodeId>>;
    /// Returns every alias whose source is `src`.
    fn fetch_aliases_to(&self, src: NodeId) -> StoreResult<Vec<NodeId>>;
    /// Appends an alias of `src` under `dst` and returns the alias id.
    fn install_alias(&mut self, src: NodeId, dst: NodeId) -> StoreResult<NodeId>;
}

/// Checks the structural alias rules shared by every store.
///
/// `ancestors_of_dst` must hold the strict ancestors of `dst`.
pub(crate) fn check_alias_install(
    root: NodeId,
    src: NodeId,
    dst: NodeId,
    src_heading: &str,
    src_is_alias: bool,
    ancestors_of_dst: &[NodeId],
) -> StoreResult<()> {
    if src == root {
        return Err(StoreError::InvalidAlias("root cannot be aliased".to_string()));
    }
    if src_heading == ATTR_HEADING {
        return Err(StoreError::InvalidAlias(format!(
            "attribute root {src} cannot be aliased"
        )));
    }
    if src == dst {
        return Err(StoreError::InvalidAlias(format!(
            "node {src} cannot alias itself"
        )));
    }
    if src_is_alias {
        return Err(StoreError::InvalidAlias(format!(
            "alias source {src} is itself an alias"
        )));
    }
    if ancestors_of_dst.contains(&src) {
        return Err(StoreError::InvalidAlias(format!(
            "aliasing ancestor {src} under {dst} would form a cycle"
        )));
    }
    Ok(())
}

pub(crate) fn check_child_heading(heading: &str) -> StoreResult<()> {
    if heading == ATTR_HEADING || is_valid_heading(heading) {
        Ok(())
    } else {
        Err(StoreError::InvalidHeading(heading.to_string()))
    }
}
