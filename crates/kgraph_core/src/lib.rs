//! Core of the kgraph knowledge-graph editor.
//!
//! This crate owns the node-path query engine: a composable algebra of
//! links evaluated against a `GraphStore`, plus the store implementations
//! and the path algorithms the engine relies on.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod path;
pub mod store;
pub mod view;

pub use error::{ErrorKind, PathError, PathResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{Node, NodeId};
pub use path::{abs_path, decide_path, disambiguate, fetch_ancestry_ordered, order};
pub use store::{GraphStore, MemoryGraphStore, SqliteGraphStore, StoreError, StoreResult};
pub use view::{Actor, Anchor, Chain, FetchSet, Link, LinkNode, Predicate, Tether};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
