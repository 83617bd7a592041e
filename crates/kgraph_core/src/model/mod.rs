//! Graph domain model.
//!
//! # Responsibility
//! - Define the node record shared by every store implementation.
//! - Own heading syntax rules and reserved names.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId`.
//! - Headings are unique among the direct children of one parent.

pub mod node;
