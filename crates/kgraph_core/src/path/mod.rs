//! Path algorithms over a `GraphStore`.
//!
//! # Responsibility
//! - Reconstruct ancestry and canonical sibling order for node sets.
//! - Compute minimal disambiguating heading suffixes.
//! - Parse raw textual heading paths into tethers.
//!
//! # Invariants
//! - Every function here is read-only against the store.

pub mod ancestry;
pub mod disambiguate;
pub mod order;
pub mod parser;

pub use ancestry::{abs_path, fetch_ancestry_ordered, fetch_lineage, is_ancestor};
pub use disambiguate::disambiguate;
pub use order::order;
pub use parser::{creation_tether, decide_path, lower, tokenize, Token};
