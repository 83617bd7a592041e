//! Node-path query algebra.
//!
//! # Responsibility
//! - Compose anchors and links into tethers (`abs_root() | child().with("a")`).
//! - Evaluate tethers in fetch mode or resolve-or-create mode.
//! - Hand results to terminal actors.
//!
//! # Invariants
//! - Evaluation is synchronous and single-threaded; create mode holds the
//!   only mutable store borrow for the whole walk.
//! - There is no rollback: nodes created before a failing step remain.
//!
//! # See also
//! - `crate::path` for ancestry, ordering and disambiguation.

pub mod act;
pub mod context;
mod derive;
pub mod fetch_set;
pub mod link;
pub mod tether;
mod transform;

pub use act::Actor;
pub use context::{CreateContext, FetchContext};
pub use fetch_set::{FetchSet, LinkNode};
pub use link::{
    alias, all_of, ancestor, any_of, attr, child, desc, difference, disambiguate, exactly,
    intersect, left_lineal, none_of, order, parent, resolve, right_lineal, sibling, tag, union,
    DerivationLink, Link, Predicate, TransformationLink,
};
pub use tether::{abs_root, node, nodes, selected, Anchor, Chain, Tether};
