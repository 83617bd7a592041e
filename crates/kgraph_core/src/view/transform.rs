//! Whole-set link evaluation.
//!
//! # Invariants
//! - `order` and `disambiguate` never change set membership.
//! - Create mode passes the working set through untouched.

use super::context::{CreateContext, FetchContext};
use super::fetch_set::FetchSet;
use super::link::TransformationLink;
use crate::error::PathResult;
use crate::path::{disambiguate, order};

impl TransformationLink {
    /// Applies this step to the whole working set.
    pub fn fetch(&self, ctx: &FetchContext<'_>, input: FetchSet) -> PathResult<FetchSet> {
        match self {
            Self::Order => {
                let ordered = order(ctx.store(), &input.ids())?;
                Ok(input.reordered(&ordered))
            }
            Self::Disambiguate => {
                let labels = disambiguate(ctx.store(), &input.ids())?;
                let mut out = input;
                for (id, label) in labels {
                    out.set_disambiguation(id, label);
                }
                Ok(out)
            }
            Self::Union(tether) => {
                let mut out = input;
                out.extend(tether.fetch_nested(ctx)?);
                Ok(out)
            }
            Self::Intersect(tether) => {
                let other = tether.fetch_nested(ctx)?;
                let mut out = input;
                out.retain(|node| other.contains(node.id));
                Ok(out)
            }
            Self::Difference(tether) => {
                let other = tether.fetch_nested(ctx)?;
                let mut out = input;
                out.retain(|node| !other.contains(node.id));
                Ok(out)
            }
        }
    }

    /// No-op in create mode.
    pub fn create(&self, _ctx: &mut CreateContext<'_>, input: FetchSet) -> PathResult<FetchSet> {
        Ok(input)
    }
}
