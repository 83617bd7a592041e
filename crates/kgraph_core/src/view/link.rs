//! Query steps.
//!
//! # Responsibility
//! - Define the closed set of link variants and their predicates.
//! - Provide the nullary constructors (`child()`, `desc()`, ...) and the
//!   `.with(predicate)` builder used to compose tethers.
//!
//! # Invariants
//! - Links are plain values: cloning is cheap relative to evaluation and
//!   the derived `Ord` is the canonical comparison.
//! - Only the navigation and content links accept a predicate; `attr`,
//!   combinators and transformations ignore `.with`.

use super::tether::{Chain, Tether};
use crate::model::node::NodeId;
use log::warn;
use std::fmt::{Display, Formatter};

/// Candidate filter attached to a derivation link.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    /// Heading equals the value; dotted values name a heading path.
    Heading(String),
    /// Candidate is this exact node.
    Id(NodeId),
    /// Applying the chain to the candidate yields at least one node.
    Chain(Chain),
    /// Candidate is in the tether's result.
    Tether(Tether),
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        Self::Heading(value.to_string())
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        Self::Heading(value)
    }
}

impl From<NodeId> for Predicate {
    fn from(value: NodeId) -> Self {
        Self::Id(value)
    }
}

impl From<Chain> for Predicate {
    fn from(value: Chain) -> Self {
        Self::Chain(value)
    }
}

impl From<Link> for Predicate {
    fn from(value: Link) -> Self {
        Self::Chain(Chain::from(value))
    }
}

impl From<Tether> for Predicate {
    fn from(value: Tether) -> Self {
        Self::Tether(value)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Heading(heading) => write!(f, "'{heading}'"),
            Self::Id(id) => write!(f, "{id}"),
            Self::Chain(chain) => write!(f, "[{chain}]"),
            Self::Tether(tether) => write!(f, "[{tether}]"),
        }
    }
}

/// Node-wise query step: applied to every node of the working set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivationLink {
    Child(Option<Predicate>),
    Desc(Option<Predicate>),
    Parent(Option<Predicate>),
    Ancestor(Option<Predicate>),
    Sibling(Option<Predicate>),
    LeftLineal(Option<Predicate>),
    RightLineal(Option<Predicate>),
    Alias(Option<Predicate>),
    Resolve(Option<Predicate>),
    Tag(Option<Predicate>),
    Attr,
    AnyOf(Vec<Link>),
    AllOf(Vec<Link>),
    NoneOf(Vec<Link>),
    Exactly(Vec<Link>),
}

impl DerivationLink {
    fn name(&self) -> &'static str {
        match self {
            Self::Child(_) => "child",
            Self::Desc(_) => "desc",
            Self::Parent(_) => "parent",
            Self::Ancestor(_) => "ancestor",
            Self::Sibling(_) => "sibling",
            Self::LeftLineal(_) => "left_lineal",
            Self::RightLineal(_) => "right_lineal",
            Self::Alias(_) => "alias",
            Self::Resolve(_) => "resolve",
            Self::Tag(_) => "tag",
            Self::Attr => "attr",
            Self::AnyOf(_) => "any_of",
            Self::AllOf(_) => "all_of",
            Self::NoneOf(_) => "none_of",
            Self::Exactly(_) => "exactly",
        }
    }

    fn predicate_slot(&mut self) -> Option<&mut Option<Predicate>> {
        match self {
            Self::Child(pred)
            | Self::Desc(pred)
            | Self::Parent(pred)
            | Self::Ancestor(pred)
            | Self::Sibling(pred)
            | Self::LeftLineal(pred)
            | Self::RightLineal(pred)
            | Self::Alias(pred)
            | Self::Resolve(pred)
            | Self::Tag(pred) => Some(pred),
            Self::Attr | Self::AnyOf(_) | Self::AllOf(_) | Self::NoneOf(_) | Self::Exactly(_) => {
                None
            }
        }
    }

    /// Returns the attached predicate, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Self::Child(pred)
            | Self::Desc(pred)
            | Self::Parent(pred)
            | Self::Ancestor(pred)
            | Self::Sibling(pred)
            | Self::LeftLineal(pred)
            | Self::RightLineal(pred)
            | Self::Alias(pred)
            | Self::Resolve(pred)
            | Self::Tag(pred) => pred.as_ref(),
            _ => None,
        }
    }

    fn sublinks(&self) -> Option<&[Link]> {
        match self {
            Self::AnyOf(links) | Self::AllOf(links) | Self::NoneOf(links) | Self::Exactly(links) => {
                Some(links)
            }
            _ => None,
        }
    }
}

impl Display for DerivationLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())?;
        if let Some(links) = self.sublinks() {
            let parts = links.iter().map(ToString::to_string).collect::<Vec<_>>();
            return write!(f, "[{}]", parts.join(", "));
        }
        if let Some(pred) = self.predicate() {
            write!(f, "({pred})")?;
        }
        Ok(())
    }
}

/// Whole-set query step: applied once to the working set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformationLink {
    /// Canonical sibling order.
    Order,
    /// Attach minimal disambiguating labels.
    Disambiguate,
    /// Append the tether's result.
    Union(Tether),
    /// Keep nodes also in the tether's result.
    Intersect(Tether),
    /// Drop nodes found in the tether's result.
    Difference(Tether),
}

impl Display for TransformationLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => f.write_str("order"),
            Self::Disambiguate => f.write_str("disambiguate"),
            Self::Union(tether) => write!(f, "union[{tether}]"),
            Self::Intersect(tether) => write!(f, "intersect[{tether}]"),
            Self::Difference(tether) => write!(f, "difference[{tether}]"),
        }
    }
}

/// One polymorphic query step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Link {
    Derivation(DerivationLink),
    Transformation(TransformationLink),
}

impl Link {
    /// Attaches `pred`, replacing any previous predicate.
    ///
    /// Links that take no predicate are returned unchanged.
    pub fn with(mut self, pred: impl Into<Predicate>) -> Link {
        let slot = match &mut self {
            Link::Derivation(derivation) => derivation.predicate_slot(),
            Link::Transformation(_) => None,
        };
        match slot {
            Some(slot) => *slot = Some(pred.into()),
            None => warn!("event=link_predicate module=view status=ignored link={self}"),
        }
        self
    }

    /// Returns the same link without its predicate.
    pub fn unpredicated(&self) -> Link {
        let mut link = self.clone();
        if let Link::Derivation(derivation) = &mut link {
            if let Some(slot) = derivation.predicate_slot() {
                *slot = None;
            }
        }
        link
    }

    /// Returns `true` when the link narrows its candidates.
    ///
    /// Combinators count as predicated; `attr` and transformations do not.
    pub fn is_predicated(&self) -> bool {
        match self {
            Link::Derivation(derivation) => {
                derivation.predicate().is_some() || derivation.sublinks().is_some()
            }
            Link::Transformation(_) => false,
        }
    }

    /// Canonical ordering used when links are collected into sets.
    pub fn compare_less(&self, other: &Link) -> bool {
        self < other
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Link::Derivation(derivation) => Display::fmt(derivation, f),
            Link::Transformation(transformation) => Display::fmt(transformation, f),
        }
    }
}

impl From<DerivationLink> for Link {
    fn from(value: DerivationLink) -> Self {
        Link::Derivation(value)
    }
}

impl From<TransformationLink> for Link {
    fn from(value: TransformationLink) -> Self {
        Link::Transformation(value)
    }
}

pub fn child() -> Link {
    DerivationLink::Child(None).into()
}

pub fn desc() -> Link {
    DerivationLink::Desc(None).into()
}

pub fn parent() -> Link {
    DerivationLink::Parent(None).into()
}

pub fn ancestor() -> Link {
    DerivationLink::Ancestor(None).into()
}

pub fn sibling() -> Link {
    DerivationLink::Sibling(None).into()
}

/// Lineage from the root down to the node, inclusive.
pub fn left_lineal() -> Link {
    DerivationLink::LeftLineal(None).into()
}

/// The node and all of its descendants.
pub fn right_lineal() -> Link {
    DerivationLink::RightLineal(None).into()
}

pub fn alias() -> Link {
    DerivationLink::Alias(None).into()
}

/// Maps an alias to its source; other nodes map to themselves.
pub fn resolve() -> Link {
    DerivationLink::Resolve(None).into()
}

pub fn tag() -> Link {
    DerivationLink::Tag(None).into()
}

pub fn attr() -> Link {
    DerivationLink::Attr.into()
}

pub fn any_of(links: impl IntoIterator<Item = Link>) -> Link {
    DerivationLink::AnyOf(links.into_iter().collect()).into()
}

pub fn all_of(links: impl IntoIterator<Item = Link>) -> Link {
    DerivationLink::AllOf(links.into_iter().collect()).into()
}

pub fn none_of(links: impl IntoIterator<Item = Link>) -> Link {
    DerivationLink::NoneOf(links.into_iter().collect()).into()
}

pub fn exactly(links: impl IntoIterator<Item = Link>) -> Link {
    DerivationLink::Exactly(links.into_iter().collect()).into()
}

pub fn order() -> Link {
    TransformationLink::Order.into()
}

pub fn disambiguate() -> Link {
    TransformationLink::Disambiguate.into()
}

pub fn union(tether: Tether) -> Link {
    TransformationLink::Union(tether).into()
}

pub fn intersect(tether: Tether) -> Link {
    TransformationLink::Intersect(tether).into()
}

pub fn difference(tether: Tether) -> Link {
    TransformationLink::Difference(tether).into()
}

#[cfg(test)]
mod tests {
    use super::{all_of, attr, child, desc, order, Predicate};
    use uuid::Uuid;

    #[test]
    fn with_sets_predicate_and_unpredicated_clears_it() {
        let link = child().with("a");
        assert_eq!(link.to_string(), "child('a')");
        assert!(link.is_predicated());
        assert_eq!(link.unpredicated(), child());
        assert!(!child().is_predicated());
    }

    #[test]
    fn with_is_ignored_by_non_predicable_links() {
        assert_eq!(attr().with("x"), attr());
        assert_eq!(order().with("x"), order());
    }

    #[test]
    fn display_nests_chains_and_combinators() {
        let link = desc().with(child().with("b") | attr());
        assert_eq!(link.to_string(), "desc([child('b') | attr])");
        let combined = all_of([child().with("a"), desc()]);
        assert_eq!(combined.to_string(), "all_of[child('a'), desc]");
    }

    #[test]
    fn compare_less_is_a_strict_order() {
        let id = Uuid::new_v4();
        let a = child().with(Predicate::Id(id));
        let b = desc();
        assert!(a.compare_less(&b) ^ b.compare_less(&a));
        assert!(!a.compare_less(&a));
    }
}
