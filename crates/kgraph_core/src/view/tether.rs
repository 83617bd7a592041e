//! Anchored link chains and their evaluation walks.
//!
//! # Responsibility
//! - Define `Anchor`, `Chain` and `Tether` and the `|` composition rules.
//! - Walk a link chain in fetch mode or create mode.
//!
//! # Invariants
//! - Tethers and chains are immutable; composition returns a new value.
//! - Derivation links are applied per node and unioned in insertion order;
//!   transformation links see the whole working set once.
//! - An empty intermediate set is not an error.

use super::context::{CreateContext, FetchContext};
use super::fetch_set::FetchSet;
use super::link::Link;
use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use crate::store::GraphStore;
use log::debug;
use std::fmt::{Display, Formatter};
use std::ops::BitOr;
use std::time::Instant;

/// Starting point of a tether.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Anchor {
    /// The store root.
    AbsRoot,
    /// One given node.
    Node(NodeId),
    /// A seed set, deduplicated in order.
    Nodes(Vec<NodeId>),
    /// The caller-supplied selected node.
    Selected,
}

impl Display for Anchor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AbsRoot => f.write_str("abs_root"),
            Self::Node(id) => write!(f, "node({id})"),
            Self::Nodes(ids) => write!(f, "nodes({})", ids.len()),
            Self::Selected => f.write_str("selected"),
        }
    }
}

pub fn abs_root() -> Anchor {
    Anchor::AbsRoot
}

pub fn node(id: NodeId) -> Anchor {
    Anchor::Node(id)
}

pub fn nodes(ids: impl IntoIterator<Item = NodeId>) -> Anchor {
    Anchor::Nodes(ids.into_iter().collect())
}

pub fn selected() -> Anchor {
    Anchor::Selected
}

/// Anchorless link sequence, used as a nested predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chain {
    links: Vec<Link>,
}

impl Chain {
    pub fn links(&self) -> &[Link] {
        &self.links
    }
}

impl From<Link> for Chain {
    fn from(value: Link) -> Self {
        Self { links: vec![value] }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts = self.links.iter().map(ToString::to_string).collect::<Vec<_>>();
        f.write_str(&parts.join(" | "))
    }
}

/// Compiled query: an anchor followed by links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tether {
    anchor: Anchor,
    links: Vec<Link>,
}

impl Tether {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            links: Vec::new(),
        }
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns a copy of this tether with `link` appended.
    pub fn then(&self, link: Link) -> Tether {
        let mut next = self.clone();
        next.links.push(link);
        next
    }

    /// Walks the chain read-only.
    pub fn evaluate_fetch(
        &self,
        store: &dyn GraphStore,
        selected: Option<NodeId>,
    ) -> PathResult<FetchSet> {
        let ctx = FetchContext::new(store).with_selected(selected);
        let started_at = Instant::now();
        let result = seed(&self.anchor, &ctx).and_then(|set| walk_fetch(&ctx, set, &self.links));
        log_walk("tether_fetch", self, &result, started_at);
        result.map_err(|err| err.with_breadcrumb("tether", self))
    }

    /// Walks the chain in resolve-or-create mode.
    ///
    /// Nodes created before a failing step are kept.
    pub fn evaluate_create(
        &self,
        store: &mut dyn GraphStore,
        selected: Option<NodeId>,
    ) -> PathResult<FetchSet> {
        let mut ctx = CreateContext::new(store).with_selected(selected);
        let started_at = Instant::now();
        let seeded = seed(&self.anchor, &ctx.as_fetch());
        let result = seeded.and_then(|set| walk_create(&mut ctx, set, &self.links));
        log_walk("tether_create", self, &result, started_at);
        result.map_err(|err| err.with_breadcrumb("tether", self))
    }

    /// Evaluates this tether as a nested query inside another evaluation.
    pub(crate) fn fetch_nested(&self, outer: &FetchContext<'_>) -> PathResult<FetchSet> {
        let ctx = FetchContext::new(outer.store()).with_selected(outer.selected());
        let set = seed(&self.anchor, &ctx)?;
        walk_fetch(&ctx, set, &self.links)
    }
}

impl Display for Tether {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.anchor)?;
        for link in &self.links {
            write!(f, " | {link}")?;
        }
        Ok(())
    }
}

fn log_walk(event: &str, tether: &Tether, result: &PathResult<FetchSet>, started_at: Instant) {
    match result {
        Ok(set) => debug!(
            "event={event} module=view status=ok count={} duration_us={} tether={tether}",
            set.len(),
            started_at.elapsed().as_micros()
        ),
        Err(err) => debug!(
            "event={event} module=view status=error error_code={} duration_us={} tether={tether}",
            err.kind(),
            started_at.elapsed().as_micros()
        ),
    }
}

pub(crate) fn seed(anchor: &Anchor, ctx: &FetchContext<'_>) -> PathResult<FetchSet> {
    let store = ctx.store();
    let ids = match anchor {
        Anchor::AbsRoot => vec![store.root_node()],
        Anchor::Node(id) => vec![*id],
        Anchor::Nodes(ids) => ids.clone(),
        Anchor::Selected => vec![ctx
            .selected()
            .ok_or_else(|| PathError::not_found("no node is selected"))?],
    };
    for id in &ids {
        if !store.exists(*id)? {
            return Err(PathError::not_found("anchor node does not exist").with_breadcrumb("node", id));
        }
    }
    Ok(ids.into_iter().collect())
}

pub(crate) fn walk_fetch(
    ctx: &FetchContext<'_>,
    seed: FetchSet,
    links: &[Link],
) -> PathResult<FetchSet> {
    let mut working = seed;
    for link in links {
        working = match link {
            Link::Derivation(derivation) => {
                let mut next = FetchSet::new();
                for id in working.ids() {
                    let found = derivation.fetch(ctx, id).map_err(|err| {
                        err.with_breadcrumb("link", link).with_breadcrumb("node", id)
                    })?;
                    next.extend(found);
                }
                next
            }
            Link::Transformation(transformation) => transformation
                .fetch(ctx, working)
                .map_err(|err| err.with_breadcrumb("link", link))?,
        };
    }
    Ok(working)
}

pub(crate) fn walk_create(
    ctx: &mut CreateContext<'_>,
    seed: FetchSet,
    links: &[Link],
) -> PathResult<FetchSet> {
    let mut working = seed;
    for link in links {
        working = match link {
            Link::Derivation(derivation) => {
                let mut next = FetchSet::new();
                for id in working.ids() {
                    let created = derivation.create(ctx, id).map_err(|err| {
                        err.with_breadcrumb("link", link).with_breadcrumb("node", id)
                    })?;
                    next.extend(created.into_iter().collect());
                }
                next
            }
            Link::Transformation(transformation) => transformation
                .create(ctx, working)
                .map_err(|err| err.with_breadcrumb("link", link))?,
        };
    }
    Ok(working)
}

impl BitOr<Link> for Anchor {
    type Output = Tether;

    fn bitor(self, link: Link) -> Tether {
        Tether {
            anchor: self,
            links: vec![link],
        }
    }
}

impl BitOr<Chain> for Anchor {
    type Output = Tether;

    fn bitor(self, chain: Chain) -> Tether {
        Tether {
            anchor: self,
            links: chain.links,
        }
    }
}

impl BitOr<Link> for Tether {
    type Output = Tether;

    fn bitor(mut self, link: Link) -> Tether {
        self.links.push(link);
        self
    }
}

impl BitOr<Link> for &Tether {
    type Output = Tether;

    fn bitor(self, link: Link) -> Tether {
        self.then(link)
    }
}

impl BitOr<Chain> for Tether {
    type Output = Tether;

    fn bitor(mut self, chain: Chain) -> Tether {
        self.links.extend(chain.links);
        self
    }
}

impl BitOr<Link> for Link {
    type Output = Chain;

    fn bitor(self, link: Link) -> Chain {
        Chain {
            links: vec![self, link],
        }
    }
}

impl BitOr<Link> for Chain {
    type Output = Chain;

    fn bitor(mut self, link: Link) -> Chain {
        self.links.push(link);
        self
    }
}

impl BitOr<Chain> for Chain {
    type Output = Chain;

    fn bitor(mut self, chain: Chain) -> Chain {
        self.links.extend(chain.links);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{abs_root, node, Chain};
    use crate::view::link::{attr, child, desc, order};
    use uuid::Uuid;

    #[test]
    fn composition_builds_new_values() {
        let base = abs_root() | child().with("a");
        let extended = &base | desc().with("x");
        assert_eq!(base.links().len(), 1);
        assert_eq!(extended.links().len(), 2);
        assert_eq!(extended.to_string(), "abs_root | child('a') | desc('x')");
    }

    #[test]
    fn chains_splice_into_tethers() {
        let chain: Chain = child().with("a") | attr() | order();
        let id = Uuid::new_v4();
        let tether = node(id) | chain.clone();
        assert_eq!(tether.links(), chain.links());
        assert_eq!((abs_root() | chain).links().len(), 3);
    }
}
