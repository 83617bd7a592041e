//! Node-wise link evaluation.
//!
//! # Responsibility
//! - Implement fetch and resolve-or-create for every `DerivationLink`.
//! - Own the alias, tag and attribute-root installation rules.
//!
//! # Invariants
//! - Attribute roots (`$`) are hidden from `child`, `sibling` and `desc`.
//! - Create is idempotent: an existing match is always reused.
//! - Alias fetch yields alias *sources*, so creating an alias at P for T
//!   and fetching P returns exactly T.
//! - Navigation-only links behave identically in both modes.

use super::context::{CreateContext, FetchContext};
use super::fetch_set::FetchSet;
use super::link::{DerivationLink, Link, Predicate};
use super::tether::{walk_create, walk_fetch};
use crate::error::{PathError, PathResult};
use crate::model::node::{split_heading_path, NodeId, ATTR_HEADING, TAG_ATTR_HEADING, TAG_ROOT_PATH};
use crate::path::ancestry::{fetch_ancestry_ordered, fetch_lineage, is_ancestor};
use crate::store::GraphStore;
use log::info;
use std::slice;

impl DerivationLink {
    /// Returns the candidates this link derives from `node`.
    pub fn fetch(&self, ctx: &FetchContext<'_>, node: NodeId) -> PathResult<FetchSet> {
        let store = ctx.store();
        match self {
            Self::Child(pred) => fetch_child(ctx, node, pred.as_ref()),
            Self::Desc(pred) => filter(ctx, pred.as_ref(), descendants(store, node)?, Some(node)),
            Self::Parent(pred) => {
                let parent = store.fetch_parent(node)?.into_iter().collect();
                filter(ctx, pred.as_ref(), parent, None)
            }
            Self::Ancestor(pred) => {
                let mut ancestors = fetch_ancestry_ordered(store, node)?;
                ancestors.reverse();
                filter(ctx, pred.as_ref(), ancestors, None)
            }
            Self::Sibling(pred) => {
                let siblings = match store.fetch_parent(node)? {
                    Some(parent) => visible_children(store, parent)?
                        .into_iter()
                        .filter(|sibling| *sibling != node)
                        .collect(),
                    None => Vec::new(),
                };
                filter(ctx, pred.as_ref(), siblings, None)
            }
            Self::LeftLineal(pred) => filter(ctx, pred.as_ref(), fetch_lineage(store, node)?, None),
            Self::RightLineal(pred) => {
                let mut lineal = vec![node];
                lineal.extend(descendants(store, node)?);
                filter(ctx, pred.as_ref(), lineal, None)
            }
            Self::Alias(pred) => {
                let mut sources = Vec::new();
                for child in visible_children(store, node)? {
                    if let Some(src) = store.fetch_alias_source(child)? {
                        sources.push(src);
                    }
                }
                filter(ctx, pred.as_ref(), sources, None)
            }
            Self::Resolve(pred) => {
                let resolved = store.fetch_alias_source(node)?.unwrap_or(node);
                filter(ctx, pred.as_ref(), vec![resolved], None)
            }
            Self::Tag(pred) => fetch_tags(ctx, node, pred.as_ref()),
            Self::Attr => Ok(find_child(store, node, ATTR_HEADING)?.into_iter().collect()),
            Self::AnyOf(links) => {
                let mut out = FetchSet::new();
                for link in links {
                    out.extend(apply(ctx, node, link)?);
                }
                Ok(out)
            }
            Self::AllOf(links) => {
                let mut out = FetchSet::new();
                for link in links {
                    let found = apply(ctx, node, link)?;
                    if found.is_empty() {
                        return Ok(FetchSet::new());
                    }
                    out.extend(found);
                }
                Ok(out)
            }
            Self::NoneOf(links) => {
                let (predicated, open) = split_predicated(links);
                let excluded = union_of(ctx, node, &predicated)?;
                let mut out = union_of(ctx, node, &open)?;
                out.retain(|candidate| !excluded.contains(candidate.id));
                Ok(out)
            }
            Self::Exactly(links) => {
                let (predicated, _) = split_predicated(links);
                let mut matched = FetchSet::new();
                for link in &predicated {
                    let found = apply(ctx, node, link)?;
                    if found.is_empty() {
                        return Ok(FetchSet::new());
                    }
                    matched.extend(found);
                }
                let open = links.iter().map(Link::unpredicated).collect::<Vec<_>>();
                let all = union_of(ctx, node, &open.iter().collect::<Vec<_>>())?;
                let same = matched.len() == all.len()
                    && matched.iter().all(|candidate| all.contains(candidate.id));
                Ok(if same { all } else { FetchSet::new() })
            }
        }
    }

    /// Resolves this link from `node`, creating whatever is missing.
    pub fn create(&self, ctx: &mut CreateContext<'_>, node: NodeId) -> PathResult<Vec<NodeId>> {
        match self {
            Self::Child(pred) => match pred {
                Some(Predicate::Heading(path)) => {
                    let segments = heading_segments(path)?;
                    Ok(vec![ensure_child_path(ctx.store_mut(), node, &segments)?])
                }
                Some(_) => reuse_or_fail(self.fetch(&ctx.as_fetch(), node)?, self),
                None => Err(PathError::uncategorized("child create requires a predicate")),
            },
            Self::Desc(pred) => {
                let existing = self.fetch(&ctx.as_fetch(), node)?;
                if !existing.is_empty() {
                    return Ok(existing.into_ids());
                }
                match pred {
                    Some(Predicate::Heading(path)) => {
                        let segments = heading_segments(path)?;
                        Ok(vec![ensure_child_path(ctx.store_mut(), node, &segments)?])
                    }
                    _ => reuse_or_fail(existing, self),
                }
            }
            Self::Parent(_)
            | Self::Ancestor(_)
            | Self::Sibling(_)
            | Self::LeftLineal(_)
            | Self::RightLineal(_)
            | Self::Resolve(_) => Ok(self.fetch(&ctx.as_fetch(), node)?.into_ids()),
            Self::Alias(pred) => {
                let pred = pred
                    .as_ref()
                    .ok_or_else(|| PathError::uncategorized("alias create requires a predicate"))?;
                let src = resolve_source(&ctx.as_fetch(), pred)?;
                Ok(vec![install_or_reuse_alias(ctx.store_mut(), src, node)?])
            }
            Self::Tag(pred) => create_tag(ctx, node, pred.as_ref()),
            Self::Attr => Ok(vec![ensure_attr(ctx.store_mut(), node)?]),
            Self::AllOf(links) => {
                let mut out = FetchSet::new();
                for link in links {
                    let seed = [node].into_iter().collect();
                    out.extend(walk_create(ctx, seed, slice::from_ref(link))?);
                }
                Ok(out.into_ids())
            }
            Self::AnyOf(_) | Self::NoneOf(_) | Self::Exactly(_) => Err(PathError::uncategorized(
                "combinator cannot decide what to create",
            )),
        }
    }
}

fn apply(ctx: &FetchContext<'_>, node: NodeId, link: &Link) -> PathResult<FetchSet> {
    walk_fetch(ctx, [node].into_iter().collect(), slice::from_ref(link))
}

fn union_of(ctx: &FetchContext<'_>, node: NodeId, links: &[&Link]) -> PathResult<FetchSet> {
    let mut out = FetchSet::new();
    for link in links {
        out.extend(apply(ctx, node, link)?);
    }
    Ok(out)
}

fn split_predicated(links: &[Link]) -> (Vec<&Link>, Vec<&Link>) {
    links.iter().partition(|link| link.is_predicated())
}

fn reuse_or_fail(existing: FetchSet, link: &DerivationLink) -> PathResult<Vec<NodeId>> {
    if existing.is_empty() {
        return Err(PathError::uncategorized(
            "only a heading predicate can synthesize a missing node",
        )
        .with_breadcrumb("link", link));
    }
    Ok(existing.into_ids())
}

fn heading_segments(path: &str) -> PathResult<Vec<&str>> {
    split_heading_path(path).ok_or_else(|| {
        PathError::uncategorized("invalid heading path").with_breadcrumb("heading", path)
    })
}

fn tag_root_segments() -> Vec<&'static str> {
    TAG_ROOT_PATH.split('.').collect()
}

/// Direct children minus the attribute root, in sibling order.
pub(crate) fn visible_children(store: &dyn GraphStore, node: NodeId) -> PathResult<Vec<NodeId>> {
    let mut visible = Vec::new();
    for child in store.fetch_children(node)? {
        if !store.fetch_node(child)?.is_attr_root() {
            visible.push(child);
        }
    }
    Ok(visible)
}

/// Visible descendants in depth-first pre-order.
pub(crate) fn descendants(store: &dyn GraphStore, node: NodeId) -> PathResult<Vec<NodeId>> {
    let mut out = Vec::new();
    let mut stack = visible_children(store, node)?;
    stack.reverse();
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut children = visible_children(store, current)?;
        children.reverse();
        stack.extend(children);
    }
    Ok(out)
}

pub(crate) fn find_child(
    store: &dyn GraphStore,
    parent: NodeId,
    heading: &str,
) -> PathResult<Option<NodeId>> {
    for child in store.fetch_children(parent)? {
        if store.fetch_heading(child)? == heading {
            return Ok(Some(child));
        }
    }
    Ok(None)
}

pub(crate) fn walk_child_path(
    store: &dyn GraphStore,
    node: NodeId,
    segments: &[&str],
) -> PathResult<Option<NodeId>> {
    let mut current = node;
    for segment in segments {
        match find_child(store, current, segment)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn ensure_child_path(
    store: &mut dyn GraphStore,
    node: NodeId,
    segments: &[&str],
) -> PathResult<NodeId> {
    let mut current = node;
    for segment in segments {
        current = match find_child(&*store, current, segment)? {
            Some(child) => child,
            None => {
                let child = store.create_child(current, segment, segment)?;
                info!("event=node_create module=view status=ok parent={current} node={child} heading={segment}");
                child
            }
        };
    }
    Ok(current)
}

fn ensure_attr(store: &mut dyn GraphStore, node: NodeId) -> PathResult<NodeId> {
    if let Some(attr) = find_child(&*store, node, ATTR_HEADING)? {
        return Ok(attr);
    }
    let attr = store.create_child(node, ATTR_HEADING, "")?;
    info!("event=attr_create module=view status=ok node={node} attr={attr}");
    Ok(attr)
}

/// Matches `segments` against the trailing headings of `candidate`'s lineage.
///
/// With `bound`, the matched lineage must lie strictly below `bound`.
fn matches_heading_path(
    store: &dyn GraphStore,
    candidate: NodeId,
    segments: &[&str],
    bound: Option<NodeId>,
) -> PathResult<bool> {
    let mut current = Some(candidate);
    for segment in segments.iter().rev() {
        let Some(id) = current.filter(|id| Some(*id) != bound) else {
            return Ok(false);
        };
        if store.fetch_heading(id)? != *segment {
            return Ok(false);
        }
        current = store.fetch_parent(id)?;
    }
    Ok(true)
}

fn filter(
    ctx: &FetchContext<'_>,
    pred: Option<&Predicate>,
    candidates: Vec<NodeId>,
    bound: Option<NodeId>,
) -> PathResult<FetchSet> {
    let store = ctx.store();
    let Some(pred) = pred else {
        return Ok(candidates.into_iter().collect());
    };

    let mut out = FetchSet::new();
    match pred {
        Predicate::Heading(path) => {
            let segments = heading_segments(path)?;
            for candidate in candidates {
                if matches_heading_path(store, candidate, &segments, bound)? {
                    out.insert(candidate);
                }
            }
        }
        Predicate::Id(id) => {
            if candidates.contains(id) {
                out.insert(*id);
            }
        }
        Predicate::Chain(chain) => {
            for candidate in candidates {
                let reached = walk_fetch(ctx, [candidate].into_iter().collect(), chain.links())?;
                if !reached.is_empty() {
                    out.insert(candidate);
                }
            }
        }
        Predicate::Tether(tether) => {
            let allowed = tether.fetch_nested(ctx)?;
            out = candidates
                .into_iter()
                .filter(|candidate| allowed.contains(*candidate))
                .collect();
        }
    }
    Ok(out)
}

fn fetch_child(ctx: &FetchContext<'_>, node: NodeId, pred: Option<&Predicate>) -> PathResult<FetchSet> {
    let store = ctx.store();
    match pred {
        Some(Predicate::Heading(path)) => {
            let segments = heading_segments(path)?;
            Ok(walk_child_path(store, node, &segments)?.into_iter().collect())
        }
        _ => filter(ctx, pred, visible_children(store, node)?, None),
    }
}

/// Resolves an alias or tag predicate to exactly one source node.
///
/// Heading paths are looked up from the root: first as a direct child path,
/// then as a descendant search. Alias sources resolve to their own source.
fn resolve_source(ctx: &FetchContext<'_>, pred: &Predicate) -> PathResult<NodeId> {
    let store = ctx.store();
    let root = store.root_node();
    let src = match pred {
        Predicate::Heading(path) => {
            let segments = heading_segments(path)?;
            match walk_child_path(store, root, &segments)? {
                Some(src) => src,
                None => filter(ctx, Some(pred), descendants(store, root)?, Some(root))?
                    .single()
                    .map_err(|err| err.with_breadcrumb("heading", path))?,
            }
        }
        Predicate::Id(id) => {
            if !store.exists(*id)? {
                return Err(PathError::not_found("alias source does not exist")
                    .with_breadcrumb("node", id));
            }
            *id
        }
        Predicate::Chain(chain) => {
            walk_fetch(ctx, [root].into_iter().collect(), chain.links())?.single()?
        }
        Predicate::Tether(tether) => tether.fetch_nested(ctx)?.single()?,
    };
    Ok(store.fetch_alias_source(src)?.unwrap_or(src))
}

/// Installs an alias of `src` under `dst`, reusing an existing one.
///
/// Returns `src`.
fn install_or_reuse_alias(store: &mut dyn GraphStore, src: NodeId, dst: NodeId) -> PathResult<NodeId> {
    if src == store.root_node() {
        return Err(PathError::uncategorized("root cannot be aliased").with_breadcrumb("dst", dst));
    }
    if src == dst || is_ancestor(&*store, src, dst)? {
        return Err(PathError::uncategorized("alias would form a cycle")
            .with_breadcrumb("src", src)
            .with_breadcrumb("dst", dst));
    }

    let heading = store.fetch_heading(src)?;
    if heading == ATTR_HEADING {
        return Err(PathError::uncategorized("attribute root cannot be aliased")
            .with_breadcrumb("src", src)
            .with_breadcrumb("dst", dst));
    }
    for child in store.fetch_children(dst)? {
        if store.fetch_alias_source(child)? == Some(src) {
            return Ok(src);
        }
        if store.fetch_heading(child)? == heading {
            return Err(PathError::uncategorized(
                "heading already taken under alias destination",
            )
            .with_breadcrumb("heading", heading)
            .with_breadcrumb("dst", dst));
        }
    }

    let alias = store.install_alias(src, dst)?;
    info!("event=alias_install module=view status=ok src={src} dst={dst} alias={alias}");
    Ok(src)
}

fn tag_root(store: &dyn GraphStore) -> PathResult<Option<NodeId>> {
    walk_child_path(store, store.root_node(), &tag_root_segments())
}

fn tag_holder(store: &dyn GraphStore, node: NodeId) -> PathResult<Option<NodeId>> {
    match find_child(store, node, ATTR_HEADING)? {
        Some(attr) => find_child(store, attr, TAG_ATTR_HEADING),
        None => Ok(None),
    }
}

/// Heading path of `node` relative to `ancestor`, or `None` when unrelated.
fn relative_path(store: &dyn GraphStore, ancestor: NodeId, node: NodeId) -> PathResult<Option<String>> {
    let lineage = fetch_lineage(store, node)?;
    let Some(position) = lineage.iter().position(|id| *id == ancestor) else {
        return Ok(None);
    };
    let headings = lineage[position + 1..]
        .iter()
        .map(|id| store.fetch_heading(*id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(headings.join(".")))
}

fn fetch_tags(ctx: &FetchContext<'_>, node: NodeId, pred: Option<&Predicate>) -> PathResult<FetchSet> {
    let store = ctx.store();
    let Some(holder) = tag_holder(store, node)? else {
        return Ok(FetchSet::new());
    };
    let mut definitions = Vec::new();
    for child in store.fetch_children(holder)? {
        if let Some(src) = store.fetch_alias_source(child)? {
            definitions.push(src);
        }
    }

    match pred {
        Some(Predicate::Heading(path)) => {
            heading_segments(path)?;
            let Some(root) = tag_root(store)? else {
                return Ok(FetchSet::new());
            };
            let mut out = FetchSet::new();
            for definition in definitions {
                if relative_path(store, root, definition)?.as_deref() == Some(path.as_str()) {
                    out.insert(definition);
                }
            }
            Ok(out)
        }
        _ => filter(ctx, pred, definitions, None),
    }
}

fn create_tag(
    ctx: &mut CreateContext<'_>,
    node: NodeId,
    pred: Option<&Predicate>,
) -> PathResult<Vec<NodeId>> {
    let definition = match pred {
        Some(Predicate::Heading(path)) => {
            let segments = heading_segments(path)?;
            let store = ctx.store_mut();
            let root = store.root_node();
            let tag_root = ensure_child_path(store, root, &tag_root_segments())?;
            ensure_child_path(store, tag_root, &segments)?
        }
        Some(other) => {
            let fetch_ctx = ctx.as_fetch();
            let definition = resolve_source(&fetch_ctx, other)?;
            let under_tag_root = match tag_root(fetch_ctx.store())? {
                Some(root) => is_ancestor(fetch_ctx.store(), root, definition)?,
                None => false,
            };
            if !under_tag_root {
                return Err(PathError::uncategorized("tag definition must live under /meta.tag")
                    .with_breadcrumb("node", definition));
            }
            definition
        }
        None => return Err(PathError::uncategorized("tag create requires a predicate")),
    };

    let store = ctx.store_mut();
    let attr = ensure_attr(store, node)?;
    let holder = ensure_child_path(store, attr, &[TAG_ATTR_HEADING])?;
    install_or_reuse_alias(store, definition, holder)?;
    Ok(vec![definition])
}
