//! Terminal actors.
//!
//! # Responsibility
//! - Turn a tether plus a store into a concrete outcome: one id, an id
//!   list, a boolean, text, or a mutation.
//! - Own the eager erase cascade.
//!
//! # Invariants
//! - Ambiguity and absence are judged here, never mid-walk.
//! - Erase removes a node's subtree, its attribute subtree and every alias
//!   pointing at a removed node; the root is never erased.
//!
//! Actors pipe after a tether (`tether | single(&store)`) and are also
//! reachable as `Tether` methods.

use super::fetch_set::FetchSet;
use super::link::{Link, TransformationLink};
use super::tether::Tether;
use crate::error::{PathError, PathResult};
use crate::model::node::NodeId;
use crate::path::ancestry::abs_path;
use crate::store::GraphStore;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::ops::BitOr;

/// Consumes a tether and produces an outcome.
pub trait Actor {
    type Output;

    fn act(self, tether: &Tether) -> Self::Output;
}

macro_rules! actor {
    ($(#[$meta:meta])* $name:ident<$lt:lifetime>, $store:ty $(, $field:ident: $field_ty:ty)*) => {
        $(#[$meta])*
        pub struct $name<$lt> {
            store: $store,
            selected: Option<NodeId>,
            $($field: $field_ty,)*
        }

        impl<$lt> $name<$lt> {
            /// Supplies the node `Anchor::Selected` resolves to.
            pub fn selected(mut self, node: NodeId) -> Self {
                self.selected = Some(node);
                self
            }
        }

        impl<$lt> BitOr<$name<$lt>> for Tether {
            type Output = <$name<$lt> as Actor>::Output;

            fn bitor(self, actor: $name<$lt>) -> Self::Output {
                actor.act(&self)
            }
        }

        impl<$lt> BitOr<$name<$lt>> for &Tether {
            type Output = <$name<$lt> as Actor>::Output;

            fn bitor(self, actor: $name<$lt>) -> Self::Output {
                actor.act(self)
            }
        }
    };
}

actor!(
    /// Exactly one node: 0 is `not_found`, more is `ambiguous_path`.
    Single<'s>, &'s dyn GraphStore
);
actor!(
    /// Non-empty result; evaluation errors count as `false`.
    Exists<'s>, &'s dyn GraphStore
);
actor!(
    /// Result ids in set order; errors are logged and yield an empty list.
    ToNodeVec<'s>, &'s dyn GraphStore
);
actor!(
    /// Result ids in set order; errors propagate.
    TryNodeVec<'s>, &'s dyn GraphStore
);
actor!(
    /// Raw annotated result set.
    ToFetchSet<'s>, &'s dyn GraphStore
);
actor!(
    /// Node to minimal disambiguating label.
    Disambiguation<'s>, &'s dyn GraphStore
);
actor!(
    /// Resolve-or-create walk returning every resolved id.
    Create<'s>, &'s mut dyn GraphStore
);
actor!(
    /// Resolve-or-create walk that must end on exactly one node.
    FetchOrCreateNode<'s>, &'s mut dyn GraphStore
);
actor!(
    /// Eager cascading erase of every resolved node.
    EraseNode<'s>, &'s mut dyn GraphStore
);
actor!(FetchHeading<'s>, &'s dyn GraphStore);
actor!(FetchTitle<'s>, &'s dyn GraphStore);
actor!(FetchBody<'s>, &'s dyn GraphStore);
actor!(
    /// Replaces the body of the single resolved node.
    UpdateBody<'s>, &'s mut dyn GraphStore, body: String
);
actor!(
    /// `/a.b.c` path of the single resolved node.
    AbsPath<'s>, &'s dyn GraphStore
);

pub fn single(store: &dyn GraphStore) -> Single<'_> {
    Single { store, selected: None }
}

pub fn exists(store: &dyn GraphStore) -> Exists<'_> {
    Exists { store, selected: None }
}

pub fn to_node_vec(store: &dyn GraphStore) -> ToNodeVec<'_> {
    ToNodeVec { store, selected: None }
}

pub fn try_node_vec(store: &dyn GraphStore) -> TryNodeVec<'_> {
    TryNodeVec { store, selected: None }
}

pub fn to_fetch_set(store: &dyn GraphStore) -> ToFetchSet<'_> {
    ToFetchSet { store, selected: None }
}

pub fn disambiguation(store: &dyn GraphStore) -> Disambiguation<'_> {
    Disambiguation { store, selected: None }
}

pub fn create(store: &mut dyn GraphStore) -> Create<'_> {
    Create { store, selected: None }
}

pub fn fetch_or_create_node(store: &mut dyn GraphStore) -> FetchOrCreateNode<'_> {
    FetchOrCreateNode { store, selected: None }
}

pub fn erase_node(store: &mut dyn GraphStore) -> EraseNode<'_> {
    EraseNode { store, selected: None }
}

pub fn fetch_heading(store: &dyn GraphStore) -> FetchHeading<'_> {
    FetchHeading { store, selected: None }
}

pub fn fetch_title(store: &dyn GraphStore) -> FetchTitle<'_> {
    FetchTitle { store, selected: None }
}

pub fn fetch_body(store: &dyn GraphStore) -> FetchBody<'_> {
    FetchBody { store, selected: None }
}

pub fn update_body(store: &mut dyn GraphStore, body: impl Into<String>) -> UpdateBody<'_> {
    UpdateBody {
        store,
        selected: None,
        body: body.into(),
    }
}

pub fn abs_path_of(store: &dyn GraphStore) -> AbsPath<'_> {
    AbsPath { store, selected: None }
}

impl Actor for Single<'_> {
    type Output = PathResult<NodeId>;

    fn act(self, tether: &Tether) -> Self::Output {
        tether
            .evaluate_fetch(self.store, self.selected)?
            .single()
            .map_err(|err| err.with_breadcrumb("tether", tether))
    }
}

impl Actor for Exists<'_> {
    type Output = bool;

    fn act(self, tether: &Tether) -> bool {
        match tether.evaluate_fetch(self.store, self.selected) {
            Ok(set) => !set.is_empty(),
            Err(err) => {
                debug!("event=tether_exists module=view status=error error={err}");
                false
            }
        }
    }
}

impl Actor for ToNodeVec<'_> {
    type Output = Vec<NodeId>;

    fn act(self, tether: &Tether) -> Vec<NodeId> {
        match tether.evaluate_fetch(self.store, self.selected) {
            Ok(set) => set.into_ids(),
            Err(err) => {
                warn!(
                    "event=tether_to_node_vec module=view status=error error_code={} error={err}",
                    err.kind()
                );
                Vec::new()
            }
        }
    }
}

impl Actor for TryNodeVec<'_> {
    type Output = PathResult<Vec<NodeId>>;

    fn act(self, tether: &Tether) -> Self::Output {
        Ok(tether.evaluate_fetch(self.store, self.selected)?.into_ids())
    }
}

impl Actor for ToFetchSet<'_> {
    type Output = PathResult<FetchSet>;

    fn act(self, tether: &Tether) -> Self::Output {
        tether.evaluate_fetch(self.store, self.selected)
    }
}

impl Actor for Disambiguation<'_> {
    type Output = PathResult<BTreeMap<NodeId, String>>;

    fn act(self, tether: &Tether) -> Self::Output {
        let ends_disambiguated = matches!(
            tether.links().last(),
            Some(Link::Transformation(TransformationLink::Disambiguate))
        );
        let set = if ends_disambiguated {
            tether.evaluate_fetch(self.store, self.selected)?
        } else {
            tether
                .then(TransformationLink::Disambiguate.into())
                .evaluate_fetch(self.store, self.selected)?
        };
        Ok(set
            .into_iter()
            .filter_map(|node| node.disambiguation.map(|label| (node.id, label)))
            .collect())
    }
}

impl Actor for Create<'_> {
    type Output = PathResult<Vec<NodeId>>;

    fn act(self, tether: &Tether) -> Self::Output {
        Ok(tether.evaluate_create(self.store, self.selected)?.into_ids())
    }
}

impl Actor for FetchOrCreateNode<'_> {
    type Output = PathResult<NodeId>;

    fn act(self, tether: &Tether) -> Self::Output {
        tether
            .evaluate_create(self.store, self.selected)?
            .single()
            .map_err(|err| err.with_breadcrumb("tether", tether))
    }
}

impl Actor for EraseNode<'_> {
    type Output = PathResult<Vec<NodeId>>;

    fn act(self, tether: &Tether) -> Self::Output {
        let targets = tether.evaluate_fetch(&*self.store, self.selected)?.into_ids();
        let mut erased = Vec::new();
        for target in targets {
            erase_cascade(&mut *self.store, target, &mut erased)
                .map_err(|err| err.with_breadcrumb("tether", tether))?;
        }
        info!(
            "event=node_erase module=view status=ok erased={} tether={tether}",
            erased.len()
        );
        Ok(erased)
    }
}

impl Actor for FetchHeading<'_> {
    type Output = PathResult<String>;

    fn act(self, tether: &Tether) -> Self::Output {
        let id = single(self.store).with_selected(self.selected).act(tether)?;
        Ok(self.store.fetch_heading(id)?)
    }
}

impl Actor for FetchTitle<'_> {
    type Output = PathResult<String>;

    fn act(self, tether: &Tether) -> Self::Output {
        let id = single(self.store).with_selected(self.selected).act(tether)?;
        Ok(self.store.fetch_title(id)?)
    }
}

impl Actor for FetchBody<'_> {
    type Output = PathResult<String>;

    fn act(self, tether: &Tether) -> Self::Output {
        let id = single(self.store).with_selected(self.selected).act(tether)?;
        Ok(self.store.fetch_body(id)?)
    }
}

impl Actor for UpdateBody<'_> {
    type Output = PathResult<()>;

    fn act(self, tether: &Tether) -> Self::Output {
        let id = single(&*self.store)
            .with_selected(self.selected)
            .act(tether)?;
        self.store.update_body(id, &self.body)?;
        Ok(())
    }
}

impl Actor for AbsPath<'_> {
    type Output = PathResult<String>;

    fn act(self, tether: &Tether) -> Self::Output {
        let id = single(self.store).with_selected(self.selected).act(tether)?;
        abs_path(self.store, id)
    }
}

impl Single<'_> {
    fn with_selected(mut self, selected: Option<NodeId>) -> Self {
        self.selected = selected;
        self
    }
}

fn erase_cascade(
    store: &mut dyn GraphStore,
    node: NodeId,
    erased: &mut Vec<NodeId>,
) -> PathResult<()> {
    if !store.exists(node)? {
        return Ok(());
    }
    if node == store.root_node() {
        return Err(PathError::uncategorized("root cannot be erased"));
    }

    for child in store.fetch_children(node)?.into_iter().rev() {
        erase_cascade(store, child, erased)?;
    }
    if !store.is_alias(node)? {
        for alias in store.fetch_aliases_to(node)? {
            erase_cascade(store, alias, erased)?;
        }
    }

    store.erase_node(node)?;
    debug!("event=node_erase module=view status=ok node={node}");
    erased.push(node);
    Ok(())
}

impl Tether {
    pub fn single(&self, store: &dyn GraphStore) -> PathResult<NodeId> {
        single(store).act(self)
    }

    pub fn exists(&self, store: &dyn GraphStore) -> bool {
        exists(store).act(self)
    }

    pub fn to_node_vec(&self, store: &dyn GraphStore) -> Vec<NodeId> {
        to_node_vec(store).act(self)
    }

    pub fn try_node_vec(&self, store: &dyn GraphStore) -> PathResult<Vec<NodeId>> {
        try_node_vec(store).act(self)
    }

    pub fn to_fetch_set(&self, store: &dyn GraphStore) -> PathResult<FetchSet> {
        to_fetch_set(store).act(self)
    }

    pub fn disambiguation(&self, store: &dyn GraphStore) -> PathResult<BTreeMap<NodeId, String>> {
        disambiguation(store).act(self)
    }

    pub fn create(&self, store: &mut dyn GraphStore) -> PathResult<Vec<NodeId>> {
        create(store).act(self)
    }

    pub fn fetch_or_create_node(&self, store: &mut dyn GraphStore) -> PathResult<NodeId> {
        fetch_or_create_node(store).act(self)
    }

    pub fn erase(&self, store: &mut dyn GraphStore) -> PathResult<Vec<NodeId>> {
        erase_node(store).act(self)
    }

    pub fn fetch_heading(&self, store: &dyn GraphStore) -> PathResult<String> {
        fetch_heading(store).act(self)
    }

    pub fn fetch_title(&self, store: &dyn GraphStore) -> PathResult<String> {
        fetch_title(store).act(self)
    }

    pub fn fetch_body(&self, store: &dyn GraphStore) -> PathResult<String> {
        fetch_body(store).act(self)
    }

    pub fn update_body(&self, store: &mut dyn GraphStore, body: impl Into<String>) -> PathResult<()> {
        update_body(store, body).act(self)
    }

    pub fn abs_path(&self, store: &dyn GraphStore) -> PathResult<String> {
        abs_path_of(store).act(self)
    }
}
