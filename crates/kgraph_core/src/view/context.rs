//! Evaluation contexts.
//!
//! A context bundles the store handle with the node `Anchor::Selected`
//! resolves to.

use crate::model::node::NodeId;
use crate::store::GraphStore;

/// Read-only evaluation context.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    store: &'a dyn GraphStore,
    selected: Option<NodeId>,
}

impl<'a> FetchContext<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self {
            store,
            selected: None,
        }
    }

    pub fn with_selected(mut self, selected: Option<NodeId>) -> Self {
        self.selected = selected;
        self
    }

    pub fn store(&self) -> &'a dyn GraphStore {
        self.store
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }
}

/// Resolve-or-create evaluation context; owns the only mutable store borrow.
pub struct CreateContext<'a> {
    store: &'a mut dyn GraphStore,
    selected: Option<NodeId>,
}

impl<'a> CreateContext<'a> {
    pub fn new(store: &'a mut dyn GraphStore) -> Self {
        Self {
            store,
            selected: None,
        }
    }

    pub fn with_selected(mut self, selected: Option<NodeId>) -> Self {
        self.selected = selected;
        self
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn store_mut(&mut self) -> &mut (dyn GraphStore + 'a) {
        &mut *self.store
    }

    /// Borrows this context as a read-only one for lookups between mutations.
    pub fn as_fetch(&self) -> FetchContext<'_> {
        FetchContext {
            store: &*self.store,
            selected: self.selected,
        }
    }
}
