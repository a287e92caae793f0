// src/core/catalog.rs

//! A scope's tree bound to its storage.
//!
//! Every successful mutation rewrites the whole document and then notifies the
//! registered observers. A failed save keeps the in-memory change.

use crate::core::identity::NodeKey;
use crate::core::persistence::{self, DocumentStorage, PersistError};
use crate::core::tree_store::{Change, NodePatch, TreeError, TreeStore};
use crate::models::{CommandNode, ProcessHandle, Scope};
use std::fmt;
use thiserror::Error;

/// Errors of catalog mutations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The mutation was refused; nothing changed.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The mutation was applied in memory but the document could not be saved.
    /// Memory and storage disagree until the next successful save.
    #[error("The change was applied but could not be saved: {source}")]
    Persist {
        /// What the mutation changed.
        change: Change,
        /// Why the save failed.
        #[source]
        source: PersistError,
    },
}

/// Receives a notification after every change of a catalog.
pub trait TreeObserver {
    /// Called once per committed mutation or state transition.
    fn tree_changed(&mut self, scope: Scope, change: &Change);
}

/// One scope's command tree, wired to its storage and its observers.
///
/// Every structural mutation is saved as a whole document (last writer wins) and then
/// broadcast. Temporary catalogs have no storage and are never written.
pub struct Catalog {
    scope: Scope,
    store: TreeStore,
    storage: Option<Box<dyn DocumentStorage>>,
    observers: Vec<Box<dyn TreeObserver>>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("scope", &self.scope)
            .field("nodes", &self.store.len())
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Loads the scope's document from `storage` (see [`persistence::load`]).
    pub fn open(scope: Scope, mut storage: Box<dyn DocumentStorage>) -> Self {
        let store = persistence::load(storage.as_mut(), scope);
        log::debug!("Opened '{}' catalog with {} node(s)", scope, store.len());
        Self {
            scope,
            store,
            storage: Some(storage),
            observers: Vec::new(),
        }
    }

    /// A catalog that lives only in memory.
    pub fn ephemeral(scope: Scope) -> Self {
        Self {
            scope,
            store: TreeStore::new(),
            storage: None,
            observers: Vec::new(),
        }
    }

    /// The scope this catalog holds.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Read access to the tree.
    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut TreeStore {
        &mut self.store
    }

    /// Whether mutations are written to storage.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// Registers a change listener (e.g. a view that must refresh).
    pub fn subscribe(&mut self, observer: Box<dyn TreeObserver>) {
        self.observers.push(observer);
    }

    /// Adds a node as the last child of `parent` (or last root), then saves.
    pub fn add_node(
        &mut self,
        node: CommandNode,
        parent: Option<&NodeKey>,
    ) -> Result<Change, CatalogError> {
        let change = self.store.add_node(node, parent)?;
        self.commit(change)
    }

    /// Deletes a node and its subtree, disposing live processes through `dispose`.
    pub fn delete_node(
        &mut self,
        key: &NodeKey,
        dispose: impl FnMut(ProcessHandle),
    ) -> Result<Change, CatalogError> {
        let change = self.store.delete_node(key, dispose)?;
        self.commit(change)
    }

    /// Applies `patch` to a node, then saves.
    pub fn edit_node(&mut self, key: &NodeKey, patch: NodePatch) -> Result<Change, CatalogError> {
        let change = self.store.edit_node(key, patch)?;
        self.commit(change)
    }

    /// Drag-and-drop reparenting; see [`TreeStore::move_subtree`]. Nothing is saved
    /// when no node actually moved.
    pub fn move_subtree(
        &mut self,
        keys: &[NodeKey],
        target: Option<&NodeKey>,
    ) -> Result<Change, CatalogError> {
        let change = self.store.move_subtree(keys, target)?;
        self.commit(change)
    }

    /// Writes the whole catalog. A no-op for catalogs without storage.
    pub fn save(&mut self) -> Result<(), PersistError> {
        match self.storage.as_mut() {
            Some(storage) => persistence::save(storage.as_mut(), self.scope, self.store.roots()),
            None => Ok(()),
        }
    }

    /// Broadcasts a change without saving (run-state transitions are not persisted).
    pub(crate) fn notify(&mut self, change: &Change) {
        if change.is_empty() {
            return;
        }
        for observer in self.observers.iter_mut() {
            observer.tree_changed(self.scope, change);
        }
    }

    fn commit(&mut self, change: Change) -> Result<Change, CatalogError> {
        if change.is_empty() {
            return Ok(change);
        }
        let saved = self.save();
        self.notify(&change);
        match saved {
            Ok(()) => Ok(change),
            Err(source) => {
                log::error!("Failed to save the '{}' catalog: {}", self.scope, source);
                Err(CatalogError::Persist { change, source })
            }
        }
    }
}
