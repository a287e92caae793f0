// src/core/persistence.rs

//! Conversion between a scope's forest and its stored JSON document.
//!
//! Documents are versioned. Schema v1 is `{ "version": 1, "scope": ..., "nodes": [...] }`.
//! The legacy shape, a bare array of records using `command` instead of
//! `commandTemplate`, is recognised explicitly and upgraded on load; the next save
//! rewrites it as v1.

use crate::core::identity::{self, NodeKey};
use crate::core::tree_store::TreeStore;
use crate::models::{self, CommandNode, LeafCommand, NodeKind, RunState, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// The schema version written by this build.
pub const DOCUMENT_VERSION: u32 = 1;

/// Failure of the byte-storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the document file failed.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// The document path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No storage location is configured for the scope.
    #[error("No storage location is available for the '{scope}' catalog.")]
    Unavailable {
        /// The scope without a location.
        scope: Scope,
    },
}

/// Errors of the persistence bridge.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The stored document could not be read.
    #[error("Could not read the catalog: {0}")]
    StorageRead(#[source] StorageError),
    /// The document could not be written; in-memory changes are kept.
    #[error("Could not save the catalog: {0}")]
    StorageWrite(#[source] StorageError),
    /// The document is not valid JSON for any known schema.
    #[error("The catalog document is malformed: {0}")]
    MalformedDocument(#[from] serde_json::Error),
    /// The document is structurally valid JSON but violates the schema.
    #[error("The catalog document is invalid: {0}")]
    InvalidDocument(String),
    /// The document was written by a newer build.
    #[error(
        "Catalog schema version {found} is not supported (latest is {latest}).",
        latest = DOCUMENT_VERSION
    )]
    UnsupportedVersion {
        /// The version found in the document.
        found: u32,
    },
}

/// External byte storage holding one document per scope.
pub trait DocumentStorage {
    /// Returns the stored bytes, or `None` when no document exists yet.
    fn read_document(&self, scope: Scope) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the stored document as a whole.
    fn write_document(&mut self, scope: Scope, bytes: &[u8]) -> Result<(), StorageError>;
}

/// One stored node. Run state and process handles never appear here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Missing in legacy documents; back-filled on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Display name.
    #[serde(default)]
    pub label: String,
    /// Groups ignore `command_template` and `variables`.
    #[serde(default)]
    pub is_group: bool,
    /// The shell command of a leaf. Legacy documents call it `command`.
    #[serde(default, alias = "command", skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,
    /// Optional launch-time tokens; omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    /// Children of a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRecord>>,
}

/// The stored document of one scope (schema v1).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocument {
    /// Schema version; see [`DOCUMENT_VERSION`].
    pub version: u32,
    /// Informational only. Absent in upgraded legacy documents.
    #[serde(default)]
    pub scope: Option<Scope>,
    /// Top-level records in forest order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

impl CatalogDocument {
    /// An empty v1 document.
    pub fn empty(scope: Scope) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            scope: Some(scope),
            nodes: Vec::new(),
        }
    }
}

/// Every shape a stored document may take.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Versioned(CatalogDocument),
    Legacy(Vec<NodeRecord>),
}

// --- Forest -> document ---

/// Maps a forest to its stored document.
pub fn serialize(scope: Scope, roots: &[CommandNode]) -> CatalogDocument {
    CatalogDocument {
        version: DOCUMENT_VERSION,
        scope: Some(scope),
        nodes: roots.iter().map(to_record).collect(),
    }
}

fn to_record(node: &CommandNode) -> NodeRecord {
    match &node.kind {
        NodeKind::Group { children } => NodeRecord {
            key: Some(node.key().to_string()),
            label: node.label.clone(),
            is_group: true,
            command_template: None,
            variables: None,
            children: Some(children.iter().map(to_record).collect()),
        },
        NodeKind::Leaf(leaf) => NodeRecord {
            key: Some(node.key().to_string()),
            label: node.label.clone(),
            is_group: false,
            command_template: Some(leaf.template.clone()),
            variables: (!leaf.variables.is_empty()).then(|| leaf.variables.clone()),
            children: None,
        },
    }
}

/// Encodes a document as pretty-printed JSON.
pub fn encode(document: &CatalogDocument) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec_pretty(document)?)
}

// --- Document -> forest ---

/// Parses stored bytes, upgrading the legacy shape to the current schema.
pub fn decode(bytes: &[u8]) -> Result<CatalogDocument, PersistError> {
    match serde_json::from_slice::<StoredDocument>(bytes)? {
        StoredDocument::Versioned(document) => {
            if document.version > DOCUMENT_VERSION {
                return Err(PersistError::UnsupportedVersion {
                    found: document.version,
                });
            }
            Ok(document)
        }
        StoredDocument::Legacy(nodes) => {
            log::info!(
                "Upgrading legacy catalog document ({} top-level entries) to schema v{}",
                nodes.len(),
                DOCUMENT_VERSION
            );
            Ok(CatalogDocument {
                version: DOCUMENT_VERSION,
                scope: None,
                nodes,
            })
        }
    }
}

/// Maps a document back to a forest. Every leaf starts `Stopped`, and nodes without a
/// usable key get a fresh one in a final pass over the whole forest.
pub fn deserialize(
    scope: Scope,
    document: CatalogDocument,
) -> Result<Vec<CommandNode>, PersistError> {
    if let Some(stored_scope) = document.scope
        && stored_scope != scope
    {
        log::warn!(
            "Catalog document claims scope '{}' but was loaded as '{}'; using '{}'.",
            stored_scope,
            scope,
            scope
        );
    }

    let mut roots = document
        .nodes
        .into_iter()
        .map(|record| from_record(scope, record))
        .collect::<Result<Vec<_>, _>>()?;
    assign_missing_keys(&mut roots);
    Ok(roots)
}

fn from_record(scope: Scope, record: NodeRecord) -> Result<CommandNode, PersistError> {
    let key = record
        .key
        .map(NodeKey::from_raw)
        .unwrap_or_else(NodeKey::unassigned);

    let kind = if record.is_group {
        if record.command_template.is_some() || record.variables.is_some() {
            log::warn!(
                "Group '{}' carries a command or variables in storage; they are dropped.",
                record.label
            );
        }
        let children = record
            .children
            .unwrap_or_default()
            .into_iter()
            .map(|child| from_record(scope, child))
            .collect::<Result<Vec<_>, _>>()?;
        NodeKind::Group { children }
    } else {
        if record.children.as_ref().is_some_and(|c| !c.is_empty()) {
            return Err(PersistError::InvalidDocument(format!(
                "command '{}' has children but is not a group",
                record.label
            )));
        }
        NodeKind::Leaf(LeafCommand {
            template: record.command_template.unwrap_or_default(),
            variables: models::clean_variables(record.variables.unwrap_or_default()),
            state: RunState::Stopped,
        })
    };

    let label = match &kind {
        NodeKind::Leaf(leaf) => models::label_or_command(Some(record.label), &leaf.template),
        NodeKind::Group { .. } => record.label,
    };
    Ok(CommandNode::restore(key, label, scope, kind))
}

/// Gives a fresh key to every node whose key is missing, blank or already used by a
/// node earlier in pre-order.
pub(crate) fn assign_missing_keys(roots: &mut [CommandNode]) {
    let mut seen = HashSet::new();
    let mut assigned = 0usize;
    for root in roots.iter_mut() {
        assign_in(root, &mut seen, &mut assigned);
    }
    if assigned > 0 {
        log::debug!("Assigned fresh keys to {} node(s) after load", assigned);
    }
}

fn assign_in(node: &mut CommandNode, seen: &mut HashSet<NodeKey>, assigned: &mut usize) {
    if node.key().is_unassigned() || seen.contains(node.key()) {
        if !node.key().is_unassigned() {
            log::warn!("Duplicate key '{}' in catalog document; re-keying.", node.key());
        }
        let mut fresh = identity::new_key();
        while seen.contains(&fresh) {
            fresh = identity::new_key();
        }
        node.assign_key(fresh);
        *assigned += 1;
    }
    seen.insert(node.key().clone());
    if let Some(children) = node.children_mut() {
        for child in children.iter_mut() {
            assign_in(child, seen, assigned);
        }
    }
}

// --- Storage round-trips ---

/// Loads a scope's forest. Never fails: a missing document is created empty, and an
/// unreadable or malformed one degrades to an empty catalog with a logged warning.
pub fn load(storage: &mut dyn DocumentStorage, scope: Scope) -> TreeStore {
    match try_load(storage, scope) {
        Ok(roots) => TreeStore::from_roots(roots),
        Err(e) => {
            log::warn!("Starting with an empty '{}' catalog: {}", scope, e);
            TreeStore::new()
        }
    }
}

fn try_load(
    storage: &mut dyn DocumentStorage,
    scope: Scope,
) -> Result<Vec<CommandNode>, PersistError> {
    let bytes = storage
        .read_document(scope)
        .map_err(PersistError::StorageRead)?;

    match bytes {
        Some(bytes) => deserialize(scope, decode(&bytes)?),
        None => {
            log::debug!("No '{}' catalog found; creating an empty one.", scope);
            if let Err(e) = encode(&CatalogDocument::empty(scope))
                .and_then(|b| storage.write_document(scope, &b).map_err(PersistError::StorageWrite))
            {
                log::warn!("Could not create the empty '{}' catalog: {}", scope, e);
            }
            Ok(Vec::new())
        }
    }
}

/// Writes the whole forest back, replacing the stored document.
pub fn save(
    storage: &mut dyn DocumentStorage,
    scope: Scope,
    roots: &[CommandNode],
) -> Result<(), PersistError> {
    let bytes = encode(&serialize(scope, roots))?;
    storage
        .write_document(scope, &bytes)
        .map_err(PersistError::StorageWrite)?;
    log::debug!("Saved '{}' catalog ({} bytes)", scope, bytes.len());
    Ok(())
}
