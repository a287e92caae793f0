// src/core/node_resolver.rs

//! Turns what the user typed into a node.
//!
//! Stages, first match wins: exact key, unique exact label, unique key prefix, then
//! a label path such as `build/test`.

use crate::constants::SHORT_KEY_LEN;
use crate::core::catalog::Catalog;
use crate::core::identity::NodeKey;
use crate::models::{CommandNode, Scope};
use thiserror::Error;

/// Why a reference did not name exactly one node.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference is blank.
    #[error("Empty node reference.")]
    Empty,
    /// Nothing matches.
    #[error("No command or group matches '{reference}'.")]
    NotFound {
        /// The reference as given.
        reference: String,
    },
    /// More than one node matches at the first stage that matched anything.
    #[error("'{reference}' matches several nodes: {candidates}. Use a longer key.")]
    Ambiguous {
        /// The reference as given.
        reference: String,
        /// The matches, formatted for display.
        candidates: String,
    },
}

/// A node located by [`resolve_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    /// Catalog holding the node.
    pub scope: Scope,
    /// The node's key.
    pub key: NodeKey,
    /// The node's label.
    pub label: String,
}

/// Resolves a user-typed reference to one node, searching `catalogs` (optionally only
/// those of `scope`).
///
/// Tried in order, the first stage with any match wins:
/// 1. exact key,
/// 2. exact label,
/// 3. key prefix,
/// 4. label path (`group/sub/label`), walked from the roots.
///
/// A stage with several matches is an `Ambiguous` error.
pub fn resolve_node(
    catalogs: &[Catalog],
    scope: Option<Scope>,
    reference: &str,
) -> Result<ResolvedNode, ResolveError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ResolveError::Empty);
    }
    let searched: Vec<&Catalog> = catalogs
        .iter()
        .filter(|c| scope.is_none_or(|s| c.scope() == s))
        .collect();

    let stages: [&dyn Fn(&CommandNode) -> bool; 3] = [
        &|node: &CommandNode| node.key().as_str() == reference,
        &|node: &CommandNode| node.label == reference,
        &|node: &CommandNode| node.key().as_str().starts_with(reference),
    ];
    for predicate in stages {
        let found: Vec<ResolvedNode> = searched
            .iter()
            .flat_map(|catalog| {
                catalog
                    .store()
                    .iter()
                    .filter(move |node| predicate(node))
                    .map(move |node| resolved(catalog.scope(), node))
            })
            .collect();
        if let Some(result) = single(reference, found)? {
            return Ok(result);
        }
    }

    if reference.contains('/') {
        let found: Vec<ResolvedNode> = searched
            .iter()
            .flat_map(|catalog| {
                walk_path(catalog.store().roots(), reference)
                    .into_iter()
                    .map(move |node| resolved(catalog.scope(), node))
            })
            .collect();
        if let Some(result) = single(reference, found)? {
            return Ok(result);
        }
    }

    Err(ResolveError::NotFound {
        reference: reference.to_string(),
    })
}

fn resolved(scope: Scope, node: &CommandNode) -> ResolvedNode {
    ResolvedNode {
        scope,
        key: node.key().clone(),
        label: node.label.clone(),
    }
}

fn single(
    reference: &str,
    mut found: Vec<ResolvedNode>,
) -> Result<Option<ResolvedNode>, ResolveError> {
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(ResolveError::Ambiguous {
            reference: reference.to_string(),
            candidates: found
                .iter()
                .map(|n| format!("{}:{} ({})", n.scope, n.key.short(SHORT_KEY_LEN), n.label))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn walk_path<'a>(roots: &'a [CommandNode], path: &str) -> Vec<&'a CommandNode> {
    let mut level: Vec<&CommandNode> = roots.iter().collect();
    let mut segments = path.split('/').map(str::trim).filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next() {
        let matched: Vec<&CommandNode> = level.into_iter().filter(|n| n.label == segment).collect();
        if segments.peek().is_none() {
            return matched;
        }
        level = matched.into_iter().flat_map(|n| n.children()).collect();
    }
    Vec::new()
}
