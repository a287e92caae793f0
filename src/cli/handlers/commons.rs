// src/cli/handlers/commons.rs

//! Helpers shared by the action handlers.

// Helpers shared by several handlers.

use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::{
    core::{
        catalog::{Catalog, CatalogError},
        node_resolver::ResolvedNode,
        tree_store::Change,
    },
    models::Scope,
    state::Shelf,
};

/// Scope used by `add`/`group` when none is given.
pub const DEFAULT_SCOPE: Scope = Scope::Workspace;

/// Resolves a node reference, restricted to `scope` when given.
pub fn resolve(shelf: &Shelf, scope: Option<Scope>, reference: &str) -> Result<ResolvedNode> {
    Ok(shelf.resolve(scope, reference)?)
}

/// The catalog of `scope`, or an error naming the scope.
pub fn catalog_mut(shelf: &mut Shelf, scope: Scope) -> Result<&mut Catalog> {
    shelf
        .catalog_mut(scope)
        .ok_or_else(|| anyhow!(t!("error.scope_unavailable"), scope = scope))
}

/// Turns a catalog mutation result into the handler's result. A failed save is only a
/// warning: the change is applied for this session but may not be on disk.
pub fn settle(result: Result<Change, CatalogError>) -> Result<Change> {
    match result {
        Ok(change) => Ok(change),
        Err(CatalogError::Persist { change, source }) => {
            warn_not_saved(&source);
            Ok(change)
        }
        Err(CatalogError::Tree(e)) => Err(e.into()),
    }
}

/// Prints a yellow "not saved" warning.
pub fn warn_not_saved(error: &dyn std::fmt::Display) {
    eprintln!(
        "{} {}",
        t!("common.warning.label").yellow().bold(),
        format!(t!("common.warning.not_saved"), error = error).yellow()
    );
}

/// Asks a yes/no question with `default` preselected.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// `scope:label`, as printed in confirmations.
pub fn describe(node: &ResolvedNode) -> String {
    format!("{}:{}", node.scope, node.label)
}
