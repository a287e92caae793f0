//! `move`: drag-and-drop style reparenting from the command line.

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    core::node_resolver::ResolvedNode,
    models::Scope,
    state::Shelf,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Moves nodes into a group, after a command, or to the top level."
)]
struct MoveArgs {
    /// The nodes to move (keys, labels or paths). Selected descendants of a selected
    /// group move with it.
    #[arg(required = true)]
    nodes: Vec<String>,

    /// Drop target: a group receives the nodes as its last children, a command gets
    /// them right after itself. Omitted means the top level.
    #[arg(long, short)]
    onto: Option<String>,
}

/// Handles `move`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let move_args = MoveArgs::try_parse_from(&args)?;

    // 1. Resolve every dragged node and the drop target.
    let dragged: Vec<ResolvedNode> = move_args
        .nodes
        .iter()
        .map(|reference| commons::resolve(shelf, scope, reference))
        .collect::<Result<_>>()?;
    let target = move_args
        .onto
        .as_deref()
        .map(|reference| commons::resolve(shelf, scope, reference))
        .transpose()?;

    // 2. Everything must live in one catalog.
    let home = target
        .as_ref()
        .map(|t| t.scope)
        .or(scope)
        .or_else(|| dragged.first().map(|d| d.scope))
        .unwrap_or(commons::DEFAULT_SCOPE);
    if let Some(stranger) = dragged.iter().find(|d| d.scope != home) {
        return Err(anyhow!(
            t!("error.cross_scope"),
            node = commons::describe(stranger),
            scope = home
        ));
    }

    // 3. Move.
    let keys: Vec<_> = dragged.iter().map(|d| d.key.clone()).collect();
    let target_key = target.as_ref().map(|t| t.key.clone());
    let catalog = commons::catalog_mut(shelf, home)?;
    let moving = catalog.store().movable_roots(&keys, target_key.as_ref()).len();
    let change = commons::settle(catalog.move_subtree(&keys, target_key.as_ref()))?;

    if change.is_empty() {
        println!("{}", t!("move.info.nothing_moved").yellow());
        return Ok(());
    }
    let destination = match &target {
        Some(target) => commons::describe(target),
        None => format!(t!("move.info.top_level"), scope = home),
    };
    println!(
        "{}",
        format!(
            t!("move.success.moved"),
            count = moving,
            destination = destination.cyan()
        )
        .green()
    );
    Ok(())
}
