//! `edit`: changes a node's label, command or variables.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    core::{
        input_flow::{self, CommandDraft},
        tree_store::NodePatch,
    },
    models::Scope,
    state::Shelf,
    system::picker::TerminalPrompter,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Edits a command or group. Without flags, opens the pre-filled wizard."
)]
struct EditArgs {
    /// The node to edit (key, label or path).
    node: String,

    /// New label. An empty label on a command falls back to the command.
    #[arg(long, short)]
    label: Option<String>,

    /// New command.
    #[arg(long, short, allow_hyphen_values = true)]
    command: Option<String>,

    /// Replaces the launch-time variables (comma-separated).
    #[arg(long = "var", short = 'v', value_delimiter = ',', conflicts_with = "clear_vars")]
    variables: Option<Vec<String>>,

    /// Removes every launch-time variable.
    #[arg(long)]
    clear_vars: bool,
}

/// Handles `edit`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let edit_args = EditArgs::try_parse_from(&args)?;
    let target = commons::resolve(shelf, scope, &edit_args.node)?;

    let mut patch = NodePatch {
        label: edit_args.label,
        command: edit_args.command,
        variables: edit_args.variables,
    };
    if edit_args.clear_vars {
        patch.variables = Some(Vec::new());
    }

    if patch.is_empty() {
        let catalog = commons::catalog_mut(shelf, target.scope)?;
        let Some(node) = catalog.store().find_by_key(&target.key) else {
            return Ok(());
        };
        let is_group = node.is_group();
        let flow = match input_flow::edit_command_flow(node) {
            Some(flow) => flow,
            None => input_flow::edit_group_flow(node),
        };
        let Some(answers) = input_flow::run_flow(flow, &mut TerminalPrompter) else {
            println!("{}", t!("common.info.cancelled").dimmed());
            return Ok(());
        };
        let wizard_patch = if is_group {
            input_flow::group_label(&answers).map(|label| NodePatch {
                label: Some(label),
                ..NodePatch::default()
            })
        } else {
            CommandDraft::from_answers(&answers).map(CommandDraft::into_patch)
        };
        match wizard_patch {
            Some(wizard_patch) => patch = wizard_patch,
            None => {
                println!("{}", t!("edit.info.unchanged").dimmed());
                return Ok(());
            }
        }
    }

    let catalog = commons::catalog_mut(shelf, target.scope)?;
    commons::settle(catalog.edit_node(&target.key, patch))?;
    let label = catalog
        .store()
        .find_by_key(&target.key)
        .map(|n| n.label.clone())
        .unwrap_or_default();

    println!(
        "{}",
        format!(t!("edit.success.updated"), label = label.cyan()).green()
    );
    Ok(())
}
