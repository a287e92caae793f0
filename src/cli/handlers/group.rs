//! `group`: creates an empty group.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::{add::resolve_parent, commons},
    constants::SHORT_KEY_LEN,
    core::input_flow,
    models::{CommandNode, Scope},
    state::Shelf,
    system::picker::TerminalPrompter,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Creates an empty group.")]
struct GroupArgs {
    /// Group to nest the new group in.
    #[arg(long, short)]
    parent: Option<String>,

    /// The group label. Asked interactively when omitted.
    #[arg(trailing_var_arg = true)]
    label: Vec<String>,
}

/// Handles `group`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let group_args = GroupArgs::try_parse_from(&args)?;

    let label = if group_args.label.is_empty() {
        input_flow::run_flow(input_flow::group_flow(), &mut TerminalPrompter)
            .and_then(|answers| input_flow::group_label(&answers))
    } else {
        Some(group_args.label.join(" ").trim().to_string()).filter(|l| !l.is_empty())
    };
    let Some(label) = label else {
        println!("{}", t!("common.info.cancelled").dimmed());
        return Ok(());
    };

    let (scope, parent) = resolve_parent(shelf, scope, group_args.parent.as_deref())?;
    let node = CommandNode::group(scope, label.clone());
    let key = node.key().clone();
    let catalog = commons::catalog_mut(shelf, scope)?;
    commons::settle(catalog.add_node(node, parent.as_ref()))?;

    println!(
        "{}",
        format!(
            t!("group.success.created"),
            label = label.cyan(),
            scope = scope,
            key = key.short(SHORT_KEY_LEN)
        )
        .green()
    );
    Ok(())
}
