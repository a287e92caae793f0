//! `delete`: removes a node and its subtree, stopping anything running inside it.

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{cli::handlers::commons, models::Scope, state::Shelf};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Deletes a command or a group with everything inside it."
)]
struct DeleteArgs {
    /// The node to delete (key, label or path).
    node: String,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

/// Handles `delete`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let delete_args = DeleteArgs::try_parse_from(&args)?;
    let target = commons::resolve(shelf, scope, &delete_args.node)?;

    // 1. Show what goes away.
    let descendants = shelf
        .catalog(target.scope)
        .and_then(|c| c.store().find_by_key(&target.key))
        .map(|node| {
            let mut count = 0usize;
            node.visit(&mut |_| count += 1);
            count - 1
        })
        .unwrap_or_default();
    println!(
        "\n{}",
        format!(
            t!("delete.warning.header"),
            node = commons::describe(&target),
            count = descendants
        )
        .red()
        .bold()
    );

    // 2. Confirm.
    if !delete_args.yes && !commons::confirm(t!("delete.prompt.confirm"), false)? {
        println!("{}", t!("common.info.cancelled").dimmed());
        return Ok(());
    }

    // 3. Delete, stopping whatever runs inside.
    let Some((catalog, controller)) = shelf.catalog_and_controller(target.scope) else {
        return Ok(());
    };
    commons::settle(controller.delete_node(catalog, &target.key))?;

    println!(
        "{}",
        format!(t!("delete.success.deleted"), node = commons::describe(&target)).green()
    );
    Ok(())
}
