//! `stop`: stops one command or all of them.

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::{cli::handlers::commons, models::Scope, state::Shelf};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Stops a running command.")]
struct StopArgs {
    /// The command to stop (key, label or path).
    #[arg(required_unless_present = "all")]
    node: Option<String>,

    /// Stop every running command.
    #[arg(long, short, conflicts_with = "node")]
    all: bool,
}

/// Handles `stop`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let stop_args = StopArgs::try_parse_from(&args)?;

    if stop_args.all {
        let (catalogs, controller) = shelf.all_and_controller();
        let stopped = controller.stop_all(catalogs);
        println!(
            "{}",
            format!(t!("stop.success.stopped_all"), count = stopped).green()
        );
        return Ok(());
    }

    let Some(reference) = stop_args.node else {
        return Ok(());
    };
    let target = commons::resolve(shelf, scope, &reference)?;
    let (catalog, controller) = shelf
        .catalog_and_controller(target.scope)
        .ok_or_else(|| anyhow!(t!("error.scope_unavailable"), scope = target.scope))?;

    if controller.stop(catalog, &target.key) {
        println!(
            "{}",
            format!(t!("stop.success.stopped"), node = commons::describe(&target)).green()
        );
    } else {
        println!(
            "{}",
            format!(t!("stop.info.not_running"), node = commons::describe(&target)).dimmed()
        );
    }
    Ok(())
}
