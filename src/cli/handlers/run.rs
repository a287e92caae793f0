//! `run` and `rerun`.

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::{
    cli::handlers::commons,
    core::execution::RunOutcome,
    models::Scope,
    state::Shelf,
    system::picker::TerminalPicker,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs a command. Outside a session it runs in the foreground until it exits."
)]
struct RunArgs {
    /// The command to run (key, label or path).
    node: String,
}

/// Handles `run`, prompting for variables when the command has any.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let target = commons::resolve(shelf, scope, &run_args.node)?;
    let foreground = !shelf.in_session();

    let (catalog, controller) = shelf
        .catalog_and_controller(target.scope)
        .ok_or_else(|| anyhow!(t!("error.scope_unavailable"), scope = target.scope))?;
    controller.launcher_mut().attach_stdin(foreground);
    let mut picker = TerminalPicker::new(target.label.clone());
    let report = controller.run_with(catalog, &target.key, &mut picker);

    if let Some(error) = &report.save_error {
        commons::warn_not_saved(error);
    }
    finish(shelf, report.outcome, foreground)
}

/// Handles `rerun`: restarts the bare command.
pub fn handle_rerun(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let target = commons::resolve(shelf, scope, &run_args.node)?;
    let foreground = !shelf.in_session();

    let (catalog, controller) = shelf
        .catalog_and_controller(target.scope)
        .ok_or_else(|| anyhow!(t!("error.scope_unavailable"), scope = target.scope))?;
    controller.launcher_mut().attach_stdin(foreground);
    let outcome = controller.rerun(catalog, &target.key);
    finish(shelf, outcome, foreground)
}

/// Reports the outcome; in the foreground, waits for the process and marks the node
/// stopped again.
fn finish(shelf: &mut Shelf, outcome: RunOutcome, foreground: bool) -> Result<()> {
    let (key, handle) = match outcome {
        RunOutcome::Launched { key, handle } => (key, handle),
        RunOutcome::Failed { reason, .. } => {
            return Err(anyhow!(t!("run.error.failed"), reason = reason));
        }
        RunOutcome::Skipped | RunOutcome::AwaitingSelection(_) => {
            println!("{}", t!("run.info.skipped").dimmed());
            return Ok(());
        }
    };

    let label = shelf
        .catalogs()
        .iter()
        .find_map(|c| c.store().find_by_key(&key))
        .map(|n| n.label.clone())
        .unwrap_or_default();

    if !foreground {
        println!(
            "{}",
            format!(t!("run.success.started"), label = label.cyan()).green()
        );
        return Ok(());
    }

    println!("{}", format!(t!("run.info.running"), label = label.cyan()).dimmed());
    let status = shelf.controller_mut().launcher_mut().wait(handle)?;
    let (catalogs, controller) = shelf.all_and_controller();
    controller.on_external_close(catalogs, handle);

    match status {
        Some(status) if !status.success() => {
            Err(anyhow!(t!("run.error.exit_status"), label = label, status = status))
        }
        _ => Ok(()),
    }
}
