//! Interactive session (`execumate session`).
//!
//! Reads command lines in a loop and routes them through the normal dispatcher. Unlike
//! single invocations, commands started here keep running in the background until they
//! exit, are stopped, or the session ends. Exited processes are reaped before every prompt.

use anyhow::{Result, anyhow};
use colored::*;
use dialoguer::{Input, theme::ColorfulTheme};

use crate::{
    cli::dispatcher,
    models::Scope,
    state::Shelf,
};

const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// Handles `session`: runs the REPL until the user quits.
pub fn handle(_scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    if !args.is_empty() {
        return Err(anyhow!(t!("session.error.no_arguments")));
    }
    if shelf.in_session() {
        return Err(anyhow!(t!("session.error.nested")));
    }

    shelf.set_in_session(true);
    println!("{}", t!("session.info.welcome").bold());
    let result = repl(shelf);

    // Nothing outlives the session.
    let (catalogs, controller) = shelf.all_and_controller();
    let stopped = controller.stop_all(catalogs);
    if stopped > 0 {
        println!(
            "{}",
            format!(t!("stop.success.stopped_all"), count = stopped).dimmed()
        );
    }
    shelf.set_in_session(false);
    result
}

fn repl(shelf: &mut Shelf) -> Result<()> {
    loop {
        report_exited(shelf);

        let line = match Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("session.prompt"))
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                log::debug!("Session input closed: {}", e);
                return Ok(());
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&line) {
            return Ok(());
        }
        if line == "help" {
            let names: Vec<&str> = dispatcher::command_names().collect();
            println!("{}", format!(t!("session.info.commands"), names = names.join(", ")).dimmed());
            continue;
        }

        let Some(args) = shlex::split(line) else {
            eprintln!("{}: {}", "Error".red().bold(), t!("session.error.unbalanced_quotes"));
            continue;
        };
        if let Err(e) = dispatcher::dispatch(args, shelf) {
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
    }
}

fn report_exited(shelf: &mut Shelf) {
    let (catalogs, controller) = shelf.all_and_controller();
    let exited = controller.reap(catalogs);
    for (scope, key) in exited {
        let label = shelf
            .catalog(scope)
            .and_then(|c| c.store().find_by_key(&key))
            .map(|n| n.label.clone())
            .unwrap_or_else(|| key.to_string());
        println!(
            "{}",
            format!(t!("session.info.exited"), label = label, scope = scope).dimmed()
        );
    }
}
