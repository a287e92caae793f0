// src/bin/execumate.rs

//! The `execumate` command-line entry point.

use anyhow::Result;
use clap::Parser;
use colored::*;
use execumate::{
    cli::{Cli, dispatcher},
    state::Shelf,
};

/// Entry point: sets up logging, opens the catalogs and dispatches the command line.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    log::debug!("Language: {}", env!("EXECUMATE_LANG_EFFECTIVE"));
    let mut shelf = Shelf::open()?;
    dispatcher::dispatch(cli.args, &mut shelf)
}
