//! `tree`: prints the catalogs.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    core::tree_display::{self, DisplayOptions},
    models::Scope,
    state::Shelf,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Displays the catalogs as trees.")]
struct TreeArgs {
    /// Show the short key of every node.
    #[arg(long, short)]
    keys: bool,

    /// Limit the depth of the tree display.
    #[arg(long, short)]
    depth: Option<usize>,
}

/// Handles `tree`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let tree_args = TreeArgs::try_parse_from(&args)?;
    let options = DisplayOptions {
        show_keys: tree_args.keys,
        max_depth: tree_args.depth,
    };

    let explicit = scope.is_some();
    let scopes: Vec<Scope> = match scope {
        Some(scope) => vec![scope],
        None => Scope::ALL.to_vec(),
    };
    for scope in scopes {
        let Some(catalog) = shelf.catalog(scope) else {
            continue;
        };
        // An empty temporary scope is only listed when asked for.
        if scope == Scope::Temporary && catalog.store().is_empty() && !explicit {
            continue;
        }
        println!(
            "\n{}",
            format!(t!("tree.header.scope"), scope = scope).bold().yellow()
        );
        if catalog.store().is_empty() {
            println!("   {}", t!("tree.info.empty").dimmed());
        } else {
            print!("{}", tree_display::render_tree(catalog.store(), options));
        }
    }
    Ok(())
}
