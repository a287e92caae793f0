//! `add`: creates a command, from flags or through the input wizard.

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::handlers::commons,
    constants::SHORT_KEY_LEN,
    core::input_flow::{self, CommandDraft},
    models::Scope,
    state::Shelf,
    system::picker::TerminalPrompter,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Adds a command to a catalog. Without a command, asks for it step by step."
)]
struct AddArgs {
    /// Display name. Defaults to the command itself.
    #[arg(long, short)]
    label: Option<String>,

    /// Optional tokens offered when the command is launched (comma-separated).
    #[arg(long = "var", short = 'v', value_delimiter = ',')]
    variables: Vec<String>,

    /// Group to add the command to (key, label or path). Defaults to the top level.
    #[arg(long, short)]
    parent: Option<String>,

    /// The shell command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Handles `add`.
pub fn handle(scope: Option<Scope>, args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    let add_args = AddArgs::try_parse_from(&args)?;

    // 1. Collect the draft from the flags or from the wizard.
    let draft = if add_args.command.is_empty() {
        let Some(answers) =
            input_flow::run_flow(input_flow::new_command_flow(), &mut TerminalPrompter)
        else {
            println!("{}", t!("common.info.cancelled").dimmed());
            return Ok(());
        };
        match CommandDraft::from_answers(&answers) {
            Some(draft) => draft,
            None => {
                println!("{}", t!("add.info.empty_command").dimmed());
                return Ok(());
            }
        }
    } else {
        CommandDraft {
            command: add_args.command.join(" "),
            label: add_args.label.filter(|l| !l.trim().is_empty()),
            variables: add_args.variables,
        }
    };

    // 2. Resolve the destination.
    let (scope, parent) = resolve_parent(shelf, scope, add_args.parent.as_deref())?;

    // 3. Insert and save.
    let node = draft.into_node(scope);
    let key = node.key().clone();
    let label = node.label.clone();
    let catalog = commons::catalog_mut(shelf, scope)?;
    commons::settle(catalog.add_node(node, parent.as_ref()))?;

    println!(
        "{}",
        format!(
            t!("add.success.added"),
            label = label.cyan(),
            scope = scope,
            key = key.short(SHORT_KEY_LEN)
        )
        .green()
    );
    Ok(())
}

/// Destination scope and parent key for a new node. A parent fixes the scope; a
/// conflicting explicit scope is an error.
pub(crate) fn resolve_parent(
    shelf: &Shelf,
    scope: Option<Scope>,
    parent: Option<&str>,
) -> Result<(Scope, Option<crate::core::identity::NodeKey>)> {
    let Some(reference) = parent else {
        return Ok((scope.unwrap_or(commons::DEFAULT_SCOPE), None));
    };
    let parent = commons::resolve(shelf, scope, reference)?;
    if let Some(scope) = scope
        && scope != parent.scope
    {
        return Err(anyhow!(
            t!("error.cross_scope"),
            node = commons::describe(&parent),
            scope = scope
        ));
    }
    Ok((parent.scope, Some(parent.key)))
}
