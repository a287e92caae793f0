//! Routes `[scope] <action> [args...]` to the matching handler.
//!
//! Anything that is neither a scope nor a registered action is treated as a node
//! reference and run.

use anyhow::Result;

use crate::{cli::handlers, models::Scope, state::Shelf};

// --- Command Definition and Registry ---

/// A CLI action, its aliases and its handler. Handlers receive the optional scope that
/// preceded the action and their own arguments.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Option<Scope>, Vec<String>, &mut Shelf) -> Result<()>,
}

static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "add",
        aliases: &["new"],
        handler: handlers::add::handle,
    },
    CommandDefinition {
        name: "group",
        aliases: &["mkgroup"],
        handler: handlers::group::handle,
    },
    CommandDefinition {
        name: "edit",
        aliases: &[],
        handler: handlers::edit::handle,
    },
    CommandDefinition {
        name: "delete",
        aliases: &["rm", "del"],
        handler: handlers::delete::handle,
    },
    CommandDefinition {
        name: "move",
        aliases: &["mv"],
        handler: handlers::reparent::handle,
    },
    CommandDefinition {
        name: "tree",
        aliases: &["ls"],
        handler: handlers::tree::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "rerun",
        aliases: &[],
        handler: handlers::run::handle_rerun,
    },
    CommandDefinition {
        name: "stop",
        aliases: &[],
        handler: handlers::stop::handle,
    },
    CommandDefinition {
        name: "session",
        aliases: &["start"],
        handler: handlers::session::handle,
    },
];

fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Names of every action and alias, for completion and help.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMAND_REGISTRY
        .iter()
        .flat_map(|cmd| std::iter::once(cmd.name).chain(cmd.aliases.iter().copied()))
}

/// How a command line is routed.
#[derive(Debug, PartialEq, Eq)]
struct Route {
    command: &'static str,
    scope: Option<Scope>,
    args: Vec<String>,
}

/// Applies the grammar `[scope] <action> [args...]`:
/// 1. `<action> [args...]`
/// 2. `<scope> <action> [args...]`
/// 3. `<scope>` alone lists that scope
/// 4. `[scope] <node> [args...]` is a shortcut for `run`
/// 5. no arguments lists every scope
fn route(all_args: &[String]) -> Route {
    let Some((first, rest)) = all_args.split_first() else {
        return Route {
            command: "tree",
            scope: None,
            args: Vec::new(),
        };
    };

    if let Some(command) = find_command(first) {
        return Route {
            command: command.name,
            scope: None,
            args: rest.to_vec(),
        };
    }

    if let Ok(scope) = first.parse::<Scope>() {
        return match rest.split_first() {
            Some((second, params)) => match find_command(second) {
                Some(command) => Route {
                    command: command.name,
                    scope: Some(scope),
                    args: params.to_vec(),
                },
                None => Route {
                    command: "run",
                    scope: Some(scope),
                    args: rest.to_vec(),
                },
            },
            None => Route {
                command: "tree",
                scope: Some(scope),
                args: Vec::new(),
            },
        };
    }

    Route {
        command: "run",
        scope: None,
        args: all_args.to_vec(),
    }
}

/// Routes a command line to its handler.
pub fn dispatch(all_args: Vec<String>, shelf: &mut Shelf) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);
    let route = route(&all_args);
    log::debug!("Routed to {:?}", route);

    match find_command(route.command) {
        Some(command) => (command.handler)(route.scope, route.args, shelf),
        None => handlers::run::handle(route.scope, route.args, shelf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_action_first() {
        let r = route(&args("rm abc --yes"));
        assert_eq!(r.command, "delete");
        assert_eq!(r.scope, None);
        assert_eq!(r.args, args("abc --yes"));
    }

    #[test]
    fn test_scope_then_action() {
        let r = route(&args("ws add npm test"));
        assert_eq!(r.command, "add");
        assert_eq!(r.scope, Some(Scope::Workspace));
        assert_eq!(r.args, args("npm test"));
    }

    #[test]
    fn test_bare_reference_runs() {
        assert_eq!(route(&args("tests")).command, "run");
        let scoped = route(&args("global tests"));
        assert_eq!(scoped.command, "run");
        assert_eq!(scoped.scope, Some(Scope::Global));
        assert_eq!(scoped.args, args("tests"));
    }

    #[test]
    fn test_scope_alone_and_empty_list_trees() {
        let r = route(&args("temp"));
        assert_eq!((r.command, r.scope), ("tree", Some(Scope::Temporary)));
        assert_eq!(route(&[]).command, "tree");
    }

    #[test]
    fn test_every_name_is_routable() {
        for name in command_names() {
            assert!(find_command(name).is_some(), "{name}");
        }
    }
}
