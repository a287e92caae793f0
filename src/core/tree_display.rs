// src/core/tree_display.rs

//! Text rendering of a catalog tree.

use crate::constants::SHORT_KEY_LEN;
use crate::core::tree_store::TreeStore;
use crate::models::{CommandNode, RunState};

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Print the short key next to every node.
    pub show_keys: bool,
    /// Deepest level printed; roots are level 0.
    pub max_depth: Option<usize>,
}

/// Renders a forest with box-drawing connectors, one node per line.
pub fn render_tree(store: &TreeStore, options: DisplayOptions) -> String {
    let mut out = String::new();
    let roots = store.roots();
    for (i, root) in roots.iter().enumerate() {
        render_node(root, "", i == roots.len() - 1, 0, options, &mut out);
    }
    out
}

/// Single-character marker of a node's kind and run state.
pub fn state_marker(node: &CommandNode) -> &'static str {
    match node.state() {
        None => "▸",
        Some(RunState::Stopped) => "○",
        Some(RunState::Running(_)) => "●",
        Some(RunState::Error(_)) => "✗",
    }
}

fn render_node(
    node: &CommandNode,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: DisplayOptions,
    out: &mut String,
) {
    let connector = if is_last { "└─" } else { "├─" };
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(state_marker(node));
    out.push(' ');
    out.push_str(&node.label);

    if let Some(leaf) = node.command()
        && leaf.template != node.label
    {
        out.push_str(&format!(" ({})", leaf.template));
    }
    if let Some(leaf) = node.command()
        && !leaf.variables.is_empty()
    {
        out.push_str(&format!(" [{}]", leaf.variables.join(" | ")));
    }
    if options.show_keys {
        out.push_str(&format!(" #{}", node.key().short(SHORT_KEY_LEN)));
    }
    out.push('\n');

    let children = node.children();
    if children.is_empty() {
        return;
    }
    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    if options.max_depth.is_some_and(|max| depth >= max) {
        out.push_str(&format!("{}└─… {}\n", child_prefix, children.len()));
        return;
    }
    for (i, child) in children.iter().enumerate() {
        render_node(child, &child_prefix, i == children.len() - 1, depth + 1, options, out);
    }
}
