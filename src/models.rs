// src/models.rs

//! Core data types: scopes, run states and command nodes.

use crate::core::identity::{self, NodeKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- SCOPES ---

/// A named partition of the catalog, persisted independently.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Commands shared by every workspace.
    Global,
    /// Commands belonging to the current project.
    Workspace,
    /// Scratch commands; kept in memory only and never persisted.
    Temporary,
}

impl Scope {
    /// Every scope, in the order used whenever scopes are searched.
    pub const ALL: [Self; 3] = [Self::Global, Self::Workspace, Self::Temporary];

    /// Whether catalogs of this scope are written to storage.
    pub fn is_persistent(self) -> bool {
        !matches!(self, Self::Temporary)
    }

    /// Lowercase name, as used on the command line and in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Workspace => "workspace",
            Self::Temporary => "temp",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" | "g" => Ok(Self::Global),
            "workspace" | "ws" | "w" => Ok(Self::Workspace),
            "temp" | "temporary" | "t" => Ok(Self::Temporary),
            other => Err(format!("Unknown scope '{}'", other)),
        }
    }
}

// --- RUN STATE ---

/// Identity of a running process, issued by the process launcher.
/// Two handles are the same process if and only if they compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessHandle(u64);

impl ProcessHandle {
    /// Wraps a launcher-issued id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Run state of a leaf. The handle lives inside `Running`, so leaving that state always
/// drops it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not running; the initial state of every leaf.
    #[default]
    Stopped,
    /// Running as the given process.
    Running(ProcessHandle),
    /// The last launch failed; holds the launcher's message.
    Error(String),
}

impl RunState {
    /// The live process handle, if any.
    pub fn handle(&self) -> Option<ProcessHandle> {
        match self {
            Self::Running(handle) => Some(*handle),
            _ => None,
        }
    }
}

// --- COMMAND NODES ---

/// The launchable part of a leaf node.
#[derive(Debug, PartialEq, Eq)]
pub struct LeafCommand {
    /// The literal shell command.
    pub template: String,
    /// Tokens offered as optional additions at launch time.
    pub variables: Vec<String>,
    pub(crate) state: RunState,
}

impl LeafCommand {
    /// The current run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }
}

/// What a node is: a pure container or a launchable command.
#[derive(Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A container of other nodes.
    Group {
        /// Ordered children.
        children: Vec<CommandNode>,
    },
    /// A launchable command.
    Leaf(LeafCommand),
}

/// One entry of a catalog tree.
///
/// Nodes are deliberately not `Clone`: a running leaf exclusively owns its process
/// handle. Parents are never stored; they are found by searching the owning tree.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandNode {
    key: NodeKey,
    /// Display name.
    pub label: String,
    /// The catalog this node belongs to.
    pub scope: Scope,
    /// Group or leaf payload.
    pub kind: NodeKind,
}

impl CommandNode {
    /// Creates a stopped leaf with a fresh key. A blank label falls back to the command.
    pub fn leaf(
        scope: Scope,
        template: impl Into<String>,
        label: Option<String>,
        variables: Vec<String>,
    ) -> Self {
        let template = template.into();
        Self {
            key: identity::new_key(),
            label: label_or_command(label, &template),
            scope,
            kind: NodeKind::Leaf(LeafCommand {
                template,
                variables: clean_variables(variables),
                state: RunState::Stopped,
            }),
        }
    }

    /// Creates an empty group with a fresh key.
    pub fn group(scope: Scope, label: impl Into<String>) -> Self {
        Self {
            key: identity::new_key(),
            label: label.into(),
            scope,
            kind: NodeKind::Group {
                children: Vec::new(),
            },
        }
    }

    /// Rebuilds a node read from storage. The key may still be unassigned.
    pub(crate) fn restore(key: NodeKey, label: String, scope: Scope, kind: NodeKind) -> Self {
        Self {
            key,
            label,
            scope,
            kind,
        }
    }

    /// Adds a child to a group node under construction. Ignored for leaves.
    pub fn with_child(mut self, child: Self) -> Self {
        if let NodeKind::Group { children } = &mut self.kind {
            children.push(child);
        }
        self
    }

    /// The node's immutable key.
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub(crate) fn assign_key(&mut self, key: NodeKey) {
        self.key = key;
    }

    /// Whether this node is a group.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    /// Direct children; always empty for leaves.
    pub fn children(&self) -> &[Self] {
        match &self.kind {
            NodeKind::Group { children } => children,
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Mutable children of a group, `None` for leaves.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.kind {
            NodeKind::Group { children } => Some(children),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The launchable payload of a leaf.
    pub fn command(&self) -> Option<&LeafCommand> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Group { .. } => None,
        }
    }

    pub(crate) fn command_mut(&mut self) -> Option<&mut LeafCommand> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Group { .. } => None,
        }
    }

    /// Run state of a leaf; groups have none.
    pub fn state(&self) -> Option<&RunState> {
        self.command().map(LeafCommand::state)
    }

    /// Whether `key` is this node or one of its descendants.
    pub fn contains(&self, key: &NodeKey) -> bool {
        &self.key == key || self.children().iter().any(|child| child.contains(key))
    }

    /// Visits this node and every descendant in pre-order.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Live process handles held anywhere in this subtree.
    pub fn live_handles(&self) -> Vec<ProcessHandle> {
        let mut handles = Vec::new();
        self.visit(&mut |node| {
            if let Some(handle) = node.state().and_then(RunState::handle) {
                handles.push(handle);
            }
        });
        handles
    }
}

/// A blank label falls back to the command text.
pub(crate) fn label_or_command(label: Option<String>, command: &str) -> String {
    match label {
        Some(label) if !label.trim().is_empty() => label.trim().to_string(),
        _ => command.to_string(),
    }
}

/// Trims variable tokens and drops the empty ones.
pub(crate) fn clean_variables(variables: Vec<String>) -> Vec<String> {
    variables
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_label_defaults_to_command() {
        let node = CommandNode::leaf(Scope::Global, "npm test", None, vec![]);
        assert_eq!(node.label, "npm test");
        let blank = CommandNode::leaf(Scope::Global, "npm test", Some("  ".into()), vec![]);
        assert_eq!(blank.label, "npm test");
    }

    #[test]
    fn test_leaf_starts_stopped_without_handle() {
        let node = CommandNode::leaf(Scope::Workspace, "cargo build", None, vec![]);
        assert_eq!(node.state(), Some(&RunState::Stopped));
        assert!(node.live_handles().is_empty());
    }

    #[test]
    fn test_group_has_no_command_or_state() {
        let group = CommandNode::group(Scope::Global, "build");
        assert!(group.is_group());
        assert!(group.command().is_none());
        assert!(group.state().is_none());
    }

    #[test]
    fn test_variables_are_trimmed_and_blanks_dropped() {
        let node = CommandNode::leaf(
            Scope::Global,
            "npm run dev",
            None,
            vec![" --port 3000 ".into(), "".into(), "--open".into()],
        );
        assert_eq!(
            node.command().map(|c| c.variables.clone()),
            Some(vec!["--port 3000".to_string(), "--open".to_string()])
        );
    }

    #[test]
    fn test_contains_finds_nested_descendants() {
        let leaf = CommandNode::leaf(Scope::Global, "ls", None, vec![]);
        let leaf_key = leaf.key().clone();
        let tree = CommandNode::group(Scope::Global, "outer")
            .with_child(CommandNode::group(Scope::Global, "inner").with_child(leaf));
        assert!(tree.contains(&leaf_key));
        assert!(!tree.children()[0].children()[0].contains(tree.key()));
    }

    #[test]
    fn test_scope_parsing_accepts_short_names() {
        assert_eq!("g".parse::<Scope>(), Ok(Scope::Global));
        assert_eq!("WS".parse::<Scope>(), Ok(Scope::Workspace));
        assert_eq!("temp".parse::<Scope>(), Ok(Scope::Temporary));
        assert!("remote".parse::<Scope>().is_err());
    }
}
