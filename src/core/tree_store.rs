// src/core/tree_store.rs

//! The in-memory forest of one catalog.

use crate::core::identity::NodeKey;
use crate::models::{self, CommandNode, ProcessHandle, RunState};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by structural operations on a [`TreeStore`].
/// Every failing operation leaves the forest untouched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// A node was asked to adopt children but it is a leaf.
    #[error("Node '{key}' is not a group and cannot contain other nodes.")]
    InvalidParent {
        /// The leaf that was used as a parent.
        key: NodeKey,
    },
    /// A referenced node does not exist in this forest.
    #[error("Node '{key}' was not found.")]
    NotFound {
        /// The missing key.
        key: NodeKey,
    },
    /// Inserting the node would give two nodes the same key.
    #[error("Key '{key}' is already used by another node.")]
    DuplicateKey {
        /// The colliding key.
        key: NodeKey,
    },
    /// A command or variables were given for a group.
    #[error("Node '{key}' is a group; groups only have a label.")]
    NotALeaf {
        /// The group that was patched.
        key: NodeKey,
    },
    /// A group label or a command cannot be blank.
    #[error("A blank value was given for a required field of node '{key}'.")]
    BlankField {
        /// The node being edited.
        key: NodeKey,
    },
}

type TreeResult<T> = Result<T, TreeError>;

/// Which nodes a mutation touched, for persistence and view refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Anything may have changed; refresh everything.
    All,
    /// Exactly these nodes changed (deduplicated, in first-seen order).
    Nodes(Vec<NodeKey>),
}

impl Change {
    /// Builds a `Nodes` change, skipping absent entries and duplicates.
    pub fn nodes<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Option<NodeKey>>,
    {
        let mut seen = HashSet::new();
        let keys = keys
            .into_iter()
            .flatten()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        Self::Nodes(keys)
    }

    /// A change that touched nothing.
    pub fn none() -> Self {
        Self::Nodes(Vec::new())
    }

    /// Whether nothing was touched.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Nodes(keys) if keys.is_empty())
    }
}

/// In-place update of a node's editable fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    /// New label. Blank resets a leaf's label to its command.
    pub label: Option<String>,
    /// New command (leaves only).
    pub command: Option<String>,
    /// New variables (leaves only).
    pub variables: Option<Vec<String>>,
}

impl NodePatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.command.is_none() && self.variables.is_none()
    }
}

/// The forest of command nodes of one scope.
///
/// The store exclusively owns every node. Parent links are not stored anywhere; they
/// are recomputed by searching the forest, so no reference can go stale after a move.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TreeStore {
    roots: Vec<CommandNode>,
}

impl TreeStore {
    /// An empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-built forest. Callers are responsible for key uniqueness;
    /// the persistence layer guarantees it with its back-fill pass.
    pub fn from_roots(roots: Vec<CommandNode>) -> Self {
        Self { roots }
    }

    /// Top-level nodes in order.
    pub fn roots(&self) -> &[CommandNode] {
        &self.roots
    }

    /// Whether the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every node of the forest in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandNode> {
        let mut nodes = Vec::new();
        for root in &self.roots {
            root.visit(&mut |node| nodes.push(node));
        }
        nodes.into_iter()
    }

    /// Total number of nodes, groups included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Inserts `node` as the last child of `parent`, or as the last root.
    ///
    /// # Errors
    /// `NotFound` if `parent` does not exist, `InvalidParent` if it is a leaf and
    /// `DuplicateKey` if any key of the inserted subtree is already taken.
    pub fn add_node(&mut self, node: CommandNode, parent: Option<&NodeKey>) -> TreeResult<Change> {
        self.check_keys_available(&node)?;
        let key = node.key().clone();

        match parent {
            Some(parent_key) => {
                let parent_node = self
                    .find_by_key_mut(parent_key)
                    .ok_or_else(|| TreeError::NotFound {
                        key: parent_key.clone(),
                    })?;
                let children = parent_node
                    .children_mut()
                    .ok_or_else(|| TreeError::InvalidParent {
                        key: parent_key.clone(),
                    })?;
                children.push(node);
            }
            None => self.roots.push(node),
        }

        log::debug!("Added node {} under {:?}", key, parent.map(NodeKey::as_str));
        Ok(Change::nodes([Some(key), parent.cloned()]))
    }

    /// Depth-first search for a node; `None` is a normal result.
    pub fn find_by_key(&self, key: &NodeKey) -> Option<&CommandNode> {
        find_in(&self.roots, key)
    }

    pub(crate) fn find_by_key_mut(&mut self, key: &NodeKey) -> Option<&mut CommandNode> {
        find_in_mut(&mut self.roots, key)
    }

    /// The group whose children contain `key`, or `None` for roots and unknown keys.
    pub fn get_parent(&self, key: &NodeKey) -> Option<&CommandNode> {
        parent_in(&self.roots, key)
    }

    /// The leaf currently holding `handle`.
    pub(crate) fn find_by_handle_mut(&mut self, handle: ProcessHandle) -> Option<&mut CommandNode> {
        find_by_handle_in(&mut self.roots, handle)
    }

    /// Detaches a node (with its subtree) from wherever it sits and hands it back.
    /// Unknown keys are a no-op.
    pub fn remove_node(&mut self, key: &NodeKey) -> Option<CommandNode> {
        detach_from(&mut self.roots, key)
    }

    /// Removes a node and its whole subtree, handing every live process handle in it
    /// to `dispose` first.
    pub fn delete_node(
        &mut self,
        key: &NodeKey,
        mut dispose: impl FnMut(ProcessHandle),
    ) -> TreeResult<Change> {
        let node = self
            .find_by_key(key)
            .ok_or_else(|| TreeError::NotFound { key: key.clone() })?;
        for handle in node.live_handles() {
            dispose(handle);
        }
        self.remove_node(key);
        log::debug!("Deleted node {} and its subtree", key);
        Ok(Change::All)
    }

    /// Updates a node's label, command or variables in place.
    ///
    /// A blank label on a leaf falls back to its (possibly new) command. Groups only
    /// accept a non-blank label.
    pub fn edit_node(&mut self, key: &NodeKey, patch: NodePatch) -> TreeResult<Change> {
        let node = self
            .find_by_key_mut(key)
            .ok_or_else(|| TreeError::NotFound { key: key.clone() })?;

        if node.is_group() {
            if patch.command.is_some() || patch.variables.is_some() {
                return Err(TreeError::NotALeaf { key: key.clone() });
            }
            if let Some(label) = patch.label {
                if label.trim().is_empty() {
                    return Err(TreeError::BlankField { key: key.clone() });
                }
                node.label = label.trim().to_string();
            }
            return Ok(Change::nodes([Some(key.clone())]));
        }

        if matches!(&patch.command, Some(command) if command.trim().is_empty()) {
            return Err(TreeError::BlankField { key: key.clone() });
        }

        let label = patch.label;
        let Some(leaf) = node.command_mut() else {
            return Err(TreeError::NotALeaf { key: key.clone() });
        };
        if let Some(command) = patch.command {
            leaf.template = command.trim().to_string();
        }
        if let Some(variables) = patch.variables {
            leaf.variables = models::clean_variables(variables);
        }
        let template = leaf.template.clone();
        if let Some(label) = label {
            node.label = models::label_or_command(Some(label), &template);
        }

        log::debug!("Edited node {}", key);
        Ok(Change::nodes([Some(key.clone())]))
    }

    /// Reparents dragged nodes onto `target` (drag-and-drop semantics).
    ///
    /// 1. The dragged set is reduced to its local roots: a node with a dragged
    ///    ancestor travels with that ancestor.
    /// 2. A root that is `target` itself or an ancestor of it is skipped; this is what
    ///    keeps the forest acyclic.
    /// 3. Each remaining root is detached and then appended to `target` if it is a
    ///    group, inserted right after `target` among its siblings if it is a leaf, or
    ///    appended to the root list when there is no target. Roots keep their relative
    ///    forest order.
    ///
    /// Unknown dragged keys are ignored. Returns the affected set: each root, its
    /// original parent and the target. An empty change means nothing moved.
    ///
    /// # Errors
    /// `NotFound` if `target` is given but does not exist; nothing is moved then.
    pub fn move_subtree(
        &mut self,
        keys: &[NodeKey],
        target: Option<&NodeKey>,
    ) -> TreeResult<Change> {
        let target_is_group = match target {
            Some(target_key) => self
                .find_by_key(target_key)
                .map(CommandNode::is_group)
                .ok_or_else(|| TreeError::NotFound {
                    key: target_key.clone(),
                })?,
            None => false,
        };

        let roots = self.movable_roots(keys, target);
        if roots.is_empty() {
            log::debug!("Move request produced no movable nodes");
            return Ok(Change::none());
        }

        let original_parents: Vec<Option<NodeKey>> = roots
            .iter()
            .map(|key| self.get_parent(key).map(|p| p.key().clone()))
            .collect();

        for (inserted, key) in roots.iter().enumerate() {
            let Some(node) = self.remove_node(key) else {
                continue;
            };
            match target {
                Some(target_key) if target_is_group => {
                    if let Some(children) = self
                        .find_by_key_mut(target_key)
                        .and_then(CommandNode::children_mut)
                    {
                        children.push(node);
                    }
                }
                Some(target_key) => match locate_in_mut(&mut self.roots, target_key) {
                    Some((siblings, position)) => {
                        let at = (position + 1 + inserted).min(siblings.len());
                        siblings.insert(at, node);
                    }
                    None => self.roots.push(node),
                },
                None => self.roots.push(node),
            }
        }

        log::debug!(
            "Moved {} node(s) onto {:?}",
            roots.len(),
            target.map(NodeKey::as_str)
        );

        let affected = original_parents
            .into_iter()
            .chain(roots.into_iter().map(Some))
            .chain(std::iter::once(target.cloned()));
        Ok(Change::nodes(affected))
    }

    /// Local roots of the dragged set that may legally move onto `target`, in forest order.
    /// These are exactly the nodes [`move_subtree`](Self::move_subtree) detaches.
    pub fn movable_roots(&self, keys: &[NodeKey], target: Option<&NodeKey>) -> Vec<NodeKey> {
        let dragged: HashSet<&NodeKey> = keys
            .iter()
            .filter(|key| self.find_by_key(key).is_some())
            .collect();

        self.iter()
            .filter(|node| dragged.contains(node.key()))
            .filter(|node| !self.has_dragged_ancestor(node.key(), &dragged))
            .filter(|node| match target {
                Some(target_key) => {
                    let forbidden = node.contains(target_key);
                    if forbidden {
                        log::debug!(
                            "Skipping move of {}: target {} is the node or one of its descendants",
                            node.key(),
                            target_key
                        );
                    }
                    !forbidden
                }
                None => true,
            })
            .map(|node| node.key().clone())
            .collect()
    }

    fn has_dragged_ancestor(&self, key: &NodeKey, dragged: &HashSet<&NodeKey>) -> bool {
        let mut current = self.get_parent(key);
        while let Some(parent) = current {
            if dragged.contains(parent.key()) {
                return true;
            }
            current = self.get_parent(parent.key());
        }
        false
    }

    /// Sets the run state of a leaf. Returns `false` for groups and unknown keys.
    pub(crate) fn set_state(&mut self, key: &NodeKey, state: RunState) -> bool {
        match self.find_by_key_mut(key).and_then(CommandNode::command_mut) {
            Some(leaf) => {
                leaf.state = state;
                true
            }
            None => false,
        }
    }

    fn check_keys_available(&self, node: &CommandNode) -> TreeResult<()> {
        let mut taken: HashSet<&NodeKey> = self.iter().map(CommandNode::key).collect();
        let mut result = Ok(());
        node.visit(&mut |n| {
            if result.is_ok() && !taken.insert(n.key()) {
                result = Err(TreeError::DuplicateKey { key: n.key().clone() });
            }
        });
        result
    }
}

fn find_in<'a>(nodes: &'a [CommandNode], key: &NodeKey) -> Option<&'a CommandNode> {
    nodes.iter().find_map(|node| {
        if node.key() == key {
            Some(node)
        } else {
            find_in(node.children(), key)
        }
    })
}

fn find_in_mut<'a>(nodes: &'a mut [CommandNode], key: &NodeKey) -> Option<&'a mut CommandNode> {
    for node in nodes.iter_mut() {
        if node.key() == key {
            return Some(node);
        }
        if let Some(children) = node.children_mut()
            && let Some(found) = find_in_mut(children, key)
        {
            return Some(found);
        }
    }
    None
}

fn parent_in<'a>(nodes: &'a [CommandNode], key: &NodeKey) -> Option<&'a CommandNode> {
    for node in nodes {
        if node.children().iter().any(|child| child.key() == key) {
            return Some(node);
        }
        if let Some(parent) = parent_in(node.children(), key) {
            return Some(parent);
        }
    }
    None
}

fn find_by_handle_in(nodes: &mut [CommandNode], handle: ProcessHandle) -> Option<&mut CommandNode> {
    for node in nodes.iter_mut() {
        if node.state().and_then(RunState::handle) == Some(handle) {
            return Some(node);
        }
        if let Some(children) = node.children_mut()
            && let Some(found) = find_by_handle_in(children, handle)
        {
            return Some(found);
        }
    }
    None
}

/// The sibling list holding `key` and the node's position in it.
fn locate_in_mut<'a>(
    nodes: &'a mut Vec<CommandNode>,
    key: &NodeKey,
) -> Option<(&'a mut Vec<CommandNode>, usize)> {
    if let Some(position) = nodes.iter().position(|node| node.key() == key) {
        return Some((nodes, position));
    }
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut()
            && let Some(found) = locate_in_mut(children, key)
        {
            return Some(found);
        }
    }
    None
}

fn detach_from(nodes: &mut Vec<CommandNode>, key: &NodeKey) -> Option<CommandNode> {
    if let Some(position) = nodes.iter().position(|node| node.key() == key) {
        return Some(nodes.remove(position));
    }
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut()
            && let Some(found) = detach_from(children, key)
        {
            return Some(found);
        }
    }
    None
}
