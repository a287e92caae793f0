// src/core/execution.rs

//! Run lifecycle of leaf nodes.
//!
//! `Stopped --run--> Running --stop--> Stopped`, `Running --rerun--> Running` and
//! `Running --exited--> Stopped`. A failed launch leaves the leaf in `Error` until the
//! next run or rerun. Process handles only ever live inside [`RunState::Running`].

use crate::core::catalog::{Catalog, CatalogError};
use crate::core::identity::NodeKey;
use crate::core::tree_store::Change;
use crate::models::{CommandNode, ProcessHandle, RunState, Scope};
use thiserror::Error;

/// The distinguished picker choice that saves the resolved command as a new node.
pub const SAVE_CHOICE: &str = t!("run.choice.save");

/// Failure to start a process.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The resolved command is blank.
    #[error("No command specified to run.")]
    EmptyCommand,
    /// The shell prefix or command has unbalanced quoting.
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    /// The operating system refused to start the process.
    #[error("Command '{command}' could not be started: {source}")]
    Spawn {
        /// The command line that failed.
        command: String,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// Starts and disposes external processes.
pub trait ProcessLauncher {
    /// Starts `command`, labelled `label`, and returns its handle.
    fn spawn(&mut self, label: &str, command: &str) -> Result<ProcessHandle, LaunchError>;
    /// Terminates the process behind `handle`. Unknown handles are ignored.
    fn dispose(&mut self, handle: ProcessHandle);
    /// Handles of processes that ended on their own since the last poll.
    fn poll_exited(&mut self) -> Vec<ProcessHandle>;
}

/// Lets the user choose launch-time variables.
pub trait VariablePicker {
    /// Returns the chosen tokens (options and special choices mixed), or `None` if the
    /// user cancelled.
    fn pick_many(
        &mut self,
        options: &[String],
        special_choices: &[String],
    ) -> Option<Vec<String>>;
}

/// A pending variable selection. Holds keys, not references, so the catalog stays
/// freely mutable while the user is choosing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePrompt {
    /// Catalog holding the leaf.
    pub scope: Scope,
    /// The leaf being run.
    pub key: NodeKey,
    /// Its label, for the picker title.
    pub label: String,
    /// The leaf's variables, in order.
    pub options: Vec<String>,
    /// Extra choices listed after the variables, such as [`SAVE_CHOICE`].
    pub special_choices: Vec<String>,
}

/// Result of a run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was launched: a group, an empty command, an unknown key or a cancelled
    /// selection.
    Skipped,
    /// `key` is now running. It differs from the requested node when the resolved
    /// command was saved as a new node.
    Launched {
        /// The running leaf.
        key: NodeKey,
        /// Its process.
        handle: ProcessHandle,
    },
    /// The launcher refused the command; `key` is now in `Error`.
    Failed {
        /// The leaf now in `Error`.
        key: NodeKey,
        /// The launcher's message.
        reason: String,
    },
    /// Variables must be chosen first; see [`ExecutionController::complete_selection`].
    AwaitingSelection(VariablePrompt),
}

/// Result of a variable selection. A failure to store the saved node is reported
/// alongside the launch outcome; the launch still happens.
#[derive(Debug)]
pub struct SelectionReport {
    /// What happened to the run.
    pub outcome: RunOutcome,
    /// Set when the "save" choice added a node that could not be written.
    pub save_error: Option<CatalogError>,
}

impl SelectionReport {
    fn plain(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            save_error: None,
        }
    }
}

/// Appends the selected tokens to `template`, separated by single spaces.
/// Special choices are never treated as variables.
pub fn resolve_command(template: &str, selected: &[String], special_choices: &[String]) -> String {
    let tokens: Vec<&str> = selected
        .iter()
        .filter(|token| !special_choices.contains(token))
        .map(String::as_str)
        .collect();
    if tokens.is_empty() {
        template.to_string()
    } else {
        format!("{} {}", template, tokens.join(" "))
    }
}

/// Drives the run state of leaves through a [`ProcessLauncher`].
#[derive(Debug)]
pub struct ExecutionController<L: ProcessLauncher> {
    launcher: L,
}

impl<L: ProcessLauncher> ExecutionController<L> {
    /// Creates a controller that launches through `launcher`.
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    /// The process launcher.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Mutable access to the process launcher.
    pub fn launcher_mut(&mut self) -> &mut L {
        &mut self.launcher
    }

    /// Starts a leaf. Leaves with variables return a prompt instead of launching.
    pub fn run(&mut self, catalog: &mut Catalog, key: &NodeKey) -> RunOutcome {
        let Some(node) = catalog.store().find_by_key(key) else {
            log::debug!("Run skipped: node {} not found", key);
            return RunOutcome::Skipped;
        };
        let Some(leaf) = node.command() else {
            return RunOutcome::Skipped;
        };
        if leaf.template.trim().is_empty() {
            return RunOutcome::Skipped;
        }

        if leaf.variables.is_empty() {
            let template = leaf.template.clone();
            return self.launch(catalog, key, &template);
        }

        let prompt = VariablePrompt {
            scope: catalog.scope(),
            key: key.clone(),
            label: node.label.clone(),
            options: leaf.variables.clone(),
            special_choices: vec![SAVE_CHOICE.to_string()],
        };
        if matches!(leaf.state(), RunState::Error(_)) {
            self.set_state(catalog, key, RunState::Stopped);
        }
        RunOutcome::AwaitingSelection(prompt)
    }

    /// Finishes a run that was waiting for variables. `None` means the user cancelled.
    pub fn complete_selection(
        &mut self,
        catalog: &mut Catalog,
        prompt: &VariablePrompt,
        selection: Option<Vec<String>>,
    ) -> SelectionReport {
        let Some(selected) = selection else {
            log::debug!("Variable selection for {} cancelled", prompt.key);
            return SelectionReport::plain(RunOutcome::Skipped);
        };
        // The node may have been edited or deleted while the prompt was open.
        let Some(template) = catalog
            .store()
            .find_by_key(&prompt.key)
            .and_then(CommandNode::command)
            .map(|leaf| leaf.template.clone())
        else {
            return SelectionReport::plain(RunOutcome::Skipped);
        };

        let resolved = resolve_command(&template, &selected, &prompt.special_choices);
        if !selected.iter().any(|token| token == SAVE_CHOICE) {
            return SelectionReport::plain(self.launch(catalog, &prompt.key, &resolved));
        }

        let parent = catalog
            .store()
            .get_parent(&prompt.key)
            .map(|parent| parent.key().clone());
        let saved = CommandNode::leaf(catalog.scope(), resolved.clone(), None, Vec::new());
        let saved_key = saved.key().clone();
        let save_error = match catalog.add_node(saved, parent.as_ref()) {
            Ok(_) => None,
            Err(err @ CatalogError::Persist { .. }) => Some(err),
            Err(err) => {
                log::error!("Could not add the saved command '{}': {}", resolved, err);
                return SelectionReport {
                    outcome: RunOutcome::Skipped,
                    save_error: Some(err),
                };
            }
        };
        log::debug!("Saved '{}' as node {}", resolved, saved_key);

        SelectionReport {
            outcome: self.launch(catalog, &saved_key, &resolved),
            save_error,
        }
    }

    /// [`run`](Self::run) followed by a synchronous selection through `picker`.
    pub fn run_with(
        &mut self,
        catalog: &mut Catalog,
        key: &NodeKey,
        picker: &mut dyn VariablePicker,
    ) -> SelectionReport {
        match self.run(catalog, key) {
            RunOutcome::AwaitingSelection(prompt) => {
                let selection = picker.pick_many(&prompt.options, &prompt.special_choices);
                self.complete_selection(catalog, &prompt, selection)
            }
            outcome => SelectionReport::plain(outcome),
        }
    }

    /// Launches `command` on the leaf `key`, replacing any process it already holds.
    pub fn launch(&mut self, catalog: &mut Catalog, key: &NodeKey, command: &str) -> RunOutcome {
        let Some(node) = catalog.store().find_by_key(key) else {
            return RunOutcome::Skipped;
        };
        let Some(leaf) = node.command() else {
            return RunOutcome::Skipped;
        };
        let label = node.label.clone();
        if let Some(previous) = leaf.state().handle() {
            self.launcher.dispose(previous);
        }

        match self.launcher.spawn(&label, command) {
            Ok(handle) => {
                log::debug!("Launched '{}' for node {} as {:?}", command, key, handle);
                self.set_state(catalog, key, RunState::Running(handle));
                RunOutcome::Launched {
                    key: key.clone(),
                    handle,
                }
            }
            Err(err) => {
                log::error!("Failed to launch '{}': {}", command, err);
                let reason = err.to_string();
                self.set_state(catalog, key, RunState::Error(reason.clone()));
                RunOutcome::Failed {
                    key: key.clone(),
                    reason,
                }
            }
        }
    }

    /// Disposes the current process (if any) and launches the bare template again.
    pub fn rerun(&mut self, catalog: &mut Catalog, key: &NodeKey) -> RunOutcome {
        let template = catalog
            .store()
            .find_by_key(key)
            .and_then(CommandNode::command)
            .map(|leaf| leaf.template.clone());
        match template {
            Some(template) if !template.trim().is_empty() => self.launch(catalog, key, &template),
            _ => RunOutcome::Skipped,
        }
    }

    /// Returns the leaf to `Stopped`, disposing its process. Returns whether anything
    /// changed; stopping a stopped leaf does nothing.
    pub fn stop(&mut self, catalog: &mut Catalog, key: &NodeKey) -> bool {
        let state = catalog.store().find_by_key(key).and_then(CommandNode::state);
        match state {
            Some(RunState::Running(handle)) => {
                let handle = *handle;
                self.launcher.dispose(handle);
                self.set_state(catalog, key, RunState::Stopped);
                true
            }
            Some(RunState::Error(_)) => {
                self.set_state(catalog, key, RunState::Stopped);
                true
            }
            Some(RunState::Stopped) | None => false,
        }
    }

    /// Marks the leaf holding `handle` as stopped after its process ended by itself.
    /// Scopes are searched in [`Scope::ALL`] order and the first match wins.
    pub fn on_external_close(
        &mut self,
        catalogs: &mut [Catalog],
        handle: ProcessHandle,
    ) -> Option<(Scope, NodeKey)> {
        for scope in Scope::ALL {
            for catalog in catalogs.iter_mut().filter(|c| c.scope() == scope) {
                let Some(node) = catalog.store_mut().find_by_handle_mut(handle) else {
                    continue;
                };
                let key = node.key().clone();
                if let Some(leaf) = node.command_mut() {
                    leaf.state = RunState::Stopped;
                }
                catalog.notify(&Change::nodes([Some(key.clone())]));
                log::debug!("Process {:?} of node {} exited", handle, key);
                return Some((scope, key));
            }
        }
        log::debug!("Exited process {:?} is not tracked by any node", handle);
        None
    }

    /// Routes every process that ended since the last call to
    /// [`on_external_close`](Self::on_external_close).
    pub fn reap(&mut self, catalogs: &mut [Catalog]) -> Vec<(Scope, NodeKey)> {
        let exited = self.launcher.poll_exited();
        exited
            .into_iter()
            .filter_map(|handle| self.on_external_close(catalogs, handle))
            .collect()
    }

    /// Deletes a node, disposing the processes of its whole subtree.
    pub fn delete_node(
        &mut self,
        catalog: &mut Catalog,
        key: &NodeKey,
    ) -> Result<Change, CatalogError> {
        let launcher = &mut self.launcher;
        catalog.delete_node(key, |handle| launcher.dispose(handle))
    }

    /// Stops every running leaf of every catalog.
    pub fn stop_all(&mut self, catalogs: &mut [Catalog]) -> usize {
        let mut stopped = 0;
        for catalog in catalogs.iter_mut() {
            let running: Vec<NodeKey> = catalog
                .store()
                .iter()
                .filter(|node| node.state().and_then(RunState::handle).is_some())
                .map(|node| node.key().clone())
                .collect();
            for key in running {
                if self.stop(catalog, &key) {
                    stopped += 1;
                }
            }
        }
        stopped
    }

    fn set_state(&mut self, catalog: &mut Catalog, key: &NodeKey, state: RunState) {
        if catalog.store_mut().set_state(key, state) {
            catalog.notify(&Change::nodes([Some(key.clone())]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::TreeObserver;
    use crate::core::persistence::{DocumentStorage, StorageError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeLauncher {
        next: u64,
        spawned: Vec<(String, String)>,
        disposed: Vec<ProcessHandle>,
        exited: Vec<ProcessHandle>,
        fail: bool,
    }

    impl ProcessLauncher for FakeLauncher {
        fn spawn(&mut self, label: &str, command: &str) -> Result<ProcessHandle, LaunchError> {
            if self.fail {
                return Err(LaunchError::CommandParse(command.to_string()));
            }
            self.next += 1;
            self.spawned.push((label.to_string(), command.to_string()));
            Ok(ProcessHandle::new(self.next))
        }

        fn dispose(&mut self, handle: ProcessHandle) {
            self.disposed.push(handle);
        }

        fn poll_exited(&mut self) -> Vec<ProcessHandle> {
            std::mem::take(&mut self.exited)
        }
    }

    struct ScriptedPicker(Option<Vec<String>>);

    impl VariablePicker for ScriptedPicker {
        fn pick_many(&mut self, _options: &[String], _special: &[String]) -> Option<Vec<String>> {
            self.0.clone()
        }
    }

    struct Counter(Rc<RefCell<usize>>);

    impl TreeObserver for Counter {
        fn tree_changed(&mut self, _scope: Scope, _change: &Change) {
            *self.0.borrow_mut() += 1;
        }
    }

    /// Storage whose writes start failing once the shared flag is raised.
    struct FlakyStorage(Rc<RefCell<bool>>);

    impl DocumentStorage for FlakyStorage {
        fn read_document(&self, _scope: Scope) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        fn write_document(&mut self, scope: Scope, _bytes: &[u8]) -> Result<(), StorageError> {
            if *self.0.borrow() {
                return Err(StorageError::Unavailable { scope });
            }
            Ok(())
        }
    }

    fn plain_leaf(command: &str) -> CommandNode {
        CommandNode::leaf(Scope::Temporary, command, None, vec![])
    }

    fn catalog_with(node: CommandNode) -> (Catalog, NodeKey) {
        let mut catalog = Catalog::ephemeral(Scope::Temporary);
        let key = node.key().clone();
        catalog.add_node(node, None).unwrap();
        (catalog, key)
    }

    fn state_of(catalog: &Catalog, key: &NodeKey) -> RunState {
        catalog.store().find_by_key(key).and_then(CommandNode::state).cloned().unwrap()
    }

    #[test]
    fn test_run_then_stop() {
        let (mut catalog, key) = catalog_with(plain_leaf("npm test"));
        let mut controller = ExecutionController::new(FakeLauncher::default());

        let outcome = controller.run(&mut catalog, &key);
        let handle = ProcessHandle::new(1);
        assert_eq!(outcome, RunOutcome::Launched { key: key.clone(), handle });
        assert_eq!(state_of(&catalog, &key), RunState::Running(handle));

        assert!(controller.stop(&mut catalog, &key));
        assert_eq!(state_of(&catalog, &key), RunState::Stopped);
        assert_eq!(controller.launcher().disposed, vec![handle]);
    }

    #[test]
    fn test_stop_on_stopped_leaf_is_a_no_op() {
        let (mut catalog, key) = catalog_with(plain_leaf("ls"));
        let notifications = Rc::new(RefCell::new(0));
        catalog.subscribe(Box::new(Counter(notifications.clone())));
        let mut controller = ExecutionController::new(FakeLauncher::default());

        assert!(!controller.stop(&mut catalog, &key));
        assert_eq!(state_of(&catalog, &key), RunState::Stopped);
        assert!(controller.launcher().disposed.is_empty());
        assert_eq!(*notifications.borrow(), 0);
    }

    #[test]
    fn test_groups_and_empty_commands_are_skipped() {
        let (mut catalog, group_key) = catalog_with(CommandNode::group(Scope::Temporary, "build"));
        let empty = CommandNode::leaf(Scope::Temporary, "   ", Some("blank".into()), vec![]);
        let empty_key = empty.key().clone();
        catalog.add_node(empty, None).unwrap();
        let mut controller = ExecutionController::new(FakeLauncher::default());

        assert_eq!(controller.run(&mut catalog, &group_key), RunOutcome::Skipped);
        assert_eq!(controller.run(&mut catalog, &empty_key), RunOutcome::Skipped);
        assert_eq!(controller.run(&mut catalog, &NodeKey::from_raw("nope")), RunOutcome::Skipped);
        assert!(controller.launcher().spawned.is_empty());
    }

    #[test]
    fn test_launch_failure_sets_error_then_run_recovers() {
        let (mut catalog, key) = catalog_with(plain_leaf("ls"));
        let mut controller = ExecutionController::new(FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        });

        let outcome = controller.run(&mut catalog, &key);
        assert!(matches!(outcome, RunOutcome::Failed { .. }));
        assert!(matches!(state_of(&catalog, &key), RunState::Error(_)));

        controller.launcher_mut().fail = false;
        let outcome = controller.rerun(&mut catalog, &key);
        assert!(matches!(outcome, RunOutcome::Launched { .. }));
        assert_eq!(state_of(&catalog, &key), RunState::Running(ProcessHandle::new(1)));
    }

    #[test]
    fn test_rerun_replaces_the_running_process() {
        let (mut catalog, key) = catalog_with(plain_leaf("cargo watch"));
        let mut controller = ExecutionController::new(FakeLauncher::default());
        controller.run(&mut catalog, &key);

        controller.rerun(&mut catalog, &key);
        assert_eq!(controller.launcher().disposed, vec![ProcessHandle::new(1)]);
        assert_eq!(state_of(&catalog, &key), RunState::Running(ProcessHandle::new(2)));
    }

    #[test]
    fn test_selected_variables_are_appended() {
        let leaf = CommandNode::leaf(
            Scope::Temporary,
            "npm test",
            None,
            vec!["--watch".into(), "--coverage".into()],
        );
        let (mut catalog, key) = catalog_with(leaf);
        let mut controller = ExecutionController::new(FakeLauncher::default());
        let mut picker = ScriptedPicker(Some(vec!["--watch".into(), "--coverage".into()]));

        let report = controller.run_with(&mut catalog, &key, &mut picker);
        assert!(matches!(report.outcome, RunOutcome::Launched { .. }));
        assert_eq!(controller.launcher().spawned[0].1, "npm test --watch --coverage");
        assert_eq!(catalog.store().len(), 1);
    }

    #[test]
    fn test_empty_selection_launches_bare_template() {
        let leaf = CommandNode::leaf(Scope::Temporary, "make", None, vec!["-j8".into()]);
        let (mut catalog, key) = catalog_with(leaf);
        let mut controller = ExecutionController::new(FakeLauncher::default());

        controller.run_with(&mut catalog, &key, &mut ScriptedPicker(Some(vec![])));
        assert_eq!(controller.launcher().spawned[0].1, "make");
    }

    #[test]
    fn test_cancelled_selection_keeps_node_stopped() {
        let leaf = CommandNode::leaf(Scope::Temporary, "make", None, vec!["-j8".into()]);
        let (mut catalog, key) = catalog_with(leaf);
        let mut controller = ExecutionController::new(FakeLauncher::default());

        let report = controller.run_with(&mut catalog, &key, &mut ScriptedPicker(None));
        assert_eq!(report.outcome, RunOutcome::Skipped);
        assert_eq!(state_of(&catalog, &key), RunState::Stopped);
    }

    #[test]
    fn test_save_choice_creates_sibling_and_runs_it() {
        let leaf = CommandNode::leaf(
            Scope::Temporary,
            "npm test",
            None,
            vec!["--watch".into(), "--coverage".into()],
        );
        let leaf_key = leaf.key().clone();
        let group = CommandNode::group(Scope::Temporary, "build").with_child(leaf);
        let (mut catalog, group_key) = catalog_with(group);
        let mut controller = ExecutionController::new(FakeLauncher::default());
        let mut picker = ScriptedPicker(Some(vec!["--watch".into(), SAVE_CHOICE.to_string()]));

        let report = controller.run_with(&mut catalog, &leaf_key, &mut picker);
        let RunOutcome::Launched { key: saved_key, .. } = report.outcome else {
            panic!("expected a launch, got {:?}", report.outcome);
        };
        assert!(report.save_error.is_none());
        assert_ne!(saved_key, leaf_key);

        let saved = catalog.store().find_by_key(&saved_key).unwrap();
        assert_eq!(saved.command().unwrap().template, "npm test --watch");
        assert!(saved.command().unwrap().variables.is_empty());
        assert_eq!(saved.label, "npm test --watch");
        assert_eq!(catalog.store().get_parent(&saved_key).unwrap().key(), &group_key);
        assert!(matches!(state_of(&catalog, &saved_key), RunState::Running(_)));
        assert_eq!(state_of(&catalog, &leaf_key), RunState::Stopped);
    }

    #[test]
    fn test_save_choice_still_launches_when_saving_fails() {
        let broken = Rc::new(RefCell::new(false));
        let mut catalog = Catalog::open(Scope::Global, Box::new(FlakyStorage(broken.clone())));
        let leaf = CommandNode::leaf(Scope::Global, "npm test", None, vec!["--watch".into()]);
        let leaf_key = leaf.key().clone();
        catalog.add_node(leaf, None).unwrap();
        *broken.borrow_mut() = true;

        let mut controller = ExecutionController::new(FakeLauncher::default());
        let mut picker = ScriptedPicker(Some(vec!["--watch".into(), SAVE_CHOICE.to_string()]));
        let report = controller.run_with(&mut catalog, &leaf_key, &mut picker);

        let RunOutcome::Launched { key: saved_key, .. } = report.outcome else {
            panic!("expected a launch, got {:?}", report.outcome);
        };
        assert!(matches!(report.save_error, Some(CatalogError::Persist { .. })));
        let saved = catalog.store().find_by_key(&saved_key).unwrap();
        assert_eq!(saved.command().unwrap().template, "npm test --watch");
        assert!(matches!(state_of(&catalog, &saved_key), RunState::Running(_)));
        assert_eq!(controller.launcher().spawned[0].1, "npm test --watch");
        assert_eq!(catalog.store().len(), 2);
    }

    #[test]
    fn test_run_resets_error_before_prompting() {
        let leaf = CommandNode::leaf(Scope::Temporary, "make", None, vec!["-j8".into()]);
        let (mut catalog, key) = catalog_with(leaf);
        let mut controller = ExecutionController::new(FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        });
        controller.launch(&mut catalog, &key, "make -j8");
        assert!(matches!(state_of(&catalog, &key), RunState::Error(_)));

        let RunOutcome::AwaitingSelection(prompt) = controller.run(&mut catalog, &key) else {
            panic!("expected a prompt");
        };
        assert_eq!(prompt.options, vec!["-j8".to_string()]);
        assert_eq!(prompt.special_choices, vec![SAVE_CHOICE.to_string()]);
        assert_eq!(state_of(&catalog, &key), RunState::Stopped);
        assert!(controller.launcher().spawned.is_empty());
    }

    #[test]
    fn test_selection_for_deleted_node_is_skipped() {
        let leaf = CommandNode::leaf(Scope::Temporary, "make", None, vec!["-j8".into()]);
        let (mut catalog, key) = catalog_with(leaf);
        let mut controller = ExecutionController::new(FakeLauncher::default());

        let RunOutcome::AwaitingSelection(prompt) = controller.run(&mut catalog, &key) else {
            panic!("expected a prompt");
        };
        controller.delete_node(&mut catalog, &key).unwrap();
        let report = controller.complete_selection(&mut catalog, &prompt, Some(vec!["-j8".into()]));
        assert_eq!(report.outcome, RunOutcome::Skipped);
        assert!(controller.launcher().spawned.is_empty());
    }

    #[test]
    fn test_external_close_searches_scopes_in_order() {
        let mut global = Catalog::ephemeral(Scope::Global);
        let g_leaf = CommandNode::leaf(Scope::Global, "serve", None, vec![]);
        let g_key = g_leaf.key().clone();
        global.add_node(g_leaf, None).unwrap();
        let mut temp = Catalog::ephemeral(Scope::Temporary);
        let t_leaf = CommandNode::leaf(Scope::Temporary, "watch", None, vec![]);
        let t_key = t_leaf.key().clone();
        temp.add_node(t_leaf, None).unwrap();
        let mut catalogs = vec![temp, global];

        let mut controller = ExecutionController::new(FakeLauncher::default());
        controller.run(&mut catalogs[1], &g_key);
        controller.run(&mut catalogs[0], &t_key);
        controller.launcher_mut().exited = vec![ProcessHandle::new(2), ProcessHandle::new(9)];

        let closed = controller.reap(&mut catalogs);
        assert_eq!(closed, vec![(Scope::Temporary, t_key.clone())]);
        assert_eq!(state_of(&catalogs[0], &t_key), RunState::Stopped);
        assert_eq!(state_of(&catalogs[1], &g_key), RunState::Running(ProcessHandle::new(1)));
    }

    #[test]
    fn test_delete_disposes_subtree_processes() {
        let inner = CommandNode::leaf(Scope::Temporary, "serve", None, vec![]);
        let inner_key = inner.key().clone();
        let (mut catalog, group_key) =
            catalog_with(CommandNode::group(Scope::Temporary, "dev").with_child(inner));
        let mut controller = ExecutionController::new(FakeLauncher::default());
        controller.run(&mut catalog, &inner_key);

        controller.delete_node(&mut catalog, &group_key).unwrap();
        assert_eq!(controller.launcher().disposed, vec![ProcessHandle::new(1)]);
        assert!(catalog.store().is_empty());
    }

    #[test]
    fn test_stop_all_counts_running_leaves() {
        let a = CommandNode::leaf(Scope::Temporary, "a", None, vec![]);
        let a_key = a.key().clone();
        let (mut catalog, b_key) = catalog_with(plain_leaf("b"));
        catalog.add_node(a, None).unwrap();
        let mut controller = ExecutionController::new(FakeLauncher::default());
        controller.run(&mut catalog, &a_key);
        controller.run(&mut catalog, &b_key);

        let mut catalogs = vec![catalog];
        assert_eq!(controller.stop_all(&mut catalogs), 2);
        assert!(catalogs[0].store().iter().all(|n| n.state() == Some(&RunState::Stopped)));
    }

    #[test]
    fn test_resolve_command_ignores_special_choices() {
        let special = vec![SAVE_CHOICE.to_string()];
        assert_eq!(
            resolve_command("ls", &[SAVE_CHOICE.to_string(), "-la".to_string()], &special),
            "ls -la"
        );
        assert_eq!(resolve_command("ls", &[], &special), "ls");
    }
}
