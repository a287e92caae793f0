// tests/scenarios.rs

use execumate::core::catalog::Catalog;
use execumate::core::execution::{
    ExecutionController, LaunchError, ProcessLauncher, RunOutcome, SAVE_CHOICE, VariablePicker,
};
use execumate::core::identity::NodeKey;
use execumate::core::persistence::{self, DocumentStorage, StorageError};
use execumate::core::tree_store::TreeStore;
use execumate::models::{CommandNode, ProcessHandle, RunState, Scope};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

// --- Test doubles ---

#[derive(Clone, Default)]
struct MemoryStorage(Rc<RefCell<HashMap<Scope, Vec<u8>>>>);

impl MemoryStorage {
    fn put(&self, scope: Scope, bytes: &[u8]) {
        self.0.borrow_mut().insert(scope, bytes.to_vec());
    }

    fn get(&self, scope: Scope) -> Option<String> {
        self.0
            .borrow()
            .get(&scope)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl DocumentStorage for MemoryStorage {
    fn read_document(&self, scope: Scope) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.0.borrow().get(&scope).cloned())
    }

    fn write_document(&mut self, scope: Scope, bytes: &[u8]) -> Result<(), StorageError> {
        self.put(scope, bytes);
        Ok(())
    }
}

#[derive(Default)]
struct CountingLauncher {
    next: u64,
    live: HashSet<ProcessHandle>,
    commands: Vec<String>,
}

impl ProcessLauncher for CountingLauncher {
    fn spawn(&mut self, _label: &str, command: &str) -> Result<ProcessHandle, LaunchError> {
        self.next += 1;
        let handle = ProcessHandle::new(self.next);
        self.live.insert(handle);
        self.commands.push(command.to_string());
        Ok(handle)
    }

    fn dispose(&mut self, handle: ProcessHandle) {
        self.live.remove(&handle);
    }

    fn poll_exited(&mut self) -> Vec<ProcessHandle> {
        Vec::new()
    }
}

struct Picks(Vec<String>);

impl VariablePicker for Picks {
    fn pick_many(&mut self, _options: &[String], _special: &[String]) -> Option<Vec<String>> {
        Some(self.0.clone())
    }
}

fn state_of(catalog: &Catalog, key: &NodeKey) -> RunState {
    catalog
        .store()
        .find_by_key(key)
        .and_then(CommandNode::state)
        .cloned()
        .expect("leaf exists")
}

type Outline = Vec<(NodeKey, String, Option<(String, Vec<String>)>)>;

/// Keys, labels and commands in pre-order, without run state.
fn outline(store: &TreeStore) -> Outline {
    store
        .iter()
        .map(|n| {
            let command = n.command().map(|c| (c.template.clone(), c.variables.clone()));
            (n.key().clone(), n.label.clone(), command)
        })
        .collect()
}

fn assert_forest_is_sound(store: &TreeStore) {
    let keys: Vec<&NodeKey> = store.iter().map(CommandNode::key).collect();
    let unique: HashSet<&NodeKey> = keys.iter().copied().collect();
    assert_eq!(keys.len(), unique.len(), "keys must stay unique");
    for node in store.iter() {
        for child in node.children() {
            assert!(!child.contains(node.key()), "a node is inside its own descendant");
        }
    }
}

// --- Scenarios ---

#[test]
fn group_with_leaf_runs_and_stops() {
    let storage = MemoryStorage::default();
    let mut catalog = Catalog::open(Scope::Global, Box::new(storage.clone()));
    let mut controller = ExecutionController::new(CountingLauncher::default());

    let group = CommandNode::group(Scope::Global, "build");
    let g_key = group.key().clone();
    catalog.add_node(group, None).unwrap();
    let leaf = CommandNode::leaf(Scope::Global, "npm test", None, vec![]);
    let l_key = leaf.key().clone();
    catalog.add_node(leaf, Some(&g_key)).unwrap();

    let found = catalog.store().find_by_key(&l_key).unwrap();
    assert_eq!(found.command().unwrap().template, "npm test");
    assert_eq!(catalog.store().get_parent(&l_key).unwrap().key(), &g_key);

    let RunOutcome::Launched { handle, .. } = controller.run(&mut catalog, &l_key) else {
        panic!("leaf should launch");
    };
    assert_eq!(state_of(&catalog, &l_key), RunState::Running(handle));
    assert!(controller.launcher().live.contains(&handle));

    controller.stop(&mut catalog, &l_key);
    assert_eq!(state_of(&catalog, &l_key), RunState::Stopped);
    assert!(controller.launcher().live.is_empty());

    // Stopping again changes nothing.
    assert!(!controller.stop(&mut catalog, &l_key));
    assert_eq!(state_of(&catalog, &l_key), RunState::Stopped);
}

#[test]
fn saving_a_resolved_command_creates_a_running_sibling() {
    let storage = MemoryStorage::default();
    let mut catalog = Catalog::open(Scope::Workspace, Box::new(storage.clone()));
    let mut controller = ExecutionController::new(CountingLauncher::default());

    let l2 = CommandNode::leaf(
        Scope::Workspace,
        "npm test",
        None,
        vec!["--watch".into(), "--coverage".into()],
    );
    let l2_key = l2.key().clone();
    catalog.add_node(l2, None).unwrap();

    let mut picker = Picks(vec!["--watch".into(), SAVE_CHOICE.to_string()]);
    let report = controller.run_with(&mut catalog, &l2_key, &mut picker);
    let RunOutcome::Launched { key: l3_key, .. } = report.outcome else {
        panic!("the saved command should launch");
    };

    let l3 = catalog.store().find_by_key(&l3_key).unwrap();
    assert_eq!(l3.command().unwrap().template, "npm test --watch");
    assert!(l3.command().unwrap().variables.is_empty());
    assert!(catalog.store().get_parent(&l3_key).is_none());
    assert!(matches!(state_of(&catalog, &l3_key), RunState::Running(_)));
    assert_eq!(state_of(&catalog, &l2_key), RunState::Stopped);
    assert_eq!(controller.launcher().commands, vec!["npm test --watch"]);

    // The new node is persisted; its run state is not.
    let reopened = Catalog::open(Scope::Workspace, Box::new(storage.clone()));
    assert_eq!(state_of(&reopened, &l3_key), RunState::Stopped);
    assert!(!storage.get(Scope::Workspace).unwrap().contains("state"));
}

#[test]
fn drag_onto_group_then_back_is_rejected() {
    let mut catalog = Catalog::ephemeral(Scope::Temporary);
    let a = CommandNode::group(Scope::Temporary, "A");
    let a_key = a.key().clone();
    let b = CommandNode::group(Scope::Temporary, "B")
        .with_child(CommandNode::leaf(Scope::Temporary, "ls", None, vec![]));
    let b_key = b.key().clone();
    catalog.add_node(a, None).unwrap();
    catalog.add_node(b, None).unwrap();

    catalog.move_subtree(&[a_key.clone()], Some(&b_key)).unwrap();
    let b_node = catalog.store().find_by_key(&b_key).unwrap();
    assert_eq!(b_node.children().last().unwrap().key(), &a_key);

    let change = catalog.move_subtree(&[b_key.clone()], Some(&a_key)).unwrap();
    assert!(change.is_empty());
    assert!(catalog.store().get_parent(&b_key).is_none());
    assert_eq!(catalog.store().get_parent(&a_key).unwrap().key(), &b_key);
}

#[test]
fn malformed_workspace_document_loads_empty() {
    let storage = MemoryStorage::default();
    storage.put(Scope::Workspace, b"{ this is not json");
    let catalog = Catalog::open(Scope::Workspace, Box::new(storage.clone()));
    assert!(catalog.store().is_empty());

    storage.put(Scope::Workspace, br#"{"version": 99, "nodes": []}"#);
    let catalog = Catalog::open(Scope::Workspace, Box::new(storage));
    assert!(catalog.store().is_empty());
}

#[test]
fn missing_document_is_created_empty() {
    let storage = MemoryStorage::default();
    let catalog = Catalog::open(Scope::Global, Box::new(storage.clone()));
    assert!(catalog.store().is_empty());
    let written = storage.get(Scope::Global).expect("an empty document is written");
    assert!(written.contains("\"version\": 1"));
}

#[test]
fn legacy_document_is_upgraded_with_fresh_keys() {
    let storage = MemoryStorage::default();
    storage.put(
        Scope::Global,
        br#"[
            {"label": "", "command": "npm start", "cType": "command"},
            {"key": "g1", "label": "tools", "isGroup": true, "children": [
                {"key": "g1", "label": "lint", "command": "npm run lint"}
            ]}
        ]"#,
    );
    let mut catalog = Catalog::open(Scope::Global, Box::new(storage.clone()));

    assert_eq!(catalog.store().len(), 3);
    assert_forest_is_sound(catalog.store());
    let first = &catalog.store().roots()[0];
    assert_eq!(first.label, "npm start");
    assert!(!first.key().is_unassigned());
    assert_eq!(catalog.store().roots()[1].key().as_str(), "g1");

    catalog.save().unwrap();
    let rewritten = storage.get(Scope::Global).unwrap();
    assert!(rewritten.contains("\"commandTemplate\": \"npm start\""));
    assert!(!rewritten.contains("cType"));
}

#[test]
fn round_trip_keeps_structure_and_resets_state() {
    let mut catalog = Catalog::ephemeral(Scope::Global);
    let mut controller = ExecutionController::new(CountingLauncher::default());
    let leaf = CommandNode::leaf(
        Scope::Global,
        "cargo run",
        Some("app".into()),
        vec!["--release".into()],
    );
    let leaf_key = leaf.key().clone();
    let tree = CommandNode::group(Scope::Global, "rust")
        .with_child(CommandNode::group(Scope::Global, "empty"))
        .with_child(leaf);
    catalog.add_node(tree, None).unwrap();
    controller.launch(&mut catalog, &leaf_key, "cargo run");

    let document = persistence::serialize(Scope::Global, catalog.store().roots());
    let restored = persistence::deserialize(Scope::Global, document).unwrap();
    let restored = TreeStore::from_roots(restored);

    assert_eq!(outline(catalog.store()), outline(&restored));
    assert!(restored.iter().all(|n| n.state().is_none_or(|s| *s == RunState::Stopped)));
}

#[test]
fn random_mutations_keep_the_forest_sound() {
    let mut catalog = Catalog::ephemeral(Scope::Temporary);
    let mut keys: Vec<NodeKey> = Vec::new();
    // Small deterministic LCG so the sequence is reproducible.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = |bound: usize| {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        usize::try_from(seed >> 33).unwrap_or(0) % bound.max(1)
    };

    for step in 0..400 {
        match next(4) {
            0 | 1 => {
                let node = if next(2) == 0 {
                    CommandNode::group(Scope::Temporary, format!("g{step}"))
                } else {
                    CommandNode::leaf(Scope::Temporary, format!("echo {step}"), None, vec![])
                };
                let parent = if keys.is_empty() || next(3) == 0 {
                    None
                } else {
                    Some(keys[next(keys.len())].clone())
                };
                let key = node.key().clone();
                if catalog.add_node(node, parent.as_ref()).is_ok() {
                    keys.push(key);
                }
            }
            2 if !keys.is_empty() => {
                let count = 1 + next(3);
                let dragged: Vec<NodeKey> = (0..count)
                    .map(|_| keys[next(keys.len())].clone())
                    .collect();
                let target = if next(4) == 0 {
                    None
                } else {
                    Some(keys[next(keys.len())].clone())
                };
                let before = catalog.store().len();
                catalog.move_subtree(&dragged, target.as_ref()).unwrap();
                assert_eq!(catalog.store().len(), before, "moves never lose nodes");
            }
            3 if !keys.is_empty() => {
                let key = keys[next(keys.len())].clone();
                catalog.delete_node(&key, |_| {}).unwrap();
                keys.retain(|k| catalog.store().find_by_key(k).is_some());
            }
            _ => {}
        }
        assert_forest_is_sound(catalog.store());
        assert_eq!(catalog.store().len(), keys.len());
    }
}

#[test]
fn moving_into_any_descendant_leaves_forest_unchanged() {
    let mut catalog = Catalog::ephemeral(Scope::Temporary);
    let deep = CommandNode::leaf(Scope::Temporary, "deep", None, vec![]);
    let deep_key = deep.key().clone();
    let inner = CommandNode::group(Scope::Temporary, "inner").with_child(deep);
    let inner_key = inner.key().clone();
    let outer = CommandNode::group(Scope::Temporary, "outer").with_child(inner);
    let outer_key = outer.key().clone();
    catalog.add_node(outer, None).unwrap();

    let snapshot = persistence::serialize(Scope::Temporary, catalog.store().roots());
    for target in [&inner_key, &deep_key] {
        let change = catalog.move_subtree(&[outer_key.clone()], Some(target)).unwrap();
        assert!(change.is_empty());
        let after = persistence::serialize(Scope::Temporary, catalog.store().roots());
        assert_eq!(after, snapshot);
    }
}
