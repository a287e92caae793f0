// src/state.rs

//! The open catalogs and the process controller of one invocation.

use crate::core::catalog::Catalog;
use crate::core::execution::ExecutionController;
use crate::core::node_resolver::{self, ResolveError, ResolvedNode};
use crate::core::paths::{self, PathError};
use crate::models::Scope;
use crate::system::launcher::ShellLauncher;
use crate::system::settings;
use crate::system::storage::FileStorage;

/// Everything a CLI invocation works on: one catalog per scope and the controller that
/// owns the launched processes.
#[derive(Debug)]
pub struct Shelf {
    catalogs: Vec<Catalog>,
    controller: ExecutionController<ShellLauncher>,
    in_session: bool,
}

impl Shelf {
    /// Loads the settings and opens the global and workspace catalogs of the current
    /// workspace. Unreadable catalogs come up empty.
    pub fn open() -> Result<Self, PathError> {
        let settings = settings::load_or_default();
        let workspace_root = paths::workspace_root()?;
        let global_path = paths::global_catalog_path(&settings)?;
        let workspace_path = paths::workspace_catalog_path(&workspace_root, &settings);
        log::debug!(
            "Catalogs: global={}, workspace={}",
            global_path.display(),
            workspace_path.display()
        );

        let storage = FileStorage::new()
            .with_scope(Scope::Global, global_path)
            .with_scope(Scope::Workspace, workspace_path);
        let catalogs = vec![
            Catalog::open(Scope::Global, Box::new(storage.clone())),
            Catalog::open(Scope::Workspace, Box::new(storage)),
            Catalog::ephemeral(Scope::Temporary),
        ];
        let launcher = ShellLauncher::new(settings.shell.as_deref(), &workspace_root);
        Ok(Self::from_parts(catalogs, launcher))
    }

    /// Assembles a shelf from already opened catalogs.
    pub fn from_parts(catalogs: Vec<Catalog>, launcher: ShellLauncher) -> Self {
        Self {
            catalogs,
            controller: ExecutionController::new(launcher),
            in_session: false,
        }
    }

    /// The open catalogs, in scope search order.
    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    /// The catalog of `scope`, if open.
    pub fn catalog(&self, scope: Scope) -> Option<&Catalog> {
        self.catalogs.iter().find(|c| c.scope() == scope)
    }

    /// Mutable access to the catalog of `scope`.
    pub fn catalog_mut(&mut self, scope: Scope) -> Option<&mut Catalog> {
        self.catalogs.iter_mut().find(|c| c.scope() == scope)
    }

    /// The catalog of `scope` together with the controller, for run-state operations.
    pub fn catalog_and_controller(
        &mut self,
        scope: Scope,
    ) -> Option<(&mut Catalog, &mut ExecutionController<ShellLauncher>)> {
        let catalog = self.catalogs.iter_mut().find(|c| c.scope() == scope)?;
        Some((catalog, &mut self.controller))
    }

    /// Every catalog together with the controller.
    pub fn all_and_controller(
        &mut self,
    ) -> (&mut [Catalog], &mut ExecutionController<ShellLauncher>) {
        (&mut self.catalogs, &mut self.controller)
    }

    /// The run controller.
    pub fn controller_mut(&mut self) -> &mut ExecutionController<ShellLauncher> {
        &mut self.controller
    }

    /// Resolves a node reference; see [`node_resolver::resolve_node`].
    pub fn resolve(
        &self,
        scope: Option<Scope>,
        reference: &str,
    ) -> Result<ResolvedNode, ResolveError> {
        node_resolver::resolve_node(&self.catalogs, scope, reference)
    }

    /// Whether commands run inside an interactive session, where launched processes
    /// keep running between commands.
    pub fn in_session(&self) -> bool {
        self.in_session
    }

    pub(crate) fn set_in_session(&mut self, in_session: bool) {
        self.in_session = in_session;
    }
}
