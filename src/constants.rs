// src/constants.rs

//! Names and limits shared across the crate.

/// The name of the application directory inside the system config dir (`~/.config/execumate`).
pub const APP_DIR_NAME: &str = "execumate";

/// The settings file, stored in the application config directory.
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// The document holding the global catalog.
pub const GLOBAL_CATALOG_FILENAME: &str = "global-execumate.json";

/// The document holding a workspace catalog (inside the workspace dir).
pub const WORKSPACE_CATALOG_FILENAME: &str = "workspace-execumate.json";

/// Default name of the per-workspace directory that holds the workspace catalog.
pub const DEFAULT_WORKSPACE_DIR: &str = ".execumate";

/// Overrides the workspace root (defaults to the current directory).
pub const WORKSPACE_ENV_VAR: &str = "EXECUMATE_WORKSPACE";

/// Exported to every launched process with the label of the node that launched it.
pub const LABEL_ENV_VAR: &str = "EXECUMATE_LABEL";

/// Number of key characters shown by `tree --keys` and accepted as a short reference.
pub const SHORT_KEY_LEN: usize = 8;
