// src/core/paths.rs

//! Locations of the settings file and the catalog documents.

use crate::constants::{
    APP_DIR_NAME, GLOBAL_CATALOG_FILENAME, SETTINGS_FILENAME, WORKSPACE_CATALOG_FILENAME,
    WORKSPACE_ENV_VAR,
};
use crate::system::settings::Settings;
use lazy_static::lazy_static;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Errors resolving application paths.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform reports no config directory.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// The application directory could not be created.
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        /// The directory that was being created.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A `~` or `$VAR` in a configured path could not be expanded.
    #[error("Failed to expand path template '{template}': {reason}")]
    Expansion {
        /// The configured path.
        template: String,
        /// Why expansion failed.
        reason: String,
    },
    /// Neither the override variable nor the current directory is usable.
    #[error("Could not determine the workspace directory: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Returns the application config directory (`~/.config/execumate`), creating it if needed.
///
/// Memoized: only the first call touches the filesystem.
pub fn config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Path of `settings.toml` inside the config directory.
pub fn settings_path() -> Result<PathBuf, PathError> {
    config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_path_template(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// The global catalog document: the `global_catalog` setting if present, otherwise
/// `global-execumate.json` in the config directory.
pub fn global_catalog_path(settings: &Settings) -> Result<PathBuf, PathError> {
    match &settings.global_catalog {
        Some(template) => expand_path_template(template),
        None => config_dir().map(|dir| dir.join(GLOBAL_CATALOG_FILENAME)),
    }
}

/// The workspace root: `$EXECUMATE_WORKSPACE` or the current directory.
pub fn workspace_root() -> Result<PathBuf, PathError> {
    let root = match env::var_os(WORKSPACE_ENV_VAR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => env::current_dir().map_err(PathError::Workspace)?,
    };
    Ok(dunce::simplified(&root).to_path_buf())
}

/// The workspace catalog document inside `root`.
pub fn workspace_catalog_path(root: &Path, settings: &Settings) -> PathBuf {
    root.join(&settings.workspace_dir_name)
        .join(WORKSPACE_CATALOG_FILENAME)
}
