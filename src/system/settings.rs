// src/system/settings.rs

//! User settings (`settings.toml`).

use crate::constants::DEFAULT_WORKSPACE_DIR;
use crate::core::paths::{self, PathError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors of loading or creating the settings file.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The config directory could not be located or created.
    #[error(transparent)]
    Path(#[from] PathError),
    /// Reading or writing `settings.toml` failed.
    #[error("Failed to read or write the settings file: {0}")]
    Io(#[from] std::io::Error),
    /// `settings.toml` exists but does not parse.
    #[error("The settings file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// The defaults could not be rendered as TOML.
    #[error("Failed to serialize the default settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User settings, stored as `settings.toml` in the config directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Shell used to run commands, e.g. `"bash -lc"`. Defaults to `sh -c` (`cmd /C`
    /// on Windows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    /// Location of the global catalog; `~` and `$VARS` are expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_catalog: Option<String>,
    /// Directory, relative to the workspace root, holding the workspace catalog.
    pub workspace_dir_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shell: None,
            global_catalog: None,
            workspace_dir_name: DEFAULT_WORKSPACE_DIR.to_string(),
        }
    }
}

/// Loads the settings file, writing the defaults on first use.
pub fn load_settings() -> Result<Settings, SettingsError> {
    let path = paths::settings_path()?;
    load_from(&path)
}

/// Loads settings from `path`, creating it with the defaults when missing.
pub fn load_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        let defaults = Settings::default();
        fs::write(path, toml::to_string_pretty(&defaults)?)?;
        log::debug!("Wrote default settings to {}", path.display());
        return Ok(defaults);
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Like [`load_settings`], but falls back to the defaults on any error.
pub fn load_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        log::warn!("Using default settings: {}", e);
        Settings::default()
    })
}
