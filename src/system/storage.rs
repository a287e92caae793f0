// src/system/storage.rs

//! File-backed catalog documents.

use crate::core::persistence::{DocumentStorage, StorageError};
use crate::models::Scope;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Catalog documents stored as files, one path per scope.
#[derive(Debug, Clone, Default)]
pub struct FileStorage {
    paths: HashMap<Scope, PathBuf>,
}

impl FileStorage {
    /// Storage with no scope mapped yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `scope` to the document at `path`. Temporary scopes are never mapped.
    pub fn with_scope(mut self, scope: Scope, path: impl Into<PathBuf>) -> Self {
        if scope.is_persistent() {
            self.paths.insert(scope, path.into());
        }
        self
    }

    /// The document path of `scope`, if mapped.
    pub fn path_of(&self, scope: Scope) -> Option<&Path> {
        self.paths.get(&scope).map(PathBuf::as_path)
    }

    fn require(&self, scope: Scope) -> Result<&Path, StorageError> {
        self.path_of(scope)
            .ok_or(StorageError::Unavailable { scope })
    }
}

impl DocumentStorage for FileStorage {
    fn read_document(&self, scope: Scope) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.require(scope)?;
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes to a temporary file next to the target and renames it into place, so a
    /// crash never leaves a half-written document.
    fn write_document(&mut self, scope: Scope, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.require(scope)?;
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(bytes).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
