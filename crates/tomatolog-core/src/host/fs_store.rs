//! Filesystem-backed document store.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HostError;

use super::DocumentStore;

/// Documents are plain files under a root directory (the "vault").
/// Paths handed to the store are relative to that root.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl DocumentStore for FsDocumentStore {
    fn resolve(&self, path: &str) -> Option<String> {
        if self.full_path(path).is_file() {
            Some(path.to_string())
        } else {
            None
        }
    }

    fn ensure_exists(&mut self, path: &str) -> Result<String, HostError> {
        let full = self.full_path(path);
        if !full.is_file() {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).map_err(|source| HostError::Io {
                    path: path.to_string(),
                    source,
                })?;
            }
            fs::write(&full, "").map_err(|source| HostError::Io {
                path: path.to_string(),
                source,
            })?;
        }
        Ok(path.to_string())
    }

    fn read(&self, path: &str) -> Result<String, HostError> {
        let full = self.full_path(path);
        if !full.is_file() {
            return Err(HostError::NotFound(path.to_string()));
        }
        fs::read_to_string(&full).map_err(|source| HostError::Io {
            path: path.to_string(),
            source,
        })
    }

    fn write(&mut self, path: &str, text: &str) -> Result<(), HostError> {
        write_file(&self.full_path(path), path, text)
    }
}

fn write_file(full: &Path, path: &str, text: &str) -> Result<(), HostError> {
    fs::write(full, text).map_err(|source| HostError::Io {
        path: path.to_string(),
        source,
    })
}
