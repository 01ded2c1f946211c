//! In-memory document store, used by tests and dry runs.

use std::collections::HashMap;

use crate::error::HostError;

use super::DocumentStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    docs: HashMap<String, String>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(path.into(), text.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.docs.get(path).map(String::as_str)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn resolve(&self, path: &str) -> Option<String> {
        self.docs.contains_key(path).then(|| path.to_string())
    }

    fn ensure_exists(&mut self, path: &str) -> Result<String, HostError> {
        self.docs.entry(path.to_string()).or_default();
        Ok(path.to_string())
    }

    fn read(&self, path: &str) -> Result<String, HostError> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }

    fn write(&mut self, path: &str, text: &str) -> Result<(), HostError> {
        self.docs.insert(path.to_string(), text.to_string());
        Ok(())
    }
}
