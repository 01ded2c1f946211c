//! Core error types for tomatolog-core.
//!
//! Capability failures (document reads/writes, prompts) are kept separate
//! from configuration and storage errors so the coordinator can turn them
//! into user-facing notices without stalling the timer state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tomatolog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Host capability failures (document store, prompter)
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Session-history database errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Errors raised by host capabilities.
///
/// These are surfaced to the user as notices; they never abort a timer
/// transition.
#[derive(Error, Debug)]
pub enum HostError {
    /// The referenced document does not exist and cannot be created.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A document read or write failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The prompt capability failed (distinct from the user cancelling).
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}
