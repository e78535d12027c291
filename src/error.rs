//! Error types for tree synchronization and the store bindings.

use crate::types::ObjectId;
use thiserror::Error;

/// Read-path failures: resolving branches, commits, trees, or file content.
///
/// Any read failure aborts the enclosing operation; partial results are
/// never returned.
#[derive(Debug, Error)]
pub enum StoreReadError {
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Path not found at {reference}: {path}")]
    PathNotFound { path: String, reference: String },

    #[error("Malformed store response while {context}: {detail}")]
    Malformed { context: String, detail: String },

    #[error("Transport failure while {context}: {detail}")]
    Transport { context: String, detail: String },

    #[error("Deadline of {seconds}s exceeded while {context}")]
    Deadline { context: String, seconds: u64 },
}

/// Write-path failures: object creation or ref updates rejected by the store.
///
/// Objects already created before the failure are content-addressed and
/// unreferenced; they are left in place, never rolled back.
#[derive(Debug, Error)]
pub enum StoreWriteError {
    #[error("Blob creation failed for {path}: {detail}")]
    BlobCreate { path: String, detail: String },

    #[error("Object creation rejected while {context}: {detail}")]
    Rejected { context: String, detail: String },

    #[error("Ref update rejected for branch {branch}: {detail}")]
    RefRejected { branch: String, detail: String },

    #[error("Transport failure while {context}: {detail}")]
    Transport { context: String, detail: String },

    #[error("Deadline of {seconds}s exceeded while {context}")]
    Deadline { context: String, seconds: u64 },
}

/// Umbrella error for engine entry points and the CLI boundary.
#[derive(Debug, Error)]
pub enum GraftError {
    #[error("Store read failed: {0}")]
    Read(#[from] StoreReadError),

    #[error("Store write failed: {0}")]
    Write(#[from] StoreWriteError),

    #[error("Invalid tree path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for GraftError {
    fn from(err: config::ConfigError) -> Self {
        GraftError::Config(err.to_string())
    }
}
