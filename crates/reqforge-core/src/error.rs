//! Error types for the core crate.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] reqforge_storage::StorageError),

    /// Artifact store error.
    #[error("store error: {0}")]
    Store(#[from] reqforge_vcs::StoreError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Baseline not found.
    #[error("baseline not found: {0}")]
    BaselineNotFound(String),

    /// Version snapshot not found.
    #[error("version snapshot not found: {0}")]
    SnapshotNotFound(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
