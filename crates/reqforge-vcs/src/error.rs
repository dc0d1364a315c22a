//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during artifact store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has not been initialized for this project yet.
    ///
    /// Callers treat this as "no history": resolvers map it to empty
    /// results instead of surfacing an error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Path outside the project root, or otherwise unusable.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A commit could not be created.
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// A history read failed for one file.
    ///
    /// Sweeps isolate this per artifact: the failing artifact contributes
    /// an empty list and the sweep continues.
    #[error("history fetch failed: {0}")]
    HistoryFetch(String),
}

impl StoreError {
    /// Create an unavailable error for a project root.
    pub fn unavailable(root: impl Into<String>) -> Self {
        Self::Unavailable(root.into())
    }

    /// Whether this error means the store simply isn't initialized.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_detectable() {
        let err = StoreError::unavailable("/tmp/project");
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("/tmp/project"));
    }

    #[test]
    fn commit_failed_displays_reason() {
        let err = StoreError::CommitFailed("nothing staged".to_string());
        assert_eq!(err.to_string(), "commit failed: nothing staged");
    }
}
