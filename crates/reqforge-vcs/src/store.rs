//! The artifact store contract and commit metadata.

use crate::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One commit in an artifact file's history.
///
/// Immutable once returned by the store. Histories are reported
/// newest-first; consumers re-sort as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full commit hash.
    pub hash: String,
    /// Commit message.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Commit time, milliseconds since the UNIX epoch.
    pub timestamp_ms: i64,
}

/// A commit-log backed store keyed by file path.
///
/// Paths are relative to the project root. Write operations
/// (`commit_file`) are serialized by the implementation; read operations
/// may run concurrently with each other and with pending writes.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether the store is initialized and can serve history.
    async fn is_ready(&self) -> bool;

    /// Write an artifact file's content into the working tree,
    /// creating parent directories as needed. Does not commit.
    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()>;

    /// Commit the file at `path` with the given message.
    ///
    /// Fails if there is nothing to record for the path. Not retried
    /// automatically.
    async fn commit_file(&self, path: &Path, message: &str) -> StoreResult<CommitInfo>;

    /// Full commit history of the file at `path`, newest-first.
    ///
    /// A file that has never been committed has an empty history.
    async fn get_history(&self, path: &Path) -> StoreResult<Vec<CommitInfo>>;

    /// Content of the file at `path` as of `commit_hash`.
    ///
    /// Returns `Ok(None)` when the path does not exist in that commit's
    /// tree — missing content is a value, not an error.
    async fn read_file_at_commit(
        &self,
        path: &Path,
        commit_hash: &str,
    ) -> StoreResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_info_serializes_for_history_display() {
        let commit = CommitInfo {
            hash: "abc1234567890abcdef1234567890abcdef12345".to_string(),
            message: "Update rationale".to_string(),
            author: "Dana".to_string(),
            timestamp_ms: 1_700_000_000_000,
        };

        let json = serde_json::to_string(&commit).unwrap();
        assert!(json.contains("\"message\":\"Update rationale\""));
        assert!(json.contains("\"timestamp_ms\":1700000000000"));

        let parsed: CommitInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, commit);
    }
}
