//! In-memory artifact store for testing.
//!
//! Lets tests seed commit histories with explicit timestamps and inject
//! per-path failures, so window and baseline behavior can be verified
//! deterministically without a real repository.

use crate::store::{ArtifactStore, CommitInfo};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Deterministic in-memory artifact store.
pub struct MemoryArtifactStore {
    inner: Mutex<Inner>,
}

struct Inner {
    ready: bool,
    /// Working-tree content per path.
    files: HashMap<PathBuf, String>,
    /// Commit log per path, oldest-first; each entry pins its content.
    history: HashMap<PathBuf, Vec<(CommitInfo, String)>>,
    /// Paths whose history reads fail (failure injection).
    fail_history: HashSet<PathBuf>,
    clock_ms: i64,
    counter: u64,
}

impl MemoryArtifactStore {
    /// Create an empty, ready store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                ready: true,
                files: HashMap::new(),
                history: HashMap::new(),
                fail_history: HashSet::new(),
                clock_ms: 0,
                counter: 0,
            }),
        }
    }

    /// Create a store that reports itself uninitialized.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.locked().ready = false;
        store
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed a commit with an explicit timestamp. Test setup only.
    pub fn seed_commit(
        &self,
        path: impl Into<PathBuf>,
        message: &str,
        author: &str,
        timestamp_ms: i64,
        content: &str,
    ) -> CommitInfo {
        let path = path.into();
        let mut inner = self.locked();
        inner.counter += 1;
        inner.clock_ms = inner.clock_ms.max(timestamp_ms);
        let info = CommitInfo {
            hash: format!("mem{:016x}", inner.counter),
            message: message.to_string(),
            author: author.to_string(),
            timestamp_ms,
        };
        inner.files.insert(path.clone(), content.to_string());
        inner
            .history
            .entry(path)
            .or_default()
            .push((info.clone(), content.to_string()));
        info
    }

    /// Make every subsequent history read for `path` fail.
    pub fn fail_history_for(&self, path: impl Into<PathBuf>) {
        self.locked().fail_history.insert(path.into());
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn is_ready(&self) -> bool {
        self.locked().ready
    }

    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()> {
        let mut inner = self.locked();
        if !inner.ready {
            return Err(StoreError::unavailable(path.display().to_string()));
        }
        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn commit_file(&self, path: &Path, message: &str) -> StoreResult<CommitInfo> {
        let mut inner = self.locked();
        if !inner.ready {
            return Err(StoreError::unavailable(path.display().to_string()));
        }
        let content = inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::CommitFailed(format!("{} not written", path.display())))?;

        inner.counter += 1;
        inner.clock_ms += 1;
        let info = CommitInfo {
            hash: format!("mem{:016x}", inner.counter),
            message: message.to_string(),
            author: "memory".to_string(),
            timestamp_ms: inner.clock_ms,
        };
        inner
            .history
            .entry(path.to_path_buf())
            .or_default()
            .push((info.clone(), content));
        Ok(info)
    }

    async fn get_history(&self, path: &Path) -> StoreResult<Vec<CommitInfo>> {
        let inner = self.locked();
        if !inner.ready {
            return Err(StoreError::unavailable(path.display().to_string()));
        }
        if inner.fail_history.contains(path) {
            return Err(StoreError::HistoryFetch(path.display().to_string()));
        }

        let mut commits: Vec<CommitInfo> = inner
            .history
            .get(path)
            .map(|entries| entries.iter().map(|(info, _)| info.clone()).collect())
            .unwrap_or_default();
        // Newest-first, matching the store convention.
        commits.reverse();
        Ok(commits)
    }

    async fn read_file_at_commit(
        &self,
        path: &Path,
        commit_hash: &str,
    ) -> StoreResult<Option<String>> {
        let inner = self.locked();
        if !inner.ready {
            return Err(StoreError::unavailable(path.display().to_string()));
        }
        Ok(inner.history.get(path).and_then(|entries| {
            entries
                .iter()
                .find(|(info, _)| info.hash == commit_hash)
                .map(|(_, content)| content.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_history_is_newest_first() {
        let store = MemoryArtifactStore::new();
        let path = Path::new("requirements/REQ-001.md");

        store.seed_commit(path, "created", "a", 100, "v1");
        store.seed_commit(path, "updated", "a", 200, "v2");

        let history = store.get_history(path).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "updated");
        assert_eq!(history[1].message, "created");
    }

    #[tokio::test]
    async fn read_at_commit_pins_seeded_content() {
        let store = MemoryArtifactStore::new();
        let path = Path::new("requirements/REQ-001.md");

        let first = store.seed_commit(path, "created", "a", 100, "v1");
        store.seed_commit(path, "updated", "a", 200, "v2");

        let content = store.read_file_at_commit(path, &first.hash).await.unwrap();
        assert_eq!(content.as_deref(), Some("v1"));

        let missing = store.read_file_at_commit(path, "unknown").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn write_then_commit_appends_history() {
        let store = MemoryArtifactStore::new();
        let path = Path::new("risks/RISK-001.md");

        store.write_file(path, "risk body").await.unwrap();
        let commit = store.commit_file(path, "created").await.unwrap();
        assert!(commit.timestamp_ms > 0);

        let history = store.get_history(path).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn committing_an_unwritten_path_fails() {
        let store = MemoryArtifactStore::new();
        let err = store
            .commit_file(Path::new("requirements/REQ-404.md"), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CommitFailed(_)));
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_history_fetch() {
        let store = MemoryArtifactStore::new();
        let path = Path::new("usecases/UC-001.md");
        store.seed_commit(path, "created", "a", 100, "v1");
        store.fail_history_for(path);

        let err = store.get_history(path).await.unwrap_err();
        assert!(matches!(err, StoreError::HistoryFetch(_)));
    }

    #[tokio::test]
    async fn unavailable_store_reports_not_ready() {
        let store = MemoryArtifactStore::unavailable();
        assert!(!store.is_ready().await);
        let err = store
            .get_history(Path::new("requirements/REQ-001.md"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
