//! Git-backed artifact store using the git2 crate.
//!
//! One repository per project root; artifact files are committed
//! individually so that each file carries its own history. The repository
//! is opened per operation rather than held open, which keeps the store
//! handle `Send + Sync` without wrapping git2 types in locks.

use crate::store::{ArtifactStore, CommitInfo};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use git2::{Oid, Repository, Signature};
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Fallback committer identity when the repository has none configured.
const FALLBACK_NAME: &str = "reqforge";
const FALLBACK_EMAIL: &str = "reqforge@localhost";

/// Git-backed artifact store rooted at a project directory.
pub struct GitArtifactStore {
    root: PathBuf,
    /// Serializes commits: the repository index supports only one safe
    /// in-flight write at a time.
    commit_gate: Mutex<()>,
}

impl GitArtifactStore {
    /// Create a store handle for an existing project root.
    ///
    /// The repository is not opened here; readiness is checked per
    /// operation so a handle can outlive `init`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            commit_gate: Mutex::new(()),
        }
    }

    /// Initialize a repository at the project root (idempotent).
    pub fn init(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        Repository::init(&root)?;
        info!(root = %root.display(), "Initialized artifact repository");
        Ok(Self {
            root,
            commit_gate: Mutex::new(()),
        })
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open_repo(&self) -> StoreResult<Repository> {
        Repository::open(&self.root)
            .map_err(|_| StoreError::unavailable(self.root.display().to_string()))
    }

    /// Normalize a path to be relative to the project root, rejecting
    /// escapes.
    fn relative(&self, path: &Path) -> StoreResult<PathBuf> {
        let rel = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .map_err(|_| {
                    StoreError::InvalidPath(format!(
                        "{} is outside project root {}",
                        path.display(),
                        self.root.display()
                    ))
                })?
                .to_path_buf()
        } else {
            path.to_path_buf()
        };

        if rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            return Err(StoreError::InvalidPath(format!(
                "{} escapes the project root",
                path.display()
            )));
        }

        Ok(rel)
    }

    fn signature(repo: &Repository) -> StoreResult<Signature<'static>> {
        match repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    fn commit_sync(&self, path: &Path, message: &str) -> StoreResult<CommitInfo> {
        let rel = self.relative(path)?;
        let repo = self.open_repo()?;
        let mut index = repo.index()?;

        // Stage the one artifact file; a deleted file stages its removal.
        if self.root.join(&rel).exists() {
            index.add_path(&rel)?;
        } else {
            index.remove_path(&rel)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };

        if let Some(ref parent) = parent {
            if parent.tree_id() == tree_id {
                return Err(StoreError::CommitFailed(format!(
                    "no changes to record for {}",
                    rel.display()
                )));
            }
        }

        let sig = Self::signature(&repo)?;
        let parent_refs: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?;

        let commit = repo.find_commit(oid)?;
        debug!(path = %rel.display(), hash = %oid, "Committed artifact");
        Ok(commit_info(&commit))
    }

    fn history_sync(&self, path: &Path) -> StoreResult<Vec<CommitInfo>> {
        let rel = self.relative(path)?;
        let repo = self.open_repo()?;

        // Unborn branch: no commits yet, so no history for anything.
        if repo.head().is_err() {
            return Ok(Vec::new());
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            if commit_touches_path(&commit, &rel)? {
                commits.push(commit_info(&commit));
            }
        }

        // Newest-first by store convention.
        Ok(commits)
    }

    fn read_at_commit_sync(&self, path: &Path, commit_hash: &str) -> StoreResult<Option<String>> {
        let rel = self.relative(path)?;
        let repo = self.open_repo()?;

        let oid = Oid::from_str(commit_hash)?;
        let commit = repo.find_commit(oid)?;
        let tree = commit.tree()?;

        let entry = match tree.get_path(&rel) {
            Ok(entry) => entry,
            Err(_) => return Ok(None),
        };

        let blob = repo.find_blob(entry.id())?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }
}

#[async_trait]
impl ArtifactStore for GitArtifactStore {
    async fn is_ready(&self) -> bool {
        Repository::open(&self.root).is_ok()
    }

    async fn write_file(&self, path: &Path, content: &str) -> StoreResult<()> {
        let rel = self.relative(path)?;
        let full = self.root.join(&rel);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, content).await?;
        Ok(())
    }

    async fn commit_file(&self, path: &Path, message: &str) -> StoreResult<CommitInfo> {
        let _gate = self.commit_gate.lock().await;
        self.commit_sync(path, message)
    }

    async fn get_history(&self, path: &Path) -> StoreResult<Vec<CommitInfo>> {
        self.history_sync(path)
    }

    async fn read_file_at_commit(
        &self,
        path: &Path,
        commit_hash: &str,
    ) -> StoreResult<Option<String>> {
        self.read_at_commit_sync(path, commit_hash)
    }
}

fn commit_info(commit: &git2::Commit) -> CommitInfo {
    CommitInfo {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or("").trim_end().to_string(),
        author: commit.author().name().unwrap_or("").to_string(),
        timestamp_ms: commit.time().seconds() * 1000,
    }
}

/// Whether a commit changed the file at `rel` relative to its parents.
///
/// Root commits count when the path is present; merge commits count when
/// the blob differs from any parent.
fn commit_touches_path(commit: &git2::Commit, rel: &Path) -> StoreResult<bool> {
    let current = blob_oid_at(&commit.tree()?, rel);

    if commit.parent_count() == 0 {
        return Ok(current.is_some());
    }

    for parent in commit.parents() {
        let parent_oid = blob_oid_at(&parent.tree()?, rel);
        if parent_oid != current {
            return Ok(true);
        }
    }

    Ok(false)
}

fn blob_oid_at(tree: &git2::Tree, rel: &Path) -> Option<Oid> {
    tree.get_path(rel).ok().map(|entry| entry.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, GitArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = GitArtifactStore::init(dir.path()).unwrap();

        // Configure identity so commits work in a bare test environment.
        let repo = Repository::open(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        (dir, store)
    }

    #[tokio::test]
    async fn store_without_repo_is_not_ready() {
        let dir = TempDir::new().unwrap();
        let store = GitArtifactStore::new(dir.path());
        assert!(!store.is_ready().await);

        let err = store
            .get_history(Path::new("requirements/REQ-001.md"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn initialized_store_is_ready_with_empty_history() {
        let (_dir, store) = setup_store();
        assert!(store.is_ready().await);

        let history = store
            .get_history(Path::new("requirements/REQ-001.md"))
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn write_commit_and_read_back() {
        let (_dir, store) = setup_store();
        let path = Path::new("requirements/REQ-001.md");

        store.write_file(path, "content v1").await.unwrap();
        let commit = store.commit_file(path, "Created REQ-001").await.unwrap();

        assert_eq!(commit.message, "Created REQ-001");
        assert_eq!(commit.author, "Test User");
        assert_eq!(commit.hash.len(), 40);
        assert!(commit.timestamp_ms > 0);

        let content = store
            .read_file_at_commit(path, &commit.hash)
            .await
            .unwrap();
        assert_eq!(content.as_deref(), Some("content v1"));
    }

    #[tokio::test]
    async fn history_is_scoped_per_file_and_newest_first() {
        let (_dir, store) = setup_store();
        let req = Path::new("requirements/REQ-001.md");
        let tc = Path::new("testcases/TC-001.md");

        store.write_file(req, "req v1").await.unwrap();
        store.commit_file(req, "req: created").await.unwrap();

        store.write_file(tc, "tc v1").await.unwrap();
        store.commit_file(tc, "tc: created").await.unwrap();

        store.write_file(req, "req v2").await.unwrap();
        store.commit_file(req, "req: updated").await.unwrap();

        let req_history = store.get_history(req).await.unwrap();
        assert_eq!(req_history.len(), 2);
        assert_eq!(req_history[0].message, "req: updated");
        assert_eq!(req_history[1].message, "req: created");

        let tc_history = store.get_history(tc).await.unwrap();
        assert_eq!(tc_history.len(), 1);
        assert_eq!(tc_history[0].message, "tc: created");
    }

    #[tokio::test]
    async fn history_timestamps_are_non_decreasing_oldest_to_newest() {
        let (_dir, store) = setup_store();
        let path = Path::new("risks/RISK-001.md");

        for i in 1..=3 {
            store
                .write_file(path, &format!("risk v{i}"))
                .await
                .unwrap();
            store.commit_file(path, &format!("rev {i}")).await.unwrap();
        }

        let history = store.get_history(path).await.unwrap();
        assert_eq!(history.len(), 3);
        for pair in history.windows(2) {
            // Newest-first, so each entry is at least as new as the next.
            assert!(pair[0].timestamp_ms >= pair[1].timestamp_ms);
        }
    }

    #[tokio::test]
    async fn read_at_commit_returns_historical_content() {
        let (_dir, store) = setup_store();
        let path = Path::new("usecases/UC-001.md");

        store.write_file(path, "original").await.unwrap();
        let first = store.commit_file(path, "v1").await.unwrap();

        store.write_file(path, "changed").await.unwrap();
        let second = store.commit_file(path, "v2").await.unwrap();

        let old = store.read_file_at_commit(path, &first.hash).await.unwrap();
        assert_eq!(old.as_deref(), Some("original"));

        let new = store.read_file_at_commit(path, &second.hash).await.unwrap();
        assert_eq!(new.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn read_at_commit_missing_path_is_none() {
        let (_dir, store) = setup_store();
        let req = Path::new("requirements/REQ-001.md");

        store.write_file(req, "content").await.unwrap();
        let commit = store.commit_file(req, "created").await.unwrap();

        let missing = store
            .read_file_at_commit(Path::new("risks/RISK-404.md"), &commit.hash)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn committing_an_unchanged_file_fails() {
        let (_dir, store) = setup_store();
        let path = Path::new("information/INFO-001.md");

        store.write_file(path, "same").await.unwrap();
        store.commit_file(path, "created").await.unwrap();

        let err = store.commit_file(path, "no-op").await.unwrap_err();
        assert!(matches!(err, StoreError::CommitFailed(_)));
    }

    #[tokio::test]
    async fn paths_escaping_the_root_are_rejected() {
        let (_dir, store) = setup_store();
        let err = store
            .write_file(Path::new("../outside.md"), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn deleting_then_committing_records_the_removal() {
        let (dir, store) = setup_store();
        let path = Path::new("requirements/REQ-002.md");

        store.write_file(path, "to be removed").await.unwrap();
        store.commit_file(path, "created").await.unwrap();

        std::fs::remove_file(dir.path().join(path)).unwrap();
        let commit = store.commit_file(path, "removed").await.unwrap();

        // The removal commit shows up in the file's history, and the file
        // is absent from its tree.
        let history = store.get_history(path).await.unwrap();
        assert_eq!(history.len(), 2);
        let content = store.read_file_at_commit(path, &commit.hash).await.unwrap();
        assert!(content.is_none());
    }
}
