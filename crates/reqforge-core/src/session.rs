//! Project session lifecycle.
//!
//! All engine state is scoped to an explicit session object constructed
//! per open project — no ambient globals. The session owns the event bus,
//! the live artifact collections and the write gate, and wires the
//! baseline/window/label/snapshot machinery to them. `dispose` tears the
//! session down, cancelling any pending auto-save so a project switch can
//! never bleed state into the next project.

use crate::artifact::{ArtifactCollections, ArtifactKind};
use crate::baseline::BaselineManager;
use crate::bus::{ArtifactMutated, Bus, SessionDisposed};
use crate::error::CoreResult;
use crate::label::RevisionLabelResolver;
use crate::project::Project;
use crate::snapshot::VersionSnapshotManager;
use crate::window::RevisionWindowResolver;
use reqforge_storage::json::JsonStorage;
use reqforge_storage::Storage;
use reqforge_vcs::{ArtifactStore, CommitInfo};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// An open project session.
#[derive(Clone)]
pub struct ProjectSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    project: Project,
    storage: JsonStorage,
    store: Arc<dyn ArtifactStore>,
    bus: Bus,
    live: Arc<RwLock<ArtifactCollections>>,
    /// Serializes commits and baseline creation for this project: a
    /// baseline captured mid-commit could pin a hash that never lands.
    write_gate: Arc<Mutex<()>>,
    snapshots: VersionSnapshotManager,
}

impl ProjectSession {
    /// Open a session for the project rooted at `root`.
    ///
    /// Reuses the persisted project record when the root was seen before;
    /// otherwise creates one under `name`. Live collections are loaded
    /// from storage and the auto-save observer is started.
    pub async fn open(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        store: Arc<dyn ArtifactStore>,
        storage: JsonStorage,
    ) -> CoreResult<Self> {
        let root = root.as_ref();

        let project = match Project::find_by_root(&storage, root).await? {
            Some(mut existing) => {
                existing.touch();
                existing
            }
            None => Project::new(name, root),
        };
        project.save(&storage).await?;

        let collections: ArtifactCollections = storage
            .read(&["collections", &project.id])
            .await?
            .unwrap_or_default();

        let bus = Bus::new();
        let live = Arc::new(RwLock::new(collections));
        let snapshots = VersionSnapshotManager::new(
            storage.clone(),
            bus.clone(),
            project.id.clone(),
            project.name.clone(),
            live.clone(),
        );
        snapshots.watch_mutations().await;

        info!(project = %project.id, root = %root.display(), "Opened project session");

        Ok(Self {
            inner: Arc::new(SessionInner {
                project,
                storage,
                store,
                bus,
                live,
                write_gate: Arc::new(Mutex::new(())),
                snapshots,
            }),
        })
    }

    /// The project record.
    pub fn project(&self) -> &Project {
        &self.inner.project
    }

    /// The project ID.
    pub fn project_id(&self) -> &str {
        &self.inner.project.id
    }

    /// The event bus.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// The artifact file store.
    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        self.inner.store.clone()
    }

    /// The version snapshot manager.
    pub fn snapshots(&self) -> &VersionSnapshotManager {
        &self.inner.snapshots
    }

    /// Baseline manager wired to this session's write gate.
    pub fn baselines(&self) -> BaselineManager {
        BaselineManager::new(
            self.inner.storage.clone(),
            self.inner.store.clone(),
            self.inner.bus.clone(),
            self.inner.project.id.clone(),
            self.inner.write_gate.clone(),
        )
    }

    /// Revision window resolver.
    pub fn windows(&self) -> RevisionWindowResolver {
        RevisionWindowResolver::new(self.inner.store.clone())
    }

    /// Revision label resolver.
    pub fn labels(&self) -> RevisionLabelResolver {
        RevisionLabelResolver::new(self.inner.store.clone())
    }

    /// A deep copy of the live artifact collections.
    pub async fn collections(&self) -> ArtifactCollections {
        self.inner.live.read().await.clone()
    }

    /// Mutate the live collections.
    ///
    /// Persists the new state and publishes [`ArtifactMutated`], which
    /// (re)arms the debounced auto-save.
    pub async fn mutate_collections<F>(&self, mutate: F) -> CoreResult<()>
    where
        F: FnOnce(&mut ArtifactCollections),
    {
        {
            let mut live = self.inner.live.write().await;
            mutate(&mut live);
            self.inner
                .storage
                .write(&["collections", &self.inner.project.id], &*live)
                .await?;
        }

        self.inner
            .bus
            .publish(ArtifactMutated {
                project_id: self.inner.project.id.clone(),
            })
            .await;

        Ok(())
    }

    /// Write an artifact file's content into the working tree.
    pub async fn write_artifact(
        &self,
        kind: ArtifactKind,
        artifact_id: &str,
        content: &str,
    ) -> CoreResult<()> {
        let path = kind.file_path(artifact_id);
        self.inner.store.write_file(&path, content).await?;
        Ok(())
    }

    /// Commit an artifact file.
    ///
    /// Takes the project write gate so a commit can never interleave with
    /// baseline creation. Failures propagate; nothing is retried.
    pub async fn commit_artifact(
        &self,
        kind: ArtifactKind,
        artifact_id: &str,
        message: &str,
    ) -> CoreResult<CommitInfo> {
        let path = kind.file_path(artifact_id);
        let _gate = self.inner.write_gate.lock().await;
        Ok(self.inner.store.commit_file(&path, message).await?)
    }

    /// Tear the session down.
    ///
    /// Cancels the pending auto-save timer before anything else, so the
    /// snapshot of one project can never land in another's history.
    pub async fn dispose(&self) {
        self.inner.snapshots.shutdown();
        self.inner
            .bus
            .publish(SessionDisposed {
                project_id: self.inner.project.id.clone(),
            })
            .await;
        info!(project = %self.inner.project.id, "Disposed project session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactRecord;
    use reqforge_vcs::MemoryArtifactStore;

    fn test_storage() -> JsonStorage {
        let dir = tempfile::tempdir().unwrap();
        JsonStorage::new(dir.keep())
    }

    async fn open_session(store: Arc<MemoryArtifactStore>) -> ProjectSession {
        ProjectSession::open("/data/avionics", "Avionics", store, test_storage())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_creates_and_reuses_the_project_record() {
        let storage = test_storage();
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());

        let first = ProjectSession::open("/data/avionics", "Avionics", store.clone(), storage.clone())
            .await
            .unwrap();
        let first_id = first.project_id().to_string();
        first.dispose().await;

        let second = ProjectSession::open("/data/avionics", "Renamed", store, storage)
            .await
            .unwrap();
        // Same root: the existing record wins over the offered name.
        assert_eq!(second.project_id(), first_id);
        assert_eq!(second.project().name, "Avionics");
    }

    #[tokio::test]
    async fn mutations_persist_and_reload() {
        let storage = test_storage();
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());

        let session = ProjectSession::open("/data/avionics", "Avionics", store.clone(), storage.clone())
            .await
            .unwrap();
        session
            .mutate_collections(|c| {
                c.requirements.push(ArtifactRecord::new("REQ-001"));
            })
            .await
            .unwrap();
        session.dispose().await;

        let reopened = ProjectSession::open("/data/avionics", "Avionics", store, storage)
            .await
            .unwrap();
        let collections = reopened.collections().await;
        assert_eq!(collections.requirements.len(), 1);
        assert_eq!(collections.requirements[0].id, "REQ-001");
    }

    #[tokio::test]
    async fn mutation_publishes_artifact_mutated() {
        let store = Arc::new(MemoryArtifactStore::new());
        let session = open_session(store).await;
        let mut rx = session.bus().subscribe::<ArtifactMutated>().await;

        session
            .mutate_collections(|c| {
                c.risks.push(ArtifactRecord::new("RISK-001"));
            })
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.project_id, session.project_id());
    }

    #[tokio::test]
    async fn write_and_commit_artifact_round_trip() {
        let store = Arc::new(MemoryArtifactStore::new());
        let session = open_session(store).await;

        session
            .write_artifact(ArtifactKind::Requirement, "REQ-001", "---\nrevision: \"01\"\n---\n")
            .await
            .unwrap();
        let commit = session
            .commit_artifact(ArtifactKind::Requirement, "REQ-001", "Created REQ-001")
            .await
            .unwrap();
        assert_eq!(commit.message, "Created REQ-001");

        let windows = session.windows();
        let commits = windows
            .commits_since(ArtifactKind::Requirement, "REQ-001", None)
            .await
            .unwrap();
        assert_eq!(commits.len(), 1);
    }

    #[tokio::test]
    async fn dispose_cancels_pending_auto_save() {
        let store = Arc::new(MemoryArtifactStore::new());
        let session = open_session(store).await;

        session
            .mutate_collections(|c| {
                c.information.push(ArtifactRecord::new("INFO-001"));
            })
            .await
            .unwrap();
        // Give the observer a chance to arm the timer.
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert!(session.snapshots().auto_save_pending());

        session.dispose().await;
        assert!(!session.snapshots().auto_save_pending());
    }

    #[tokio::test]
    async fn commit_failures_propagate() {
        let store = Arc::new(MemoryArtifactStore::new());
        let session = open_session(store).await;

        // Never written, so the commit fails and the error surfaces.
        let result = session
            .commit_artifact(ArtifactKind::TestCase, "TC-404", "nope")
            .await;
        assert!(result.is_err());
    }
}
