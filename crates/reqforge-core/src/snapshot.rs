//! Whole-state version snapshots: a bounded undo log.
//!
//! Independent of the commit-backed history, the snapshot manager keeps a
//! capped list of deep copies of the live artifact collections. Auto-save
//! snapshots are debounced behind a quiet period; restoring overwrites the
//! live state and records the restore itself as a new snapshot, so every
//! restore stays inspectable in history.

use crate::artifact::ArtifactCollections;
use crate::bus::{ArtifactMutated, Bus, SnapshotRecorded, SnapshotRestored};
use crate::debounce::DebounceSlot;
use crate::error::{CoreError, CoreResult};
use reqforge_storage::json::JsonStorage;
use reqforge_storage::Storage;
use reqforge_util::{now_ms, Identifier};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Maximum number of retained snapshots per project.
pub const SNAPSHOT_LIMIT: usize = 50;

/// Quiet period before a mutation burst is auto-saved.
pub const AUTO_SAVE_QUIET: Duration = Duration::from_millis(2000);

/// Why a snapshot was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    AutoSave,
    Baseline,
    Restore,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::AutoSave => "auto-save",
            SnapshotKind::Baseline => "baseline",
            SnapshotKind::Restore => "restore",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A full capture of the artifact collections at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub message: String,
    pub kind: SnapshotKind,
    pub timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Deep copy of all artifact collections.
    pub data: ArtifactCollections,
}

/// Maintains the bounded snapshot list for one project session.
///
/// Cheap to clone; clones share the same slot and listener, so a session
/// has exactly one pending auto-save timer at any moment.
#[derive(Clone)]
pub struct VersionSnapshotManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    storage: JsonStorage,
    bus: Bus,
    project_id: String,
    project_name: String,
    live: Arc<RwLock<ArtifactCollections>>,
    auto_save: DebounceSlot,
    /// Serializes list read-modify-write so a firing auto-save cannot race
    /// a manual record.
    record_gate: Mutex<()>,
    listener: StdMutex<Option<JoinHandle<()>>>,
}

impl VersionSnapshotManager {
    /// Create a manager over a project's live collections.
    pub fn new(
        storage: JsonStorage,
        bus: Bus,
        project_id: impl Into<String>,
        project_name: impl Into<String>,
        live: Arc<RwLock<ArtifactCollections>>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                storage,
                bus,
                project_id: project_id.into(),
                project_name: project_name.into(),
                live,
                auto_save: DebounceSlot::new(AUTO_SAVE_QUIET),
                record_gate: Mutex::new(()),
                listener: StdMutex::new(None),
            }),
        }
    }

    /// Start observing artifact mutations for debounced auto-save.
    ///
    /// Each mutation of this project reschedules the single timer slot;
    /// mutations of other projects are ignored.
    pub async fn watch_mutations(&self) {
        let mut rx = self.inner.bus.subscribe::<ArtifactMutated>().await;
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                if event.project_id == manager.inner.project_id {
                    manager.schedule_auto_save();
                }
            }
        });

        let mut listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(old) = listener.replace(handle) {
            old.abort();
        }
    }

    /// Record a snapshot of the live collections right now.
    ///
    /// The new snapshot is prepended; the list is truncated to
    /// [`SNAPSHOT_LIMIT`], dropping the oldest-inserted entries first.
    pub async fn record_snapshot(
        &self,
        kind: SnapshotKind,
        message: impl Into<String>,
        tag: Option<String>,
    ) -> CoreResult<VersionSnapshot> {
        let _gate = self.inner.record_gate.lock().await;

        let data = self.inner.live.read().await.clone();
        let snapshot = VersionSnapshot {
            id: Identifier::snapshot(),
            project_id: self.inner.project_id.clone(),
            project_name: self.inner.project_name.clone(),
            message: message.into(),
            kind,
            timestamp_ms: now_ms(),
            tag,
            data,
        };

        let mut list = self.load_list().await?;
        list.insert(0, snapshot.clone());
        list.truncate(SNAPSHOT_LIMIT);
        self.save_list(&list).await?;

        debug!(
            snapshot = %snapshot.id,
            kind = %snapshot.kind,
            retained = list.len(),
            "Recorded version snapshot"
        );

        self.inner
            .bus
            .publish(SnapshotRecorded {
                project_id: self.inner.project_id.clone(),
                snapshot_id: snapshot.id.clone(),
                kind: kind.as_str(),
            })
            .await;

        Ok(snapshot)
    }

    /// All retained snapshots, newest-first.
    pub async fn list(&self) -> CoreResult<Vec<VersionSnapshot>> {
        self.load_list().await
    }

    /// Get a snapshot by ID.
    pub async fn get(&self, snapshot_id: &str) -> CoreResult<Option<VersionSnapshot>> {
        Ok(self
            .load_list()
            .await?
            .into_iter()
            .find(|s| s.id == snapshot_id))
    }

    /// Overwrite the live collections with a snapshot's captured state.
    ///
    /// The restore is itself recorded as a `restore`-kind snapshot, so it
    /// shows up as a new point in history. Returns the snapshot that was
    /// restored.
    pub async fn restore_version(&self, snapshot_id: &str) -> CoreResult<VersionSnapshot> {
        let snapshot = self
            .get(snapshot_id)
            .await?
            .ok_or_else(|| CoreError::SnapshotNotFound(snapshot_id.to_string()))?;

        {
            let mut live = self.inner.live.write().await;
            *live = snapshot.data.clone();
        }

        self.inner
            .bus
            .publish(SnapshotRestored {
                project_id: self.inner.project_id.clone(),
                snapshot_id: snapshot.id.clone(),
            })
            .await;

        self.record_snapshot(
            SnapshotKind::Restore,
            format!("Restored \"{}\"", snapshot.message),
            None,
        )
        .await?;

        Ok(snapshot)
    }

    /// Cancel the pending auto-save and stop observing mutations.
    ///
    /// Must run before the session is dropped on a project switch, so a
    /// timer armed here can never write into another project's history.
    pub fn shutdown(&self) {
        self.inner.auto_save.cancel();
        if let Some(listener) = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            listener.abort();
        }
    }

    /// Whether an auto-save is currently pending.
    pub fn auto_save_pending(&self) -> bool {
        self.inner.auto_save.is_armed()
    }

    fn schedule_auto_save(&self) {
        let manager = self.clone();
        self.inner.auto_save.schedule(async move {
            if let Err(e) = manager
                .record_snapshot(SnapshotKind::AutoSave, "Auto-save", None)
                .await
            {
                warn!(error = %e, "Auto-save snapshot failed");
            }
        });
    }

    async fn load_list(&self) -> CoreResult<Vec<VersionSnapshot>> {
        Ok(self
            .inner
            .storage
            .read(&["snapshot", &self.inner.project_id])
            .await?
            .unwrap_or_default())
    }

    async fn save_list(&self, list: &[VersionSnapshot]) -> CoreResult<()> {
        self.inner
            .storage
            .write(&["snapshot", &self.inner.project_id], &list)
            .await?;
        Ok(())
    }
}
