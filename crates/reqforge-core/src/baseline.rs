//! Project baselines: named, immutable snapshots of commit hashes.
//!
//! A baseline pins every tracked artifact to its latest known commit at
//! creation time. Baselines are append-only — there is deliberately no
//! update or delete API — and ordered by timestamp.

use crate::artifact::{ArtifactCollections, ArtifactKind};
use crate::bus::{BaselineCreated, Bus};
use crate::error::{CoreError, CoreResult};
use reqforge_storage::json::JsonStorage;
use reqforge_storage::Storage;
use reqforge_util::{now_ms, Identifier};
use reqforge_vcs::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The commit a baseline pins for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselinedCommit {
    pub commit_hash: String,
    pub kind: ArtifactKind,
}

/// A named, immutable snapshot of the project's commit state.
///
/// `artifact_commits` is frozen at creation: artifacts with no commit
/// history at that moment are omitted, never recorded as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBaseline {
    pub id: String,
    pub project_id: String,
    /// 1-based sequence number within the project.
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub timestamp_ms: i64,
    pub artifact_commits: BTreeMap<String, BaselinedCommit>,
}

/// Creates and resolves baselines for one project.
pub struct BaselineManager {
    storage: JsonStorage,
    store: Arc<dyn ArtifactStore>,
    bus: Bus,
    project_id: String,
    /// Shared with the commit path: a baseline must never be captured
    /// while a commit is in flight, or it could pin a stale hash.
    write_gate: Arc<Mutex<()>>,
}

impl BaselineManager {
    /// Create a manager for a project.
    pub fn new(
        storage: JsonStorage,
        store: Arc<dyn ArtifactStore>,
        bus: Bus,
        project_id: impl Into<String>,
        write_gate: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            storage,
            store,
            bus,
            project_id: project_id.into(),
            write_gate,
        }
    }

    /// Create a baseline pinning the current head commit of every tracked
    /// artifact.
    ///
    /// A failing history query skips that one artifact and continues: a
    /// baseline with partial coverage beats no baseline. Artifacts with no
    /// commits yet are silently omitted.
    pub async fn create_baseline(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        collections: &ArtifactCollections,
    ) -> CoreResult<ProjectBaseline> {
        let _gate = self.write_gate.lock().await;

        let mut artifact_commits = BTreeMap::new();
        for artifact in collections.tracked() {
            match self.store.get_history(&artifact.file_path).await {
                Ok(history) => {
                    // Newest-first: the head commit is the first entry.
                    if let Some(head) = history.first() {
                        artifact_commits.insert(
                            artifact.id.clone(),
                            BaselinedCommit {
                                commit_hash: head.hash.clone(),
                                kind: artifact.kind,
                            },
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        artifact = %artifact.id,
                        error = %e,
                        "Skipping artifact while creating baseline"
                    );
                }
            }
        }

        let version = self.list().await?.len() as u32 + 1;
        let baseline = ProjectBaseline {
            id: Identifier::baseline(),
            project_id: self.project_id.clone(),
            version,
            name: name.into(),
            description: description.into(),
            timestamp_ms: now_ms(),
            artifact_commits,
        };

        self.storage
            .write(&["baseline", &self.project_id, &baseline.id], &baseline)
            .await?;

        info!(
            baseline = %baseline.id,
            name = %baseline.name,
            pinned = baseline.artifact_commits.len(),
            "Created baseline"
        );

        self.bus
            .publish(BaselineCreated {
                project_id: self.project_id.clone(),
                baseline_id: baseline.id.clone(),
                name: baseline.name.clone(),
            })
            .await;

        Ok(baseline)
    }

    /// All baselines of the project, ascending by creation time.
    pub async fn list(&self) -> CoreResult<Vec<ProjectBaseline>> {
        let keys = self.storage.list(&["baseline", &self.project_id]).await?;

        let mut baselines = Vec::new();
        for key in keys {
            let key_refs: Vec<&str> = key.iter().map(|s| s.as_str()).collect();
            if let Some(baseline) = self.storage.read::<ProjectBaseline>(&key_refs).await? {
                baselines.push(baseline);
            }
        }

        baselines.sort_by_key(|b| (b.timestamp_ms, b.version));
        Ok(baselines)
    }

    /// Get a baseline by ID.
    pub async fn get(&self, baseline_id: &str) -> CoreResult<Option<ProjectBaseline>> {
        Ok(self
            .storage
            .read(&["baseline", &self.project_id, baseline_id])
            .await?)
    }

    /// The baseline preceding `target`.
    ///
    /// `None` means "current state": returns the most recent baseline, or
    /// `None` when the project has none. For a concrete target, returns
    /// the nearest baseline with a strictly earlier timestamp — never the
    /// target itself, even when several baselines share its timestamp.
    pub async fn previous_baseline(
        &self,
        target: Option<&str>,
    ) -> CoreResult<Option<ProjectBaseline>> {
        let mut baselines = self.list().await?;
        baselines.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));

        match target {
            None => Ok(baselines.into_iter().next()),
            Some(target_id) => {
                let target = baselines
                    .iter()
                    .find(|b| b.id == target_id)
                    .cloned()
                    .ok_or_else(|| CoreError::BaselineNotFound(target_id.to_string()))?;

                Ok(baselines
                    .into_iter()
                    .find(|b| b.timestamp_ms < target.timestamp_ms))
            }
        }
    }
}
