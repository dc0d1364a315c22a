//! Revision windows: the commits of an artifact after a time boundary.
//!
//! Used identically by the revision-history view (one artifact) and by
//! document exporters (batch sweep across a baseline's artifacts).

use crate::artifact::{ArtifactKind, TrackedArtifact};
use crate::error::CoreResult;
use reqforge_vcs::{ArtifactStore, CommitInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes ordered commit windows for artifacts.
#[derive(Clone)]
pub struct RevisionWindowResolver {
    store: Arc<dyn ArtifactStore>,
}

impl RevisionWindowResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Commits of one artifact strictly after `since_ms`, ascending by
    /// time. `None` means unbounded (the full history).
    ///
    /// The boundary is captured here, at invocation: commits landing while
    /// the call is in flight do not change the result for a fixed store
    /// state. An uninitialized store yields an empty window.
    pub async fn commits_since(
        &self,
        kind: ArtifactKind,
        artifact_id: &str,
        since_ms: Option<i64>,
    ) -> CoreResult<Vec<CommitInfo>> {
        let path = kind.file_path(artifact_id);

        let mut commits = match self.store.get_history(&path).await {
            Ok(commits) => commits,
            Err(e) if e.is_unavailable() => {
                debug!(artifact = artifact_id, "Store not ready; empty window");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        // The store reports newest-first; flip to the canonical ascending
        // order, keeping store order among equal timestamps.
        commits.reverse();

        if let Some(boundary) = since_ms {
            commits.retain(|c| c.timestamp_ms > boundary);
        }

        commits.sort_by_key(|c| c.timestamp_ms);
        Ok(commits)
    }

    /// Windows for a batch of artifacts, keyed by artifact id.
    ///
    /// Artifacts are processed one at a time to bound concurrent load on
    /// the store. A failing history read is isolated: the artifact
    /// contributes an empty window and the sweep continues.
    pub async fn sweep_since(
        &self,
        artifacts: &[TrackedArtifact],
        since_ms: Option<i64>,
    ) -> HashMap<String, Vec<CommitInfo>> {
        let mut windows = HashMap::new();

        for artifact in artifacts {
            match self
                .commits_since(artifact.kind, &artifact.id, since_ms)
                .await
            {
                Ok(commits) => {
                    windows.insert(artifact.id.clone(), commits);
                }
                Err(e) => {
                    warn!(
                        artifact = %artifact.id,
                        error = %e,
                        "History fetch failed; artifact contributes no revisions"
                    );
                    windows.insert(artifact.id.clone(), Vec::new());
                }
            }
        }

        windows
    }
}
