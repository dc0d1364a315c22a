//! Revision-history sections for exports and the history view.
//!
//! Exporters render a "Revision History" section restricted to commits
//! after the most recently relevant baseline. When the resulting commit
//! set is empty the section is omitted entirely, so the builder returns
//! `None` instead of an empty section.

use crate::artifact::{ArtifactKind, TrackedArtifact};
use crate::baseline::{BaselineManager, ProjectBaseline};
use crate::error::CoreResult;
use crate::label::RevisionLabelResolver;
use crate::window::RevisionWindowResolver;
use reqforge_util::time::format_ms;
use reqforge_vcs::CommitInfo;

/// One row of a revision-history section.
#[derive(Debug, Clone)]
pub struct RevisionEntry {
    pub artifact_id: String,
    pub kind: ArtifactKind,
    /// Human-facing revision label parsed from content at the commit.
    pub revision: String,
    pub commit: CommitInfo,
}

/// A non-empty revision-history section.
#[derive(Debug, Clone)]
pub struct RevisionHistory {
    /// The baseline bounding the window from below, if any.
    pub since_baseline: Option<ProjectBaseline>,
    pub entries: Vec<RevisionEntry>,
}

impl RevisionHistory {
    /// Render the section as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Revision History\n\n");
        if let Some(baseline) = &self.since_baseline {
            out.push_str(&format!(
                "Changes since baseline \"{}\" (v{}).\n\n",
                baseline.name, baseline.version
            ));
        }
        out.push_str("| Artifact | Kind | Rev | Date | Author | Description |\n");
        out.push_str("|----------|------|-----|------|--------|-------------|\n");
        for entry in &self.entries {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                entry.artifact_id,
                entry.kind,
                entry.revision,
                format_ms(entry.commit.timestamp_ms),
                entry.commit.author,
                entry.commit.message.replace('|', "\\|"),
            ));
        }
        out
    }
}

/// Build the revision-history section for `target`.
///
/// `target` of `None` means the current state: the window opens at the
/// most recent baseline (unbounded when the project has none). A concrete
/// target is a point-in-time view of that baseline: the window opens at
/// its predecessor and closes at the baseline itself, so commits landing
/// after it never leak into its export.
///
/// Returns `None` when no commit falls inside the window.
pub async fn revision_history(
    baselines: &BaselineManager,
    windows: &RevisionWindowResolver,
    labels: &RevisionLabelResolver,
    artifacts: &[TrackedArtifact],
    target: Option<&str>,
) -> CoreResult<Option<RevisionHistory>> {
    let until_ms = match target {
        Some(baseline_id) => baselines
            .get(baseline_id)
            .await?
            .map(|baseline| baseline.timestamp_ms),
        None => None,
    };

    let since_baseline = baselines.previous_baseline(target).await?;
    let since_ms = since_baseline.as_ref().map(|b| b.timestamp_ms);

    let mut window_map = windows.sweep_since(artifacts, since_ms).await;

    let mut entries = Vec::new();
    for artifact in artifacts {
        let Some(mut commits) = window_map.remove(&artifact.id) else {
            continue;
        };
        if let Some(until) = until_ms {
            commits.retain(|c| c.timestamp_ms <= until);
        }
        for commit in commits {
            let revision = labels
                .label_at_commit(artifact.kind, &artifact.file_path, &commit.hash)
                .await;
            entries.push(RevisionEntry {
                artifact_id: artifact.id.clone(),
                kind: artifact.kind,
                revision,
                commit,
            });
        }
    }

    if entries.is_empty() {
        return Ok(None);
    }

    Ok(Some(RevisionHistory {
        since_baseline,
        entries,
    }))
}
