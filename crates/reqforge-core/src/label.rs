//! Revision label resolution.
//!
//! Artifact files are markdown with a YAML front matter block; the
//! human-facing revision label (e.g. "02") lives in that block. This
//! module reads artifact content at a specific commit and extracts the
//! label, one parser per artifact kind.
//!
//! Resolution never fails: a missing file, corrupt front matter or absent
//! field yields the `—` placeholder for that row only, so one bad commit
//! cannot blank an entire history table.

use crate::artifact::ArtifactKind;
use reqforge_vcs::ArtifactStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Label shown when a revision cannot be resolved.
pub const REVISION_PLACEHOLDER: &str = "—";

/// Resolves revision labels from artifact content at historical commits.
#[derive(Clone)]
pub struct RevisionLabelResolver {
    store: Arc<dyn ArtifactStore>,
}

impl RevisionLabelResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// The revision label of the artifact at `path` as of `commit_hash`.
    ///
    /// Returns [`REVISION_PLACEHOLDER`] when the content is missing or the
    /// label cannot be parsed; every row resolves independently.
    pub async fn label_at_commit(
        &self,
        kind: ArtifactKind,
        path: &Path,
        commit_hash: &str,
    ) -> String {
        let content = match self.store.read_file_at_commit(path, commit_hash).await {
            Ok(Some(content)) => content,
            Ok(None) => return REVISION_PLACEHOLDER.to_string(),
            Err(e) => {
                debug!(
                    path = %path.display(),
                    commit = commit_hash,
                    error = %e,
                    "Content read failed; revision unresolved"
                );
                return REVISION_PLACEHOLDER.to_string();
            }
        };

        let revision = match kind {
            ArtifactKind::Requirement => requirement_revision(&content),
            ArtifactKind::UseCase => use_case_revision(&content),
            ArtifactKind::TestCase => test_case_revision(&content),
            ArtifactKind::Information => information_revision(&content),
            ArtifactKind::Risk => risk_revision(&content),
        };

        revision.unwrap_or_else(|| REVISION_PLACEHOLDER.to_string())
    }
}

/// The YAML block between the opening and closing `---` fences.
fn front_matter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

/// Normalize a raw front-matter revision value into a display label.
///
/// Authors write both `revision: "02"` and `revision: 2`; numeric values
/// render zero-padded to two digits to match the string convention.
fn normalize_revision(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_yaml::Value::Number(n) => n.as_u64().map(|n| format!("{n:02}")),
        _ => None,
    }
}

macro_rules! revision_parser {
    ($(#[$doc:meta])* $name:ident, $front:ident) => {
        #[derive(serde::Deserialize)]
        struct $front {
            #[serde(default)]
            revision: Option<serde_yaml::Value>,
        }

        $(#[$doc])*
        fn $name(content: &str) -> Option<String> {
            let yaml = front_matter(content)?;
            let front: $front = serde_yaml::from_str(yaml).ok()?;
            normalize_revision(front.revision?)
        }
    };
}

revision_parser!(
    /// Requirement front matter: id/title/status/priority plus revision.
    requirement_revision,
    RequirementFront
);
revision_parser!(
    /// Use case front matter: id/title/actor plus revision.
    use_case_revision,
    UseCaseFront
);
revision_parser!(
    /// Test case front matter: id/title/verifies plus revision.
    test_case_revision,
    TestCaseFront
);
revision_parser!(
    /// Information note front matter: id/title/category plus revision.
    information_revision,
    InformationFront
);
revision_parser!(
    /// Risk front matter: id/title/severity/mitigation plus revision.
    risk_revision,
    RiskFront
);

#[cfg(test)]
mod tests {
    use super::*;
    use reqforge_vcs::MemoryArtifactStore;

    fn requirement_doc(revision: &str) -> String {
        format!(
            "---\nid: REQ-001\ntitle: User login\nstatus: approved\npriority: high\nrevision: \"{revision}\"\n---\n\nThe system shall allow users to log in.\n"
        )
    }

    #[test]
    fn front_matter_extracts_yaml_block() {
        let doc = "---\nid: REQ-001\n---\nbody";
        assert_eq!(front_matter(doc), Some("id: REQ-001"));
    }

    #[test]
    fn front_matter_requires_fences() {
        assert!(front_matter("no fences at all").is_none());
        assert!(front_matter("---\nunclosed: yes\n").is_none());
    }

    #[test]
    fn string_revisions_pass_through() {
        let doc = requirement_doc("02");
        assert_eq!(requirement_revision(&doc), Some("02".to_string()));
    }

    #[test]
    fn numeric_revisions_are_zero_padded() {
        let doc = "---\nid: TC-001\nrevision: 3\n---\nsteps";
        assert_eq!(test_case_revision(doc), Some("03".to_string()));
    }

    #[test]
    fn absent_revision_is_none() {
        let doc = "---\nid: INFO-001\ntitle: Glossary\n---\nbody";
        assert_eq!(information_revision(doc), None);
    }

    #[test]
    fn corrupt_front_matter_is_none() {
        let doc = "---\n: [unbalanced\n---\nbody";
        assert_eq!(risk_revision(doc), None);
    }

    #[test]
    fn blank_revision_is_none() {
        let doc = "---\nrevision: \"   \"\n---\n";
        assert_eq!(use_case_revision(doc), None);
    }

    #[tokio::test]
    async fn resolves_label_from_store_content() {
        let store = Arc::new(MemoryArtifactStore::new());
        let path = ArtifactKind::Requirement.file_path("REQ-001");
        let commit = store.seed_commit(&path, "created", "a", 100, &requirement_doc("01"));

        let resolver = RevisionLabelResolver::new(store);
        let label = resolver
            .label_at_commit(ArtifactKind::Requirement, &path, &commit.hash)
            .await;
        assert_eq!(label, "01");
    }

    #[tokio::test]
    async fn missing_content_yields_placeholder() {
        let store = Arc::new(MemoryArtifactStore::new());
        let path = ArtifactKind::Requirement.file_path("REQ-001");

        let resolver = RevisionLabelResolver::new(store);
        let label = resolver
            .label_at_commit(ArtifactKind::Requirement, &path, "no-such-commit")
            .await;
        assert_eq!(label, REVISION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn store_errors_yield_placeholder_not_failure() {
        let store = Arc::new(MemoryArtifactStore::unavailable());
        let path = ArtifactKind::Risk.file_path("RISK-001");

        let resolver = RevisionLabelResolver::new(store);
        let label = resolver
            .label_at_commit(ArtifactKind::Risk, &path, "mem0000000000000001")
            .await;
        assert_eq!(label, REVISION_PLACEHOLDER);
    }

    #[tokio::test]
    async fn corrupt_commit_resolves_independently_of_good_ones() {
        let store = Arc::new(MemoryArtifactStore::new());
        let path = ArtifactKind::UseCase.file_path("UC-001");
        let good = store.seed_commit(
            &path,
            "created",
            "a",
            100,
            "---\nid: UC-001\nactor: Operator\nrevision: \"01\"\n---\n",
        );
        let bad = store.seed_commit(&path, "mangled", "a", 200, "not front matter at all");

        let resolver = RevisionLabelResolver::new(store);
        assert_eq!(
            resolver
                .label_at_commit(ArtifactKind::UseCase, &path, &good.hash)
                .await,
            "01"
        );
        assert_eq!(
            resolver
                .label_at_commit(ArtifactKind::UseCase, &path, &bad.hash)
                .await,
            REVISION_PLACEHOLDER
        );
    }
}
