//! Artifact kinds, tracked artifacts and the live collections.
//!
//! Business fields of artifacts (title, status, priority, ...) are opaque
//! to this engine; only the record `id` is interpreted, to derive file
//! paths and enumerate what a baseline must pin.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The five artifact kinds managed by a project.
///
/// The enum is exhaustive on purpose: adding a kind forces every dispatch
/// site (label parsing, folder layout) through the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    Requirement,
    UseCase,
    TestCase,
    Information,
    Risk,
}

impl ArtifactKind {
    /// All kinds, in canonical display order.
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Requirement,
        ArtifactKind::UseCase,
        ArtifactKind::TestCase,
        ArtifactKind::Information,
        ArtifactKind::Risk,
    ];

    /// Canonical name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Requirement => "requirement",
            ArtifactKind::UseCase => "useCase",
            ArtifactKind::TestCase => "testCase",
            ArtifactKind::Information => "information",
            ArtifactKind::Risk => "risk",
        }
    }

    /// Project subdirectory holding this kind's artifact files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Requirement => "requirements",
            ArtifactKind::UseCase => "usecases",
            ArtifactKind::TestCase => "testcases",
            ArtifactKind::Information => "information",
            ArtifactKind::Risk => "risks",
        }
    }

    /// Parse a kind from user input. Accepts the canonical camelCase name
    /// plus common lowercase/hyphenated spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requirement" | "req" => Some(ArtifactKind::Requirement),
            "useCase" | "usecase" | "use-case" => Some(ArtifactKind::UseCase),
            "testCase" | "testcase" | "test-case" => Some(ArtifactKind::TestCase),
            "information" | "info" => Some(ArtifactKind::Information),
            "risk" => Some(ArtifactKind::Risk),
            _ => None,
        }
    }

    /// Path of an artifact file relative to the project root.
    pub fn file_path(&self, artifact_id: &str) -> PathBuf {
        PathBuf::from(self.dir_name()).join(format!("{artifact_id}.md"))
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An artifact currently belonging to the project, with its derived path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedArtifact {
    pub id: String,
    pub kind: ArtifactKind,
    pub file_path: PathBuf,
}

impl TrackedArtifact {
    /// Create a tracked artifact, deriving the path from kind and id.
    pub fn new(kind: ArtifactKind, id: impl Into<String>) -> Self {
        let id = id.into();
        let file_path = kind.file_path(&id);
        Self {
            id,
            kind,
            file_path,
        }
    }
}

/// One artifact record in the live collections.
///
/// Everything but the id is carried opaquely so the engine never has to
/// know the business schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ArtifactRecord {
    /// Create a record with no business fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }
}

/// The live, whole-project artifact state.
///
/// `Clone` is a deep copy; version snapshots rely on that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCollections {
    #[serde(default)]
    pub requirements: Vec<ArtifactRecord>,
    #[serde(default)]
    pub use_cases: Vec<ArtifactRecord>,
    #[serde(default)]
    pub test_cases: Vec<ArtifactRecord>,
    #[serde(default)]
    pub information: Vec<ArtifactRecord>,
    #[serde(default)]
    pub risks: Vec<ArtifactRecord>,
    /// Traceability links between artifacts; opaque to this engine.
    #[serde(default)]
    pub links: Vec<serde_json::Value>,
}

impl ArtifactCollections {
    /// Records of one kind.
    pub fn by_kind(&self, kind: ArtifactKind) -> &[ArtifactRecord] {
        match kind {
            ArtifactKind::Requirement => &self.requirements,
            ArtifactKind::UseCase => &self.use_cases,
            ArtifactKind::TestCase => &self.test_cases,
            ArtifactKind::Information => &self.information,
            ArtifactKind::Risk => &self.risks,
        }
    }

    /// Mutable records of one kind.
    pub fn by_kind_mut(&mut self, kind: ArtifactKind) -> &mut Vec<ArtifactRecord> {
        match kind {
            ArtifactKind::Requirement => &mut self.requirements,
            ArtifactKind::UseCase => &mut self.use_cases,
            ArtifactKind::TestCase => &mut self.test_cases,
            ArtifactKind::Information => &mut self.information,
            ArtifactKind::Risk => &mut self.risks,
        }
    }

    /// Enumerate every artifact currently in the project, in canonical
    /// kind order. This is the set a new baseline pins.
    pub fn tracked(&self) -> Vec<TrackedArtifact> {
        let mut artifacts = Vec::new();
        for kind in ArtifactKind::ALL {
            for record in self.by_kind(kind) {
                artifacts.push(TrackedArtifact::new(kind, &record.id));
            }
        }
        artifacts
    }

    /// Total number of artifact records (links excluded).
    pub fn artifact_count(&self) -> usize {
        ArtifactKind::ALL
            .iter()
            .map(|kind| self.by_kind(*kind).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_camel_case() {
        assert_eq!(
            serde_json::to_string(&ArtifactKind::UseCase).unwrap(),
            r#""useCase""#
        );
        assert_eq!(
            serde_json::to_string(&ArtifactKind::Risk).unwrap(),
            r#""risk""#
        );
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(ArtifactKind::parse("requirement"), Some(ArtifactKind::Requirement));
        assert_eq!(ArtifactKind::parse("usecase"), Some(ArtifactKind::UseCase));
        assert_eq!(ArtifactKind::parse("test-case"), Some(ArtifactKind::TestCase));
        assert_eq!(ArtifactKind::parse("info"), Some(ArtifactKind::Information));
        assert_eq!(ArtifactKind::parse("widget"), None);
    }

    #[test]
    fn file_paths_derive_from_kind_and_id() {
        assert_eq!(
            ArtifactKind::Requirement.file_path("REQ-001"),
            PathBuf::from("requirements/REQ-001.md")
        );
        assert_eq!(
            ArtifactKind::Risk.file_path("RISK-007"),
            PathBuf::from("risks/RISK-007.md")
        );
    }

    #[test]
    fn tracked_enumerates_all_kinds() {
        let mut collections = ArtifactCollections::default();
        collections.requirements.push(ArtifactRecord::new("REQ-001"));
        collections.requirements.push(ArtifactRecord::new("REQ-002"));
        collections.risks.push(ArtifactRecord::new("RISK-001"));

        let tracked = collections.tracked();
        assert_eq!(tracked.len(), 3);
        assert_eq!(tracked[0].id, "REQ-001");
        assert_eq!(tracked[2].kind, ArtifactKind::Risk);
        assert_eq!(
            tracked[2].file_path,
            PathBuf::from("risks/RISK-001.md")
        );
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let mut original = ArtifactCollections::default();
        original.requirements.push(ArtifactRecord::new("REQ-001"));

        let mut copied = original.clone();
        copied.requirements[0].id = "REQ-999".to_string();
        copied.use_cases.push(ArtifactRecord::new("UC-001"));

        assert_eq!(original.requirements[0].id, "REQ-001");
        assert!(original.use_cases.is_empty());
    }

    #[test]
    fn records_round_trip_opaque_fields() {
        let json = r#"{"id":"REQ-001","title":"Login","status":"approved"}"#;
        let record: ArtifactRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "REQ-001");
        assert_eq!(record.fields["title"], "Login");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["status"], "approved");
    }

    #[test]
    fn artifact_count_ignores_links() {
        let mut collections = ArtifactCollections::default();
        collections.information.push(ArtifactRecord::new("INFO-001"));
        collections.links.push(serde_json::json!({"from": "REQ-001", "to": "TC-001"}));
        assert_eq!(collections.artifact_count(), 1);
    }
}
