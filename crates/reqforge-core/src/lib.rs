//! Baseline and revision-history engine for reqforge.
//!
//! This crate reconciles the raw commit history of individual artifact
//! files with artifact-level semantics:
//! - Named, immutable baselines pinning every artifact to its commit at
//!   creation time
//! - "Revisions since a baseline" windows for history views and exports
//! - Revision labels parsed out of artifact content at historical commits
//! - A bounded, debounced undo log of whole-state version snapshots
//!
//! State is scoped to an explicit [`ProjectSession`] with an init/teardown
//! lifecycle; there are no ambient globals.

pub mod artifact;
pub mod baseline;
pub mod bus;
pub mod debounce;
pub mod error;
pub mod label;
pub mod project;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod window;

pub use artifact::{ArtifactCollections, ArtifactKind, ArtifactRecord, TrackedArtifact};
pub use baseline::{BaselineManager, BaselinedCommit, ProjectBaseline};
pub use bus::{
    ArtifactMutated, BaselineCreated, Bus, Event, SessionDisposed, SnapshotRecorded,
    SnapshotRestored,
};
pub use debounce::DebounceSlot;
pub use error::{CoreError, CoreResult};
pub use label::{RevisionLabelResolver, REVISION_PLACEHOLDER};
pub use project::Project;
pub use report::{revision_history, RevisionEntry, RevisionHistory};
pub use session::ProjectSession;
pub use snapshot::{SnapshotKind, VersionSnapshot, VersionSnapshotManager, SNAPSHOT_LIMIT};
pub use window::RevisionWindowResolver;
