//! Project identification and metadata.
//!
//! A project is a directory of artifact files plus the persisted state
//! this engine keeps about it (baselines, snapshots, collections). The
//! record is stored under `["project", id]` and looked up by root path
//! when a session reopens the same directory.

use crate::error::CoreResult;
use reqforge_storage::json::JsonStorage;
use reqforge_storage::Storage;
use reqforge_util::{now_ms, Identifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Project root directory (artifact files live beneath it).
    pub root: PathBuf,

    /// Timestamps.
    pub time: ProjectTime,
}

/// Project timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTime {
    /// When the project was first opened.
    pub created: i64,

    /// When the project was last opened.
    pub updated: i64,
}

impl Project {
    /// Create a new project record.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let now = now_ms();
        Self {
            id: Identifier::project(),
            name: name.into(),
            root: root.into(),
            time: ProjectTime {
                created: now,
                updated: now,
            },
        }
    }

    /// Load a project from storage by ID.
    pub async fn load(storage: &JsonStorage, id: &str) -> CoreResult<Option<Self>> {
        Ok(storage.read(&["project", id]).await?)
    }

    /// Find the project whose root matches the given path.
    pub async fn find_by_root(storage: &JsonStorage, root: &Path) -> CoreResult<Option<Self>> {
        let keys = storage.list(&["project"]).await?;
        for key in keys {
            let key_refs: Vec<&str> = key.iter().map(|s| s.as_str()).collect();
            if let Some(project) = storage.read::<Project>(&key_refs).await? {
                if project.root == root {
                    return Ok(Some(project));
                }
            }
        }
        Ok(None)
    }

    /// Save the project to storage.
    pub async fn save(&self, storage: &JsonStorage) -> CoreResult<()> {
        storage.write(&["project", &self.id], self).await?;
        Ok(())
    }

    /// Update the last opened time.
    pub fn touch(&mut self) {
        self.time.updated = now_ms();
    }
}
