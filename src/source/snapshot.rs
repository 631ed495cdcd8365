//! Offline merge request snapshots.
//!
//! A snapshot is a JSON document holding everything a run needs, so the
//! same rule engine can be pointed at a local file instead of GitLab:
//!
//! ```json
//! {
//!   "merge_request": { "title": "feat(home): add home", "description": "...", "source_branch": "feature/home" },
//!   "commits": [ { "short_id": "a1b2c3d", "title": "feat: add home", "message": "feat: add home" } ],
//!   "changes": [ { "path": "lib/modules/home/controller/home_controller.dart" } ],
//!   "files": { "lib/modules/home/controller/home_controller.dart": "class HomeController {}" }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::{Commit, DiffSource, FileChange, MergeRequest};
use crate::error::{GateError, Result};

/// Serialized form of a merge request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub merge_request: MergeRequest,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub changes: Vec<FileChange>,
    /// Post-change content by path. Content is ref-independent in a snapshot.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

/// [`DiffSource`] backed by a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    /// Wrap an in-memory snapshot.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Snapshot`] when the file is unreadable or is not
    /// a valid snapshot document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GateError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| GateError::Snapshot {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            "loaded snapshot {} ({} commits, {} changes)",
            path.display(),
            snapshot.commits.len(),
            snapshot.changes.len()
        );
        Ok(Self::new(snapshot))
    }

    /// The wrapped snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[async_trait]
impl DiffSource for SnapshotSource {
    async fn fetch_metadata(&self) -> Result<MergeRequest> {
        Ok(self.snapshot.merge_request.clone())
    }

    async fn fetch_commits(&self) -> Result<Vec<Commit>> {
        Ok(self.snapshot.commits.clone())
    }

    async fn fetch_changed_files(&self) -> Result<Vec<FileChange>> {
        Ok(self.snapshot.changes.clone())
    }

    async fn fetch_file_content(&self, path: &str, _git_ref: &str) -> String {
        self.snapshot.files.get(path).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = r#"{
        "merge_request": { "title": "feat(home): add home", "source_branch": "feature/home" },
        "commits": [ { "short_id": "a1b2c3d", "title": "feat: add home" } ],
        "changes": [ { "path": "lib/home.dart" }, { "path": "lib/old.dart", "deleted": true } ],
        "files": { "lib/home.dart": "class Home {}" }
    }"#;

    #[tokio::test]
    async fn test_load_and_serve_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mr.json");
        std::fs::write(&path, DOC).unwrap();

        let source = SnapshotSource::load(&path).unwrap();
        let mr = source.fetch_metadata().await.unwrap();
        assert_eq!(mr.title, "feat(home): add home");
        assert_eq!(mr.description, "");

        let changes = source.fetch_changed_files().await.unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes[1].deleted);

        assert_eq!(
            source.fetch_file_content("lib/home.dart", "any").await,
            "class Home {}"
        );
    }

    #[tokio::test]
    async fn test_unknown_path_yields_empty_content() {
        let source = SnapshotSource::new(Snapshot::default());
        assert_eq!(source.fetch_file_content("missing.dart", "main").await, "");
    }

    #[test]
    fn test_invalid_snapshot_is_reported_with_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        match SnapshotSource::load(&path) {
            Err(GateError::Snapshot { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected snapshot error, got {:?}", other.map(|_| ())),
        }
    }
}
