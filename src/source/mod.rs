//! Diff sources: where merge request data comes from.
//!
//! - [`gitlab`] - GitLab REST v4 client (the production source and sink)
//! - [`snapshot`] - Offline JSON snapshot of a merge request
//!
//! Every source implements [`DiffSource`]. Metadata, commit and change-list
//! fetches are fallible and abort the run; content fetches never fail and
//! return an empty string instead, so one unreadable file only lowers the
//! scan count.

pub mod gitlab;
pub mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::Result;

pub use gitlab::{GitLabClient, GitLabSettings};
pub use snapshot::{Snapshot, SnapshotSource};

// ============================================================================
// Merge Request Data Model
// ============================================================================

/// Merge request metadata, fetched once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// MR title.
    pub title: String,
    /// MR description; an absent description is an empty string.
    #[serde(default)]
    pub description: String,
    /// Branch the MR merges from. Used as the ref for content fetches.
    #[serde(default)]
    pub source_branch: String,
}

/// A single commit of the merge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Abbreviated commit hash.
    pub short_id: String,
    /// First line of the commit message.
    pub title: String,
    /// Full commit message.
    #[serde(default)]
    pub message: String,
}

impl Commit {
    /// Create a commit whose message equals its title.
    pub fn new(short_id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            short_id: short_id.into(),
            message: title.clone(),
            title,
        }
    }
}

/// One file touched by the merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Post-change path (`new_path`).
    pub path: String,
    /// Whether the change removes the file.
    #[serde(default)]
    pub deleted: bool,
}

impl FileChange {
    /// A file added or modified by the MR.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deleted: false,
        }
    }

    /// A file removed by the MR.
    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deleted: true,
        }
    }
}

// ============================================================================
// Diff Source Trait
// ============================================================================

/// Supplier of merge request metadata, commits, changes and file content.
///
/// # Example
///
/// ```rust,ignore
/// use mrgate::source::{DiffSource, SnapshotSource};
///
/// let source = SnapshotSource::load("mr.json")?;
/// let mr = source.fetch_metadata().await?;
/// let content = source.fetch_file_content("lib/main.dart", &mr.source_branch).await;
/// ```
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Fetch the MR title, description and source branch.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::FatalFetch`](crate::GateError::FatalFetch) when
    /// the metadata cannot be retrieved.
    async fn fetch_metadata(&self) -> Result<MergeRequest>;

    /// Fetch every commit of the MR.
    ///
    /// # Errors
    ///
    /// Returns a fatal fetch error when the commit list cannot be retrieved.
    async fn fetch_commits(&self) -> Result<Vec<Commit>>;

    /// Fetch the list of changed files.
    ///
    /// # Errors
    ///
    /// Returns a fatal fetch error when the change list cannot be retrieved.
    async fn fetch_changed_files(&self) -> Result<Vec<FileChange>>;

    /// Fetch the post-change content of `path` at `git_ref`.
    ///
    /// Returns an empty string when the file cannot be retrieved.
    async fn fetch_file_content(&self, path: &str, git_ref: &str) -> String;
}

// ============================================================================
// Content Cache
// ============================================================================

/// Run-scoped cache of file contents keyed by `(path, ref)`.
///
/// Content for a ref is immutable for the duration of a run, so entries are
/// never invalidated. Concurrent misses for the same key may both fetch; the
/// first insert wins and later ones are dropped.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<(String, String), Arc<str>>>,
    fetches: AtomicUsize,
}

impl ContentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached entry without fetching.
    #[must_use]
    pub fn get(&self, path: &str, git_ref: &str) -> Option<Arc<str>> {
        self.lock()
            .get(&(path.to_string(), git_ref.to_string()))
            .cloned()
    }

    /// Return the cached content, fetching it from `source` on a miss.
    pub async fn get_or_fetch(
        &self,
        source: &dyn DiffSource,
        path: &str,
        git_ref: &str,
    ) -> Arc<str> {
        if let Some(hit) = self.get(path, git_ref) {
            debug!("content cache hit: {}@{}", path, git_ref);
            return hit;
        }

        let fetched: Arc<str> = source.fetch_file_content(path, git_ref).await.into();
        self.fetches.fetch_add(1, Ordering::Relaxed);

        self.lock()
            .entry((path.to_string(), git_ref.to_string()))
            .or_insert(fetched)
            .clone()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches issued to the source.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Arc<str>>> {
        // A poisoned map still holds valid immutable entries.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
