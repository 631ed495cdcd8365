//! Mock diff sources and report sinks.
//!
//! These mocks provide controllable test doubles for GitLab, enabling
//! deterministic tests of the engine and the run orchestration.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{GateError, Result};
use crate::report::ReportSink;
use crate::source::{Commit, DiffSource, FileChange, MergeRequest};

/// In-memory [`DiffSource`] with failure injection.
///
/// # Example
///
/// ```rust,ignore
/// let source = MockDiffSource::new()
///     .with_title("feat(home): add home")
///     .with_commit(Commit::new("a1b2c3d", "feat: add home"))
///     .with_file("lib/home_page.dart", "Text('Hi')");
///
/// assert_eq!(source.fetch_file_content("lib/home_page.dart", "main").await, "Text('Hi')");
/// assert_eq!(source.content_fetch_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDiffSource {
    merge_request: MergeRequest,
    commits: Vec<Commit>,
    changes: Vec<FileChange>,
    files: HashMap<String, String>,
    failing_files: HashSet<String>,
    fail_metadata: bool,
    fail_commits: bool,
    fail_changes: bool,
    content_delay: Option<Duration>,
    content_fetches: AtomicUsize,
    fetched_refs: Mutex<Vec<String>>,
}

impl MockDiffSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.merge_request.title = title.to_string();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.merge_request.description = description.to_string();
        self
    }

    #[must_use]
    pub fn with_source_branch(mut self, branch: &str) -> Self {
        self.merge_request.source_branch = branch.to_string();
        self
    }

    #[must_use]
    pub fn with_commit(mut self, commit: Commit) -> Self {
        self.commits.push(commit);
        self
    }

    /// Add a change without content.
    #[must_use]
    pub fn with_change(mut self, change: FileChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Add a changed file together with its content.
    #[must_use]
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        if !self.changes.iter().any(|c| c.path == path) {
            self.changes.push(FileChange::new(path));
        }
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Make content fetches of `path` fail (yielding empty content).
    #[must_use]
    pub fn failing_file(mut self, path: &str) -> Self {
        self.failing_files.insert(path.to_string());
        self
    }

    #[must_use]
    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    #[must_use]
    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    #[must_use]
    pub fn failing_changes(mut self) -> Self {
        self.fail_changes = true;
        self
    }

    /// Delay every content fetch.
    #[must_use]
    pub fn with_content_delay(mut self, delay: Duration) -> Self {
        self.content_delay = Some(delay);
        self
    }

    /// Number of content fetches received.
    pub fn content_fetch_count(&self) -> usize {
        self.content_fetches.load(Ordering::SeqCst)
    }

    /// Refs of every content fetch, in order.
    pub fn fetched_refs(&self) -> Vec<String> {
        self.fetched_refs
            .lock()
            .map(|refs| refs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DiffSource for MockDiffSource {
    async fn fetch_metadata(&self) -> Result<MergeRequest> {
        if self.fail_metadata {
            return Err(GateError::fatal_fetch(
                "merge request metadata",
                "connection refused",
            ));
        }
        Ok(self.merge_request.clone())
    }

    async fn fetch_commits(&self) -> Result<Vec<Commit>> {
        if self.fail_commits {
            return Err(GateError::fatal_fetch("commits", "GitLab returned 500"));
        }
        Ok(self.commits.clone())
    }

    async fn fetch_changed_files(&self) -> Result<Vec<FileChange>> {
        if self.fail_changes {
            return Err(GateError::fatal_fetch("changed files", "timed out"));
        }
        Ok(self.changes.clone())
    }

    async fn fetch_file_content(&self, path: &str, git_ref: &str) -> String {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut refs) = self.fetched_refs.lock() {
            refs.push(git_ref.to_string());
        }
        if let Some(delay) = self.content_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_files.contains(path) {
            return String::new();
        }
        self.files.get(path).cloned().unwrap_or_default()
    }
}

/// [`ReportSink`] that records every posted body.
#[derive(Debug, Default)]
pub struct RecordingSink {
    posts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every post fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Bodies posted so far.
    pub fn posts(&self) -> Vec<String> {
        self.posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn post_report(&self, body: &str) -> Result<()> {
        if self.fail {
            return Err(GateError::sink_post("GitLab returned 403 Forbidden"));
        }
        if let Ok(mut posts) = self.posts.lock() {
            posts.push(body.to_string());
        }
        Ok(())
    }
}
