//! Test fixtures: canned merge requests and temporary project directories.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::MockDiffSource;
use crate::source::Commit;

/// A well-formed MR touching one correctly placed controller.
#[must_use]
pub fn clean_merge_request() -> MockDiffSource {
    MockDiffSource::new()
        .with_title("feat(home): add home module")
        .with_description("## Description\nAdds the home module.  ")
        .with_source_branch("feature/home")
        .with_commit(Commit::new("a1b2c3d", "feat: add home"))
        .with_file(
            "lib/modules/home/controller/home_controller.dart",
            "class HomeController {\n  void load() {}\n}\n",
        )
}

/// The clean MR plus a committed `.env` file.
#[must_use]
pub fn env_leak_merge_request() -> MockDiffSource {
    clean_merge_request().with_file(".env", "API_URL=https://api.example.com\n")
}

/// A temporary project directory.
///
/// Automatically cleans up when dropped.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Create an empty project.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project with a `.gitlab-ci.yml`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn with_gitlab_ci(content: &str) -> Self {
        let project = Self::new();
        project.write(".gitlab-ci.yml", content);
        project
    }

    /// Project root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a project file.
    #[must_use]
    pub fn file(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Write a project file, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write project file");
    }

    /// Read a project file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.file(relative)).expect("Failed to read project file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
