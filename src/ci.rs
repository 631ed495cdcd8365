//! `.gitlab-ci.yml` patching for `mrgate ci init`.
//!
//! The pipeline file is edited as text so comments, anchors and key order
//! survive. Only two places are touched: the `mr_quality_check` job block
//! and, when present, the top-level `stages:` list.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::GateConfig;
use crate::error::{GateError, Result};

/// Pipeline file name in the project root.
pub const CI_FILE: &str = ".gitlab-ci.yml";

/// Job key added to the pipeline.
pub const JOB_KEY: &str = "mr_quality_check";

const JOB_STAGE: &str = "test";

const JOB_BLOCK: &str = r#"mr_quality_check:
  stage: test
  rules:
    - if: $CI_PIPELINE_SOURCE == "merge_request_event"
  script:
    - mrgate check
"#;

/// What happened to the pipeline file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiOutcome {
    /// The file did not exist and was written with only the job.
    Created,
    /// The job was appended to an existing file.
    Appended,
    /// An existing job block was overwritten (`--force`).
    Replaced,
    /// The job already existed.
    Unchanged,
}

impl std::fmt::Display for CiOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Appended => write!(f, "appended job"),
            Self::Replaced => write!(f, "replaced job"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Result of `ci init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiInitReport {
    pub pipeline: CiOutcome,
    /// A starter `mrgate.toml` was written.
    pub config_created: bool,
}

/// Installs the quality-check job into a project.
#[derive(Debug, Clone)]
pub struct CiPatcher {
    project_dir: PathBuf,
}

impl CiPatcher {
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    #[must_use]
    pub fn ci_path(&self) -> PathBuf {
        self.project_dir.join(CI_FILE)
    }

    /// Patch the pipeline file and write a starter config if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::CiPatch`] if a file cannot be read or written.
    pub fn init(&self, force: bool) -> Result<CiInitReport> {
        let pipeline = self.patch_pipeline(force)?;

        let config_path = GateConfig::project_path(&self.project_dir);
        let config_created = if config_path.exists() {
            false
        } else {
            write_file(&config_path, GateConfig::starter_toml())?;
            info!("wrote {}", config_path.display());
            true
        };

        Ok(CiInitReport {
            pipeline,
            config_created,
        })
    }

    fn patch_pipeline(&self, force: bool) -> Result<CiOutcome> {
        let path = self.ci_path();
        if !path.exists() {
            let content = format!("stages:\n  - {}\n\n{}", JOB_STAGE, JOB_BLOCK);
            write_file(&path, &content)?;
            info!("created {}", path.display());
            return Ok(CiOutcome::Created);
        }

        let existing = fs::read_to_string(&path)
            .map_err(|e| ci_error(format!("cannot read {}: {}", path.display(), e)))?;
        let (patched, outcome) = patch(&existing, force);
        if outcome != CiOutcome::Unchanged {
            write_file(&path, &patched)?;
            info!("{}: {}", path.display(), outcome);
        }
        Ok(outcome)
    }
}

/// Apply the job and stage edits to pipeline text.
#[must_use]
pub fn patch(content: &str, force: bool) -> (String, CiOutcome) {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let outcome = match find_job(&lines) {
        Some(_) if !force => return (content.to_string(), CiOutcome::Unchanged),
        Some((start, end)) => {
            let block: Vec<String> = JOB_BLOCK.lines().map(str::to_string).collect();
            lines.splice(start..end, block);
            CiOutcome::Replaced
        }
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.extend(JOB_BLOCK.lines().map(str::to_string));
            CiOutcome::Appended
        }
    };

    ensure_stage(&mut lines);

    let mut patched = lines.join("\n");
    patched.push('\n');
    (patched, outcome)
}

fn is_top_level(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| !c.is_whitespace() && c != '#')
}

/// Line range of the job block, excluding trailing blank lines.
fn find_job(lines: &[String]) -> Option<(usize, usize)> {
    let key = format!("{}:", JOB_KEY);
    let start = lines.iter().position(|l| l.trim_end() == key)?;
    let mut end = lines[start + 1..]
        .iter()
        .position(|l| is_top_level(l))
        .map_or(lines.len(), |offset| start + 1 + offset);
    while end > start + 1 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    Some((start, end))
}

fn unquote(item: &str) -> &str {
    item.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Add the job's stage to a top-level `stages:` list if it is missing.
fn ensure_stage(lines: &mut Vec<String>) {
    let Some(index) = lines.iter().position(|l| l.starts_with("stages:")) else {
        return;
    };

    let inline = lines[index]["stages:".len()..].trim().to_string();
    if let Some(items) = inline.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let mut stages: Vec<String> = items
            .split(',')
            .map(unquote)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !stages.iter().any(|s| s == JOB_STAGE) {
            stages.push(JOB_STAGE.to_string());
            lines[index] = format!("stages: [{}]", stages.join(", "));
        }
        return;
    }

    let mut last_item = index;
    let mut indent = "  ".to_string();
    for (i, line) in lines.iter().enumerate().skip(index + 1) {
        let trimmed = line.trim_start();
        if let Some(item) = trimmed.strip_prefix("- ") {
            if unquote(item) == JOB_STAGE {
                return;
            }
            indent = line[..line.len() - trimmed.len()].to_string();
            last_item = i;
        } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
    }
    lines.insert(last_item + 1, format!("{}- {}", indent, JOB_STAGE));
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| ci_error(format!("cannot write {}: {}", path.display(), e)))
}

fn ci_error(message: String) -> GateError {
    GateError::CiPatch { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestProject;

    #[test]
    fn test_creates_missing_pipeline_and_config() {
        let project = TestProject::new();
        let report = CiPatcher::new(project.path()).init(false).unwrap();

        assert_eq!(report.pipeline, CiOutcome::Created);
        assert!(report.config_created);
        let ci = project.read(CI_FILE);
        assert!(ci.starts_with("stages:\n  - test\n"));
        assert!(ci.contains("    - mrgate check\n"));
        assert_eq!(project.read("mrgate.toml"), GateConfig::starter_toml());
    }

    #[test]
    fn test_appends_job_and_stage() {
        let project = TestProject::with_gitlab_ci(
            "stages:\n  - build\n  - deploy\n\nbuild:\n  stage: build\n  script:\n    - flutter build apk\n",
        );
        let report = CiPatcher::new(project.path()).init(false).unwrap();

        assert_eq!(report.pipeline, CiOutcome::Appended);
        let ci = project.read(CI_FILE);
        assert!(ci.starts_with("stages:\n  - build\n  - deploy\n  - test\n"));
        assert!(ci.contains("    - flutter build apk\n\nmr_quality_check:\n  stage: test\n"));
    }

    #[test]
    fn test_second_init_is_unchanged() {
        let project = TestProject::with_gitlab_ci("build:\n  script:\n    - make\n");
        let patcher = CiPatcher::new(project.path());
        patcher.init(false).unwrap();
        let first = project.read(CI_FILE);

        let report = patcher.init(false).unwrap();
        assert_eq!(report.pipeline, CiOutcome::Unchanged);
        assert!(!report.config_created);
        assert_eq!(project.read(CI_FILE), first);
    }

    #[test]
    fn test_existing_config_is_kept() {
        let project = TestProject::new();
        project.write("mrgate.toml", "project_label = \"Mine\"\n");
        let report = CiPatcher::new(project.path()).init(false).unwrap();
        assert!(!report.config_created);
        assert_eq!(project.read("mrgate.toml"), "project_label = \"Mine\"\n");
    }

    #[test]
    fn test_force_replaces_only_the_job_block() {
        let original = "mr_quality_check:\n  stage: lint\n  script:\n    - ./old.sh\n\ndeploy:\n  script:\n    - ./deploy.sh\n";
        let (patched, outcome) = patch(original, true);

        assert_eq!(outcome, CiOutcome::Replaced);
        assert!(patched.starts_with(JOB_BLOCK));
        assert!(!patched.contains("old.sh"));
        assert!(patched.ends_with("\ndeploy:\n  script:\n    - ./deploy.sh\n"));
    }

    #[test]
    fn test_force_is_stable() {
        let (once, _) = patch("build:\n  script:\n    - make\n", false);
        let (twice, outcome) = patch(&once, true);
        assert_eq!(outcome, CiOutcome::Replaced);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_inline_stages_list() {
        let (patched, _) = patch("stages: [build, \"deploy\"]\n", false);
        assert!(patched.starts_with("stages: [build, deploy, test]\n"));

        let (patched, _) = patch("stages: [test]\n", false);
        assert!(patched.starts_with("stages: [test]\n"));
    }

    #[test]
    fn test_existing_test_stage_not_duplicated() {
        let (patched, _) = patch("stages:\n  - test\n  - deploy\n", false);
        assert_eq!(patched.matches("- test").count(), 1);
    }

    #[test]
    fn test_no_stages_key_leaves_stages_alone() {
        let (patched, _) = patch("build:\n  script:\n    - make\n", false);
        assert!(!patched.contains("stages"));
    }
}
