//! Configuration management for mrgate.
//!
//! Settings live in TOML. Three layers are merged, later ones winning:
//! the user file (`<config dir>/mrgate/config.toml`), the project file
//! (`mrgate.toml`) and an explicit `--config` file. Connection settings
//! (token, project, MR) come from flags or the GitLab CI environment.
//!
//! ```toml
//! project_label = "Mobile App"
//!
//! [engine]
//! parallel_checks = true
//! run_deadline_secs = 240
//!
//! [checks]
//! disabled = ["todo_tickets"]
//!
//! [report]
//! max_issues_per_check = 8
//!
//! [severity]
//! dimension_conventions = "warning"
//!
//! [limits]
//! secrets = 20
//!
//! [rules]
//! extra_forbidden_files = ["firebase_options.dart"]
//! ```

pub mod resolution;
pub mod validation;

pub use resolution::{ConfigLevel, ConfigLoader, ConfigSource, InheritanceChain};
pub use validation::{ConfigValidator, ValidationReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{EngineConfig, RuleEngine};
use crate::error::{GateError, Result};
use crate::report::{ReportConfig, ReportRenderer};
use crate::rules::{CheckLimits, RuleOverrides, RuleTables, Severity, SeverityPolicy};
use crate::source::GitLabSettings;

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "mrgate.toml";

/// GitLab API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// API root used when `CI_API_V4_URL` is not set.
    pub api_url: String,
    pub read_timeout_secs: u64,
    pub post_timeout_secs: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_url: "https://gitlab.com/api/v4".to_string(),
            read_timeout_secs: 30,
            post_timeout_secs: 60,
        }
    }
}

/// Rule engine execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub parallel_checks: bool,
    /// Wall-clock budget for fetching file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_deadline_secs: Option<u64>,
    /// Show a progress bar when stderr is a terminal.
    pub progress: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            parallel_checks: false,
            run_deadline_secs: None,
            progress: true,
        }
    }
}

/// Which checks run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Check ids removed from the registry.
    pub disabled: Vec<String>,
}

/// MR comment rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Issues listed per check in the details section.
    pub max_issues_per_check: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_issues_per_check: ReportConfig::default().max_issues_per_check,
        }
    }
}

/// Complete mrgate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Label interpolated into report banners.
    pub project_label: String,
    pub gitlab: GitLabConfig,
    pub engine: EngineSettings,
    pub checks: ChecksConfig,
    pub report: ReportSettings,
    /// Per-check severity overrides on top of the defaults.
    pub severity: BTreeMap<String, Severity>,
    pub limits: CheckLimits,
    pub rules: RuleOverrides,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            project_label: "Project".to_string(),
            gitlab: GitLabConfig::default(),
            engine: EngineSettings::default(),
            checks: ChecksConfig::default(),
            report: ReportSettings::default(),
            severity: BTreeMap::new(),
            limits: CheckLimits::default(),
            rules: RuleOverrides::default(),
        }
    }
}

impl GateConfig {
    /// Path of the project config file in `project_dir`.
    #[must_use]
    pub fn project_path(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_CONFIG_FILE)
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a TOML error if the document is malformed or has wrong types.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GateError::config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Severity policy with this config's overrides applied.
    #[must_use]
    pub fn severity_policy(&self) -> SeverityPolicy {
        SeverityPolicy::with_overrides(&self.severity)
    }

    /// Engine execution settings.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new()
            .with_parallel_checks(self.engine.parallel_checks)
            .with_run_deadline(self.engine.run_deadline_secs.map(Duration::from_secs))
            .with_progress(self.engine.progress)
    }

    /// Compile the rule tables with this config's overrides.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidConfig`] naming the bad pattern.
    pub fn rule_tables(&self) -> Result<RuleTables> {
        RuleTables::with_overrides(&self.rules).map_err(|e| GateError::InvalidConfig {
            field: "rules".to_string(),
            reason: format!("{:#}", e),
        })
    }

    /// Build the configured rule engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule override fails to compile.
    pub fn build_engine(&self) -> Result<RuleEngine> {
        let tables = Arc::new(self.rule_tables()?);
        Ok(RuleEngine::from_tables(
            self.engine_config(),
            &tables,
            &self.limits,
            &self.severity_policy(),
            &self.checks.disabled,
        ))
    }

    /// Report renderer for this project.
    #[must_use]
    pub fn report_renderer(&self) -> ReportRenderer {
        ReportRenderer::with_config(ReportConfig {
            project_label: self.project_label.clone(),
            max_issues_per_check: self.report.max_issues_per_check,
        })
    }

    /// Commented starter file written by `mrgate ci init`.
    #[must_use]
    pub fn starter_toml() -> &'static str {
        r#"# mrgate configuration. Every key is optional.

project_label = "Project"

[gitlab]
# api_url = "https://gitlab.example.com/api/v4"
read_timeout_secs = 30
post_timeout_secs = 60

[engine]
parallel_checks = false
# run_deadline_secs = 240

[checks]
disabled = []

[report]
max_issues_per_check = 5

# Override the default severity of any check: critical, warning or info.
[severity]
# todo_tickets = "warning"

[limits]
# hardcoded_strings = 15
# secrets = 10

[rules]
# extra_forbidden_files = ["firebase_options.dart"]
# extra_generated_globs = ["**/*.chopper.dart"]
"#
    }
}

// ============================================================================
// Connection Settings
// ============================================================================

/// GitLab connection values as given on the command line or by CI.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub project_id: Option<String>,
    pub mr_iid: Option<u64>,
}

impl ConnectionArgs {
    /// Resolve into client settings, reporting every missing value at once.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::MissingSettings`] listing each absent value.
    pub fn resolve(&self, config: &GateConfig) -> Result<GitLabSettings> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }

        let mut missing = Vec::new();
        if present(&self.token).is_none() {
            missing.push("GITLAB_TOKEN (--token)".to_string());
        }
        if present(&self.project_id).is_none() {
            missing.push("CI_PROJECT_ID (--project-id)".to_string());
        }
        if self.mr_iid.is_none() {
            missing.push("CI_MERGE_REQUEST_IID (--mr)".to_string());
        }

        match (present(&self.token), present(&self.project_id), self.mr_iid) {
            (Some(token), Some(project), Some(iid)) if missing.is_empty() => {
                let api_url = present(&self.api_url)
                    .unwrap_or(config.gitlab.api_url.as_str())
                    .to_string();
                Ok(GitLabSettings::new(api_url, token, project, iid).with_timeouts(
                    Duration::from_secs(config.gitlab.read_timeout_secs),
                    Duration::from_secs(config.gitlab.post_timeout_secs),
                ))
            }
            _ => Err(GateError::MissingSettings { names: missing }),
        }
    }
}
