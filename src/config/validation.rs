//! Configuration validation.
//!
//! Loads the layered configuration the same way a run does, then checks
//! field values a run would otherwise trip over late: unknown check ids,
//! zero limits and timeouts, an unusable API URL and rule overrides that do
//! not compile.
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::config::ConfigValidator;
//! use std::path::Path;
//!
//! let report = ConfigValidator::new(Path::new(".")).validate();
//! if !report.is_valid() {
//!     eprintln!("{}", report.verbose_report());
//!     std::process::exit(report.exit_code());
//! }
//! ```

use reqwest::Url;
use std::path::{Path, PathBuf};

use super::{ConfigLoader, GateConfig, InheritanceChain};
use crate::rules::ids;

/// Errors and warnings found while validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that make the configuration unusable.
    pub errors: Vec<String>,
    /// Suspicious but usable settings.
    pub warnings: Vec<String>,
    pub inheritance_chain: InheritanceChain,
}

impl ValidationReport {
    /// An empty report is valid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings do not affect validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 0 if valid, 2 (configuration error) otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            2
        }
    }

    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            if self.warnings.is_empty() {
                "Configuration is valid.".to_string()
            } else {
                format!(
                    "Configuration is valid with {} warning(s).",
                    self.warnings.len()
                )
            }
        } else {
            format!(
                "Configuration is invalid with {} error(s).",
                self.errors.len()
            )
        }
    }

    /// Chain, errors, warnings and status as a multi-line block.
    #[must_use]
    pub fn verbose_report(&self) -> String {
        let mut lines = vec![
            "Configuration Validation Report".to_string(),
            "\u{2500}".repeat(50),
            String::new(),
            "Inheritance chain:".to_string(),
        ];

        if self.inheritance_chain.sources.is_empty() {
            lines.push("  (no config files consulted)".to_string());
        } else {
            for source in &self.inheritance_chain.sources {
                let status = if source.loaded { "\u{2713}" } else { "\u{2717}" };
                lines.push(format!(
                    "  {} [{}] {}",
                    status,
                    source.level,
                    source.path.display()
                ));
            }
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push(format!("Errors ({}):", self.errors.len()));
            for error in &self.errors {
                lines.push(format!("  \u{2717} {}", error));
            }
        }

        if !self.warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  \u{26a0} {}", warning));
            }
        }

        lines.push(String::new());
        lines.push(format!("Status: {}", self.summary()));

        lines.join("\n")
    }
}

/// Validates the configuration for a project directory.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
    project_dir: PathBuf,
    loader: ConfigLoader,
}

impl ConfigValidator {
    /// Validator using the default user config path.
    #[must_use]
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            loader: ConfigLoader::new(),
        }
    }

    /// Use a preconfigured loader (custom user path, explicit file).
    #[must_use]
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Load and check the configuration.
    ///
    /// Load failures are reported as errors rather than returned.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self.loader.load_with_chain(&self.project_dir) {
            Ok((config, chain)) => {
                report.inheritance_chain = chain;
                Self::check(&config, &mut report);
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        report
    }

    /// Check field values of an already loaded configuration.
    pub fn check(config: &GateConfig, report: &mut ValidationReport) {
        let known = |id: &str| ids::ALL.contains(&id);

        for id in &config.checks.disabled {
            if !known(id) {
                report
                    .errors
                    .push(format!("checks.disabled: unknown check id '{}'", id));
            }
        }
        for id in config.severity.keys() {
            if !known(id) {
                report
                    .errors
                    .push(format!("severity.{}: unknown check id", id));
            }
        }
        if ids::ALL.iter().all(|id| config.checks.disabled.iter().any(|d| d == id)) {
            report
                .warnings
                .push("every check is disabled; runs will always pass".to_string());
        }

        let limits = &config.limits;
        let caps = [
            ("commit_format", limits.commit_format),
            ("hardcoded_strings", limits.hardcoded_strings),
            ("hardcoded_strings_listed", limits.hardcoded_strings_listed),
            ("debug_prints", limits.debug_prints),
            ("todo_tickets", limits.todo_tickets),
            ("dimension_conventions", limits.dimension_conventions),
            ("widget_replacements", limits.widget_replacements),
            ("widget_wrappers", limits.widget_wrappers),
            ("secrets", limits.secrets),
        ];
        for (name, value) in caps {
            if value == 0 {
                report
                    .errors
                    .push(format!("limits.{}: must be at least 1", name));
            }
        }
        if limits.hardcoded_strings_listed > limits.hardcoded_strings {
            report.warnings.push(format!(
                "limits.hardcoded_strings_listed ({}) exceeds limits.hardcoded_strings ({}); \
                 only {} will be listed",
                limits.hardcoded_strings_listed,
                limits.hardcoded_strings,
                limits.hardcoded_strings
            ));
        }

        if config.report.max_issues_per_check == 0 {
            report
                .errors
                .push("report.max_issues_per_check: must be at least 1".to_string());
        }

        if config.gitlab.read_timeout_secs == 0 {
            report
                .errors
                .push("gitlab.read_timeout_secs: must be at least 1".to_string());
        }
        if config.gitlab.post_timeout_secs == 0 {
            report
                .errors
                .push("gitlab.post_timeout_secs: must be at least 1".to_string());
        }
        if config.engine.run_deadline_secs == Some(0) {
            report
                .errors
                .push("engine.run_deadline_secs: must be at least 1".to_string());
        }

        match Url::parse(&config.gitlab.api_url) {
            Ok(url) if url.cannot_be_a_base() => report.errors.push(format!(
                "gitlab.api_url: '{}' cannot be used as a base URL",
                config.gitlab.api_url
            )),
            Ok(url) if !matches!(url.scheme(), "http" | "https") => report.errors.push(format!(
                "gitlab.api_url: unsupported scheme '{}'",
                url.scheme()
            )),
            Ok(_) => {}
            Err(e) => report
                .errors
                .push(format!("gitlab.api_url: {}", e)),
        }

        if let Err(e) = config.rule_tables() {
            report.errors.push(e.to_string());
        }

        if config.project_label.trim().is_empty() {
            report
                .warnings
                .push("project_label is empty; report banners will read oddly".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn validate_project(content: &str) -> ValidationReport {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("mrgate.toml"), content).unwrap();
        ConfigValidator::new(project.path())
            .with_loader(ConfigLoader::new().without_user_config())
            .validate()
    }

    #[test]
    fn test_empty_report_is_valid() {
        let report = ValidationReport::new();
        assert!(report.is_valid());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.summary(), "Configuration is valid.");
    }

    #[test]
    fn test_default_config_is_valid() {
        let mut report = ValidationReport::new();
        ConfigValidator::check(&GateConfig::default(), &mut report);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_unknown_check_ids_are_errors() {
        let report = validate_project(
            "[checks]\ndisabled = [\"no_such_check\"]\n[severity]\nbogus = \"info\"\n",
        );
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("no_such_check"));
        assert!(report.errors[1].starts_with("severity.bogus"));
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_zero_limits_and_timeouts_are_errors() {
        let report = validate_project(
            "[limits]\nsecrets = 0\n[gitlab]\nread_timeout_secs = 0\n[engine]\nrun_deadline_secs = 0\n",
        );
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors.iter().any(|e| e.starts_with("limits.secrets")));
    }

    #[test]
    fn test_zero_report_issue_limit_is_an_error() {
        let report = validate_project("[report]\nmax_issues_per_check = 0\n");
        assert_eq!(
            report.errors,
            vec!["report.max_issues_per_check: must be at least 1".to_string()]
        );
    }

    #[test]
    fn test_bad_api_url_is_an_error() {
        let report = validate_project("[gitlab]\napi_url = \"not a url\"\n");
        assert!(report.errors.iter().any(|e| e.starts_with("gitlab.api_url")));

        let report = validate_project("[gitlab]\napi_url = \"ftp://gitlab.example.com\"\n");
        assert!(report.errors[0].contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_bad_rule_override_is_an_error() {
        let report = validate_project("[rules]\nextra_sensitive_patterns = [\"(unclosed\"]\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("rules"));
    }

    #[test]
    fn test_warnings_keep_config_valid() {
        let report = validate_project(
            "project_label = \" \"\n[limits]\nhardcoded_strings = 5\nhardcoded_strings_listed = 8\n",
        );
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.summary(), "Configuration is valid with 2 warning(s).");
    }

    #[test]
    fn test_all_disabled_warns() {
        let mut config = GateConfig::default();
        config.checks.disabled = ids::ALL.iter().map(|s| s.to_string()).collect();
        let mut report = ValidationReport::new();
        ConfigValidator::check(&config, &mut report);
        assert!(report.is_valid());
        assert!(report.warnings[0].contains("every check is disabled"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let report = validate_project("project_label = ");
        assert!(!report.is_valid());
        assert!(report.verbose_report().contains("Errors (1):"));
    }

    #[test]
    fn test_verbose_report_lists_chain() {
        let report = validate_project("project_label = \"Mobile\"\n");
        let text = report.verbose_report();
        assert!(text.contains("\u{2713} [project]"));
        assert!(text.ends_with("Status: Configuration is valid."));
    }
}
