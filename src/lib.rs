//! mrgate - Merge Request Quality Gate
//!
//! Evaluates a GitLab merge request against a fixed catalogue of rules
//! (metadata, paths, content, secrets), posts a Markdown report to the MR
//! and exits non-zero when a critical rule fails.
//!
//! # Architecture
//!
//! - [`source`] - Diff sources: the GitLab REST client and offline snapshots
//! - [`rules`] - Check trait, rule tables, heuristics and the built-in checks
//! - [`engine`] - Gathers one MR and runs every registered check
//! - [`verdict`] - Reduces findings to pass/fail
//! - [`report`] - Console transcript, Markdown comment and the report sink
//! - [`run`] - One end-to-end gate run
//! - [`config`] - Layered TOML configuration and validation
//! - [`ci`] - `.gitlab-ci.yml` patching
//! - [`error`] - Error types
//! - [`testing`] - Mocks, fixtures and assertions
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::config::ConfigLoader;
//! use mrgate::run::{GateRun, RunOptions};
//! use mrgate::source::SnapshotSource;
//!
//! let config = ConfigLoader::new().load(Path::new("."))?;
//! let engine = config.build_engine()?;
//! let renderer = config.report_renderer();
//! let source = SnapshotSource::load("mr.json")?;
//! let outcome = GateRun::new(&engine, &renderer, &config.project_label)
//!     .execute(&source, None, &RunOptions::default())
//!     .await?;
//! print!("{}", outcome.console);
//! std::process::exit(outcome.exit_code());
//! ```

pub mod ci;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod rules;
pub mod run;
pub mod source;
pub mod testing;
pub mod verdict;

// Re-export commonly used types
pub use error::{GateError, IntoGateError, Result};

pub use config::{ConfigLoader, ConfigValidator, ConnectionArgs, GateConfig, ValidationReport};

pub use engine::{EngineConfig, Evaluation, RuleEngine};

pub use rules::{
    Check, CheckContext, CheckLimits, CheckResult, Finding, RuleOverrides, RuleTables, Severity,
    SeverityPolicy,
};

pub use source::{
    Commit, DiffSource, FileChange, GitLabClient, GitLabSettings, MergeRequest, SnapshotSource,
};

pub use report::{ReportRenderer, ReportSink};
pub use run::{GateRun, RunOptions, RunOutcome, RunSummary};
pub use verdict::Verdict;

pub use ci::{CiOutcome, CiPatcher};

pub use testing::{MockDiffSource, RecordingSink};
