//! Rule engine orchestration.
//!
//! The [`RuleEngine`] gathers one merge request from a [`DiffSource`], runs
//! every registered check against it and reduces the findings to a
//! [`Verdict`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::engine::{EngineConfig, RuleEngine};
//! use mrgate::source::SnapshotSource;
//!
//! let engine = RuleEngine::standard(EngineConfig::new())?;
//! let source = SnapshotSource::load("mr.json")?;
//! let evaluation = engine.evaluate(&source).await?;
//! std::process::exit(evaluation.verdict.exit_code());
//! ```

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{GateError, Result};
use crate::rules::{
    standard_checks, tables::SOURCE_EXTENSIONS, Check, CheckContext, CheckLimits, CheckResult,
    Finding, RuleTables, Severity, SeverityPolicy,
};
use crate::source::{ContentCache, DiffSource};
use crate::verdict::Verdict;

// ============================================================================
// Engine Configuration
// ============================================================================

/// Execution settings for the rule engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Run checks concurrently on blocking tasks.
    ///
    /// Findings keep registration order either way.
    pub parallel_checks: bool,
    /// Wall-clock budget for content fetching. Files not fetched in time are
    /// left unscanned and the run is flagged incomplete.
    pub run_deadline: Option<Duration>,
    /// Draw a progress bar on stderr while fetching content.
    pub show_progress: bool,
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parallel_checks(mut self, enabled: bool) -> Self {
        self.parallel_checks = enabled;
        self
    }

    #[must_use]
    pub fn with_run_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.run_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }
}

// ============================================================================
// Evaluation Result
// ============================================================================

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The data the checks saw.
    pub context: Arc<CheckContext>,
    /// One finding per registered check, in registration order.
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
    /// False when the run deadline cut content fetching short.
    pub complete: bool,
    /// Files left unscanned because of the deadline.
    pub skipped_files: usize,
    /// Content fetches issued to the source.
    pub content_fetches: usize,
}

/// Context plus the bookkeeping of how it was gathered.
#[derive(Debug)]
pub struct Gathered {
    pub context: CheckContext,
    pub complete: bool,
    pub skipped_files: usize,
    pub content_fetches: usize,
}

// ============================================================================
// Rule Engine
// ============================================================================

struct Registered {
    check: Arc<dyn Check>,
    severity: Severity,
}

/// Registry of checks with their severities.
pub struct RuleEngine {
    checks: Vec<Registered>,
    content_extensions: Vec<String>,
    config: EngineConfig,
}

impl RuleEngine {
    /// Create an engine with no checks.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            checks: Vec::new(),
            content_extensions: SOURCE_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            config,
        }
    }

    /// Create an engine with every built-in check at its default severity.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn standard(config: EngineConfig) -> Result<Self> {
        let tables = Arc::new(RuleTables::standard()?);
        Ok(Self::from_tables(
            config,
            &tables,
            &CheckLimits::default(),
            &SeverityPolicy::default(),
            &[],
        ))
    }

    /// Create an engine from compiled tables, skipping `disabled` check ids.
    #[must_use]
    pub fn from_tables(
        config: EngineConfig,
        tables: &Arc<RuleTables>,
        limits: &CheckLimits,
        policy: &SeverityPolicy,
        disabled: &[String],
    ) -> Self {
        let mut engine = Self::new(config).with_content_extensions(tables.source_extensions.clone());
        for check in standard_checks(tables, limits) {
            if disabled.iter().any(|d| d == check.id()) {
                debug!("check '{}' disabled by configuration", check.id());
                continue;
            }
            let severity = policy.severity_of(check.id());
            engine.register(check, severity);
        }
        engine
    }

    /// Extensions of files whose content is fetched before checks run.
    #[must_use]
    pub fn with_content_extensions(mut self, extensions: Vec<String>) -> Self {
        self.content_extensions = extensions;
        self
    }

    /// Register a check at the given severity. Registration order is report
    /// order.
    pub fn register(&mut self, check: Arc<dyn Check>, severity: Severity) {
        self.checks.push(Registered { check, severity });
    }

    /// Registered `(id, name, severity)` triples in order.
    pub fn registered(&self) -> impl Iterator<Item = (&'static str, &'static str, Severity)> + '_ {
        self.checks
            .iter()
            .map(|r| (r.check.id(), r.check.name(), r.severity))
    }

    /// Number of registered checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Fetch everything the checks need.
    ///
    /// # Errors
    ///
    /// Returns a fatal fetch error if metadata, commits or the change list
    /// cannot be retrieved. Content failures surface as empty content.
    pub async fn gather(&self, source: &dyn DiffSource) -> Result<Gathered> {
        let merge_request = source.fetch_metadata().await?;
        let commits = source.fetch_commits().await?;
        let changes = source.fetch_changed_files().await?;
        info!(
            "merge request '{}': {} commit(s), {} changed file(s)",
            merge_request.title,
            commits.len(),
            changes.len()
        );

        let git_ref = merge_request.source_branch.clone();
        let mut context = CheckContext::new(merge_request, commits, changes);
        let wanted: Vec<String> = context
            .source_files(&self.content_extensions)
            .map(str::to_string)
            .collect();

        let cache = ContentCache::new();
        let progress = self.progress_bar(wanted.len());
        let deadline = self
            .config
            .run_deadline
            .map(|budget| tokio::time::Instant::now() + budget);

        let mut complete = true;
        let mut skipped_files = 0;
        for (i, path) in wanted.iter().enumerate() {
            progress.set_message(path.clone());
            let fetch = cache.get_or_fetch(source, path, &git_ref);
            let content = match deadline {
                Some(at) => match tokio::time::timeout_at(at, fetch).await {
                    Ok(content) => content,
                    Err(_) => {
                        complete = false;
                        skipped_files = wanted.len() - i;
                        for unfetched in &wanted[i..] {
                            context.mark_unscanned(unfetched.clone());
                        }
                        warn!(
                            "run deadline reached; {} file(s) left unscanned",
                            skipped_files
                        );
                        break;
                    }
                },
                None => fetch.await,
            };
            context.insert_content(path.clone(), content);
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(Gathered {
            context,
            complete,
            skipped_files,
            content_fetches: cache.fetch_count(),
        })
    }

    /// Run every check against `ctx`, in registration order.
    pub async fn run(&self, ctx: Arc<CheckContext>) -> Vec<Finding> {
        if self.config.parallel_checks {
            self.run_concurrent(ctx).await
        } else {
            self.run_sequential(&ctx)
        }
    }

    /// Gather, run and reduce in one call.
    ///
    /// # Errors
    ///
    /// Propagates fatal fetch errors from [`gather`](Self::gather).
    pub async fn evaluate(&self, source: &dyn DiffSource) -> Result<Evaluation> {
        let gathered = self.gather(source).await?;
        let context = Arc::new(gathered.context);
        let findings = self.run(Arc::clone(&context)).await;
        let verdict = Verdict::from_findings(&findings);
        debug!(
            "verdict: {} critical, {} warning, {} info",
            verdict.critical_failures, verdict.warnings, verdict.info_issues
        );

        Ok(Evaluation {
            context,
            findings,
            verdict,
            complete: gathered.complete,
            skipped_files: gathered.skipped_files,
            content_fetches: gathered.content_fetches,
        })
    }

    fn run_sequential(&self, ctx: &CheckContext) -> Vec<Finding> {
        self.checks
            .iter()
            .map(|r| {
                let outcome = catch_unwind(AssertUnwindSafe(|| r.check.evaluate(ctx)))
                    .unwrap_or_else(|panic| Err(anyhow::anyhow!(panic_message(&*panic))));
                finding(r, outcome)
            })
            .collect()
    }

    async fn run_concurrent(&self, ctx: Arc<CheckContext>) -> Vec<Finding> {
        let handles: Vec<_> = self
            .checks
            .iter()
            .map(|r| {
                let check = Arc::clone(&r.check);
                let ctx = Arc::clone(&ctx);
                tokio::task::spawn_blocking(move || check.evaluate(&ctx))
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.checks)
            .map(|(joined, r)| {
                let outcome = joined.unwrap_or_else(|e| {
                    if e.is_panic() {
                        Err(anyhow::anyhow!(panic_message(&*e.into_panic())))
                    } else {
                        Err(anyhow::anyhow!("check task was cancelled"))
                    }
                });
                finding(r, outcome)
            })
            .collect()
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress || len == 0 || !std::io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Tag a check outcome with its severity, failing closed on error.
fn finding(registered: &Registered, outcome: anyhow::Result<CheckResult>) -> Finding {
    let check = &registered.check;
    let result = outcome.unwrap_or_else(|e| {
        let err = GateError::check_logic(check.name(), format!("{:#}", e));
        warn!("{}", err);
        CheckResult::fail(
            format!("{}: check could not complete", check.name()),
            vec![err.to_string()],
        )
    });
    Finding {
        check_id: check.id().to_string(),
        check_name: check.name().to_string(),
        severity: registered.severity,
        result,
    }
}
