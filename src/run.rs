//! One gate run: evaluate, render, deliver.
//!
//! The exit code is decided by the verdict alone. Posting the comment and
//! writing the JSON summary are side channels; a failed post is logged and
//! does not change the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{Evaluation, RuleEngine};
use crate::error::Result;
use crate::report::{ReportRenderer, ReportSink};
use crate::rules::Finding;
use crate::source::DiffSource;
use crate::verdict::Verdict;

/// Side channels of a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Post the Markdown report to the sink.
    pub post_comment: bool,
    /// Write a [`RunSummary`] here.
    pub json_out: Option<PathBuf>,
}

/// Machine-readable record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub project: String,
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
    pub complete: bool,
}

impl RunSummary {
    #[must_use]
    pub fn new(project: impl Into<String>, evaluation: &Evaluation) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            project: project.into(),
            findings: evaluation.findings.clone(),
            verdict: evaluation.verdict,
            complete: evaluation.complete,
        }
    }

    /// Write as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub evaluation: Evaluation,
    /// Console transcript, ready to print.
    pub console: String,
    /// Markdown comment body.
    pub markdown: String,
    /// Whether the comment reached the sink.
    pub posted: bool,
}

impl RunOutcome {
    /// 0 iff the verdict passed.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.evaluation.verdict.exit_code()
    }
}

/// Evaluates merge requests and delivers the reports.
pub struct GateRun<'a> {
    engine: &'a RuleEngine,
    renderer: &'a ReportRenderer,
    project: String,
}

impl<'a> GateRun<'a> {
    #[must_use]
    pub fn new(engine: &'a RuleEngine, renderer: &'a ReportRenderer, project: impl Into<String>) -> Self {
        Self {
            engine,
            renderer,
            project: project.into(),
        }
    }

    /// Evaluate `source`, render both reports and deliver them.
    ///
    /// # Errors
    ///
    /// Returns a fatal fetch error before anything is rendered or posted, or
    /// an IO error if the JSON summary cannot be written.
    pub async fn execute(
        &self,
        source: &dyn DiffSource,
        sink: Option<&dyn ReportSink>,
        options: &RunOptions,
    ) -> Result<RunOutcome> {
        let evaluation = self.engine.evaluate(source).await?;
        let console =
            self.renderer
                .render_console(&evaluation.findings, &evaluation.verdict, evaluation.complete);
        let markdown =
            self.renderer
                .render_markdown(&evaluation.findings, &evaluation.verdict, evaluation.complete);

        let mut posted = false;
        if options.post_comment {
            match sink {
                Some(sink) => match sink.post_report(&markdown).await {
                    Ok(()) => posted = true,
                    Err(e) => warn!("could not post report comment: {}", e),
                },
                None => warn!("no report sink configured; comment not posted"),
            }
        }

        if let Some(ref path) = options.json_out {
            RunSummary::new(self.project.clone(), &evaluation).write_to(path)?;
            info!("wrote run summary to {}", path.display());
        }

        Ok(RunOutcome {
            evaluation,
            console,
            markdown,
            posted,
        })
    }
}
