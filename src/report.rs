//! Report rendering and delivery.
//!
//! Rendering is a pure function of the findings, the verdict and whether the
//! run completed; nothing a check produced is re-derived here.
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::report::ReportRenderer;
//!
//! let renderer = ReportRenderer::new("Mobile App");
//! print!("{}", renderer.render_console(&evaluation.findings, &evaluation.verdict, true));
//! let body = renderer.render_markdown(&evaluation.findings, &evaluation.verdict, true);
//! ```

use async_trait::async_trait;
use colored::Colorize;

use crate::error::Result;
use crate::rules::{ids, truncated_count, truncation_line, Finding};
use crate::verdict::Verdict;

// ============================================================================
// Report Sink
// ============================================================================

/// Destination of the rendered Markdown report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Post one report body.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::SinkPost`](crate::GateError::SinkPost) when the
    /// body could not be delivered.
    async fn post_report(&self, body: &str) -> Result<()>;
}

// ============================================================================
// Report Renderer
// ============================================================================

/// Configuration for report rendering.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Label interpolated into banners.
    pub project_label: String,
    /// Maximum issues shown per check in the details section.
    pub max_issues_per_check: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            project_label: "Project".to_string(),
            max_issues_per_check: 5,
        }
    }
}

/// Renders the console transcript and the MR comment.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    config: ReportConfig,
}

const QUICK_REFERENCE: &str = "\
### Quick Reference

- **Titles and commits**: `type(scope): description` with type one of feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- **Never commit** `.env` files, keystores, private keys or credential files
- **Layout**: controllers in `controller/` as `*_controller.dart`, pages in `view/` as `*_page.dart`, repositories in `repository/` as `*_repository.dart`
- **UI text** comes from localization, never string literals
- **Dimensions** use `.h`, `.w`, `.sp` and `.r` scaling suffixes
- **Widgets**: use `AppButton`, `AppText`, `AppImage` and `AppTextField` instead of the Material baselines
- **TODOs** reference a ticket: `// TODO(APP-123): ...`
- **Logging** goes through the app logger, not `print`
";

impl ReportRenderer {
    /// Create a renderer for the given project label.
    #[must_use]
    pub fn new(project_label: impl Into<String>) -> Self {
        Self {
            config: ReportConfig {
                project_label: project_label.into(),
                ..ReportConfig::default()
            },
        }
    }

    #[must_use]
    pub fn with_config(config: ReportConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// One summary line and a blank line per check, then the final banner.
    #[must_use]
    pub fn render_console(&self, findings: &[Finding], verdict: &Verdict, complete: bool) -> String {
        let mut out = String::new();
        for finding in findings {
            out.push_str(&finding.summary());
            out.push_str("\n\n");
        }

        let rule = "=".repeat(60);
        out.push_str(&rule);
        out.push('\n');
        let label = &self.config.project_label;
        if verdict.overall_pass {
            let banner = format!("✅ {} MR quality check PASSED", label);
            out.push_str(&banner.green().bold().to_string());
        } else {
            let banner = format!(
                "❌ {} MR quality check FAILED: {} critical issue(s)",
                label, verdict.critical_failures
            );
            out.push_str(&banner.red().bold().to_string());
        }
        out.push('\n');
        out.push_str(&format!(
            "   {} warning(s), {} info\n",
            verdict.warnings, verdict.info_issues
        ));
        if !complete {
            let notice = "⚠️  Partial run: the deadline expired before every file was scanned";
            out.push_str(&notice.yellow().to_string());
            out.push('\n');
        }
        out.push_str(&rule);
        out.push('\n');
        out
    }

    /// Markdown body posted as the MR comment.
    #[must_use]
    pub fn render_markdown(&self, findings: &[Finding], verdict: &Verdict, complete: bool) -> String {
        let mut md = String::new();
        let label = &self.config.project_label;

        if verdict.overall_pass {
            md.push_str(&format!("## ✅ {} MR Quality Check: PASSED\n\n", label));
        } else {
            md.push_str(&format!("## ❌ {} MR Quality Check: FAILED\n\n", label));
        }
        if !complete {
            md.push_str(
                "> ⚠️ **Partial report**: the run deadline expired before every file was scanned. \
                 Re-run the pipeline for a complete result.\n\n",
            );
        }

        md.push_str("| Critical | Warnings | Info |\n");
        md.push_str("|:---:|:---:|:---:|\n");
        md.push_str(&format!(
            "| {} | {} | {} |\n\n",
            verdict.critical_failures, verdict.warnings, verdict.info_issues
        ));

        md.push_str("### Checks\n\n");
        for finding in findings {
            md.push_str(&format!("- {}\n", finding.summary()));
        }
        md.push('\n');

        let detailed: Vec<&Finding> = findings
            .iter()
            .filter(|f| !f.result.passed || !f.result.issues.is_empty())
            .collect();
        if !detailed.is_empty() {
            md.push_str("### Details & Recommendations\n\n");
            for finding in detailed {
                md.push_str(&self.format_details(finding));
            }
        }

        md.push_str("---\n\n");
        md.push_str(QUICK_REFERENCE);
        md.push_str("\n_Generated by mrgate_\n");
        md
    }

    fn format_details(&self, finding: &Finding) -> String {
        let mut section = format!(
            "#### {} {} ({})\n\n",
            finding.status_icon(),
            finding.check_name,
            finding.severity
        );

        let issues = &finding.result.issues;
        let (entries, already_hidden) = match issues.split_last() {
            Some((last, rest)) => match truncated_count(last) {
                Some(n) => (rest, n),
                None => (issues.as_slice(), 0),
            },
            None => (issues.as_slice(), 0),
        };

        let max = self.config.max_issues_per_check;
        for issue in entries.iter().take(max) {
            section.push_str(&format!("- {}\n", issue));
        }
        let hidden = entries.len().saturating_sub(max) + already_hidden;
        if hidden > 0 {
            section.push_str(&format!("- {}\n", truncation_line(hidden)));
        }

        if !finding.result.passed {
            if let Some(guidance) = guidance(&finding.check_id) {
                section.push_str(&format!("\n**How to fix:** {}\n", guidance));
            }
        }
        section.push('\n');
        section
    }
}

/// Per-check fix guidance.
fn guidance(check_id: &str) -> Option<&'static str> {
    let text = match check_id {
        ids::MR_TITLE => "Rename the MR to `type(scope): description`, e.g. `feat(login): add forgot password`.",
        ids::MR_DESCRIPTION => "Fill in the MR template: what changed, why, and how it was tested.",
        ids::WIP_COMMITS => "Squash or reword WIP commits with `git rebase -i` before merging.",
        ids::COMMIT_FORMAT => "Reword commits to the conventional format with `git rebase -i`.",
        ids::SENSITIVE_FILES => "Remove the files from the branch history, add them to `.gitignore` and rotate every exposed credential.",
        ids::NAMING_CONVENTION => "Rename files to match their folder's suffix.",
        ids::FOLDER_STRUCTURE => "Move files into the folder that matches their suffix.",
        ids::HARDCODED_STRINGS => "Move user-facing text into the localization files; mark intentional literals with `// no-i18n`.",
        ids::DEBUG_PRINTS => "Replace `print`/`debugPrint` with the app logger or remove them.",
        ids::TODO_TICKETS => "Reference a ticket: `// TODO(APP-123): ...`.",
        ids::DIMENSION_CONVENTIONS => "Apply the scaling suffix shown next to each literal.",
        ids::WIDGET_REPLACEMENTS => "Use the project wrapper widgets and pass styling through their parameters.",
        ids::SECRETS => "Load secrets from CI variables or secure storage, and rotate any value that was pushed.",
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CheckResult, Severity};

    fn finding(id: &str, severity: Severity, result: CheckResult) -> Finding {
        Finding {
            check_id: id.to_string(),
            check_name: id.replace('_', " "),
            severity,
            result,
        }
    }

    fn sample() -> Vec<Finding> {
        vec![
            finding(
                ids::MR_TITLE,
                Severity::Critical,
                CheckResult::pass("MR title follows conventional format"),
            ),
            finding(
                ids::MR_DESCRIPTION,
                Severity::Warning,
                CheckResult::pass("MR description provided")
                    .with_issues(vec!["Consider using the MR template".into()]),
            ),
            finding(
                ids::SENSITIVE_FILES,
                Severity::Critical,
                CheckResult::fail("Found 1 sensitive file(s)", vec![".env (forbidden file)".into()]),
            ),
            finding(
                ids::DEBUG_PRINTS,
                Severity::Warning,
                CheckResult::fail(
                    "7 debug print(s)",
                    (0..7).map(|i| format!("lib/a.dart:{}: print(x)", i)).collect(),
                ),
            ),
        ]
    }

    #[test]
    fn test_console_has_line_and_blank_per_check() {
        let findings = sample();
        let verdict = Verdict::from_findings(&findings);
        let out = ReportRenderer::new("Mobile").render_console(&findings, &verdict, true);

        assert!(out.starts_with("✅ MR title follows conventional format\n\n✅ MR description"));
        assert!(out.contains("❌ Found 1 sensitive file(s)\n\n"));
        assert!(out.contains("⚠️ 7 debug print(s)\n\n"));
        assert!(out.contains("Mobile MR quality check FAILED: 1 critical issue(s)"));
        assert!(out.contains("1 warning(s), 0 info"));
        assert!(!out.contains("Partial run"));
    }

    #[test]
    fn test_markdown_structure() {
        let findings = sample();
        let verdict = Verdict::from_findings(&findings);
        let md = ReportRenderer::new("Mobile").render_markdown(&findings, &verdict, true);

        assert!(md.starts_with("## ❌ Mobile MR Quality Check: FAILED"));
        assert!(md.contains("| 1 | 1 | 0 |"));
        assert!(md.contains("- ✅ MR title follows conventional format"));
        assert!(md.contains("### Details & Recommendations"));
        assert!(md.contains("#### ❌ sensitive files (critical)"));
        assert!(md.contains("- .env (forbidden file)"));
        assert!(md.contains("**How to fix:** Remove the files"));
        assert!(md.contains("#### ✅ mr description (warning)"));
        assert!(md.ends_with("_Generated by mrgate_\n"));
        assert!(md.contains("### Quick Reference"));
    }

    #[test]
    fn test_details_show_at_most_five_issues() {
        let findings = sample();
        let verdict = Verdict::from_findings(&findings);
        let md = ReportRenderer::new("Mobile").render_markdown(&findings, &verdict, true);

        assert!(md.contains("lib/a.dart:4: print(x)"));
        assert!(!md.contains("lib/a.dart:5: print(x)"));
        assert!(md.contains("- ... and 2 more\n"));
    }

    #[test]
    fn test_details_fold_check_truncation_into_hidden_count() {
        let mut issues: Vec<String> = (0..10)
            .map(|i| format!("lib/a.dart:{}: print(x)", i))
            .collect();
        issues.push(truncation_line(4));
        let findings = vec![finding(
            ids::DEBUG_PRINTS,
            Severity::Warning,
            CheckResult::fail("14 debug print(s)", issues),
        )];
        let verdict = Verdict::from_findings(&findings);
        let md = ReportRenderer::new("Mobile").render_markdown(&findings, &verdict, true);

        assert!(md.contains("lib/a.dart:4: print(x)"));
        assert!(!md.contains("lib/a.dart:5: print(x)"));
        assert!(md.contains("- ... and 9 more\n"));
        assert!(!md.contains("... and 4 more"));
    }

    #[test]
    fn test_details_keep_short_truncated_lists_whole() {
        let findings = vec![finding(
            ids::SECRETS,
            Severity::Critical,
            CheckResult::fail(
                "3 potential secret(s)",
                vec!["a".into(), "b".into(), truncation_line(1)],
            ),
        )];
        let verdict = Verdict::from_findings(&findings);
        let md = ReportRenderer::with_config(ReportConfig {
            project_label: "Mobile".into(),
            max_issues_per_check: 2,
        })
        .render_markdown(&findings, &verdict, true);

        assert!(md.contains("- a\n- b\n- ... and 1 more\n"));
    }

    #[test]
    fn test_passing_run_has_no_details() {
        let findings = vec![finding(
            ids::MR_TITLE,
            Severity::Critical,
            CheckResult::pass("MR title follows conventional format"),
        )];
        let verdict = Verdict::from_findings(&findings);
        let md = ReportRenderer::new("Mobile").render_markdown(&findings, &verdict, true);

        assert!(md.starts_with("## ✅ Mobile MR Quality Check: PASSED"));
        assert!(!md.contains("Details & Recommendations"));
        assert!(md.contains("### Quick Reference"));
    }

    #[test]
    fn test_partial_run_is_flagged() {
        let findings = sample();
        let verdict = Verdict::from_findings(&findings);
        let renderer = ReportRenderer::new("Mobile");
        assert!(renderer
            .render_markdown(&findings, &verdict, false)
            .contains("**Partial report**"));
        assert!(renderer
            .render_console(&findings, &verdict, false)
            .contains("Partial run"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let findings = sample();
        let verdict = Verdict::from_findings(&findings);
        let renderer = ReportRenderer::new("Mobile");
        assert_eq!(
            renderer.render_markdown(&findings, &verdict, true),
            renderer.render_markdown(&findings, &verdict, true)
        );
    }

    #[test]
    fn test_every_check_has_guidance() {
        for id in ids::ALL {
            assert!(guidance(id).is_some(), "no guidance for {}", id);
        }
        assert!(guidance("unknown").is_none());
    }
}
