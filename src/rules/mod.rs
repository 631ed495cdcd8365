//! The rule engine's checks.
//!
//! - [`metadata`] - MR title, description and commit checks
//! - [`paths`] - Checks over changed-file paths
//! - [`content`] - Line scans over changed-file content
//! - [`widgets`] - Wrapper-component enforcement
//! - [`secrets`] - Credential detection
//! - [`tables`] - Pattern tables the checks consume
//! - [`heuristics`] - Named false-positive predicates
//!
//! # Available Checks
//!
//! | Id | Input | Default severity |
//! |----|-------|------------------|
//! | `mr_title` | metadata | critical |
//! | `mr_description` | metadata | warning |
//! | `wip_commits` | commits | critical |
//! | `commit_format` | commits | warning |
//! | `sensitive_files` | paths | critical |
//! | `naming_convention` | paths | critical |
//! | `folder_structure` | paths | critical |
//! | `hardcoded_strings` | content | warning |
//! | `debug_prints` | content | warning |
//! | `todo_tickets` | content | info |
//! | `dimension_conventions` | content | critical |
//! | `widget_replacements` | content | critical |
//! | `secrets` | content | critical |

pub mod content;
pub mod heuristics;
pub mod metadata;
pub mod paths;
pub mod secrets;
pub mod tables;
pub mod widgets;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use crate::source::{Commit, FileChange, MergeRequest};

pub use tables::{RuleOverrides, RuleTables, WidgetReplacementSpec};

/// Stable check identifiers used in configuration and JSON output.
pub mod ids {
    pub const MR_TITLE: &str = "mr_title";
    pub const MR_DESCRIPTION: &str = "mr_description";
    pub const WIP_COMMITS: &str = "wip_commits";
    pub const COMMIT_FORMAT: &str = "commit_format";
    pub const SENSITIVE_FILES: &str = "sensitive_files";
    pub const NAMING_CONVENTION: &str = "naming_convention";
    pub const FOLDER_STRUCTURE: &str = "folder_structure";
    pub const HARDCODED_STRINGS: &str = "hardcoded_strings";
    pub const DEBUG_PRINTS: &str = "debug_prints";
    pub const TODO_TICKETS: &str = "todo_tickets";
    pub const DIMENSION_CONVENTIONS: &str = "dimension_conventions";
    pub const WIDGET_REPLACEMENTS: &str = "widget_replacements";
    pub const SECRETS: &str = "secrets";

    /// Every id in registration order.
    pub const ALL: &[&str] = &[
        MR_TITLE,
        MR_DESCRIPTION,
        WIP_COMMITS,
        COMMIT_FORMAT,
        SENSITIVE_FILES,
        NAMING_CONVENTION,
        FOLDER_STRUCTURE,
        HARDCODED_STRINGS,
        DEBUG_PRINTS,
        TODO_TICKETS,
        DIMENSION_CONVENTIONS,
        WIDGET_REPLACEMENTS,
        SECRETS,
    ];
}

// ============================================================================
// Severity
// ============================================================================

/// How much a failing check matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic suggestion.
    Info,
    /// Flagged, never blocks.
    Warning,
    /// Blocks the merge.
    Critical,
}

impl Severity {
    /// Whether a failure at this severity flips the verdict.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Status icon shown for a failing check of this severity.
    #[must_use]
    pub fn failure_icon(&self) -> &'static str {
        match self {
            Self::Critical => "❌",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown severity '{}' (expected critical, warning or info)",
                other
            )),
        }
    }
}

/// Check id to severity mapping applied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityPolicy(BTreeMap<String, Severity>);

impl Default for SeverityPolicy {
    fn default() -> Self {
        use ids::*;
        let defaults = [
            (MR_TITLE, Severity::Critical),
            (MR_DESCRIPTION, Severity::Warning),
            (WIP_COMMITS, Severity::Critical),
            (COMMIT_FORMAT, Severity::Warning),
            (SENSITIVE_FILES, Severity::Critical),
            (NAMING_CONVENTION, Severity::Critical),
            (FOLDER_STRUCTURE, Severity::Critical),
            (HARDCODED_STRINGS, Severity::Warning),
            (DEBUG_PRINTS, Severity::Warning),
            (TODO_TICKETS, Severity::Info),
            (DIMENSION_CONVENTIONS, Severity::Critical),
            (WIDGET_REPLACEMENTS, Severity::Critical),
            (SECRETS, Severity::Critical),
        ];
        Self(
            defaults
                .into_iter()
                .map(|(id, sev)| (id.to_string(), sev))
                .collect(),
        )
    }
}

impl SeverityPolicy {
    /// Default policy with per-check overrides applied.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, Severity>) -> Self {
        let mut policy = Self::default();
        for (id, severity) in overrides {
            policy.0.insert(id.clone(), *severity);
        }
        policy
    }

    /// Severity registered for `check_id`; unknown checks are warnings.
    #[must_use]
    pub fn severity_of(&self, check_id: &str) -> Severity {
        self.0.get(check_id).copied().unwrap_or(Severity::Warning)
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Reporting caps per check. Caps bound what is reported, never what is
/// scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckLimits {
    pub commit_format: usize,
    pub hardcoded_strings: usize,
    pub hardcoded_strings_listed: usize,
    pub debug_prints: usize,
    pub todo_tickets: usize,
    pub dimension_conventions: usize,
    pub widget_replacements: usize,
    pub widget_wrappers: usize,
    pub secrets: usize,
}

impl Default for CheckLimits {
    fn default() -> Self {
        Self {
            commit_format: 5,
            hardcoded_strings: 15,
            hardcoded_strings_listed: 10,
            debug_prints: 10,
            todo_tickets: 10,
            dimension_conventions: 15,
            widget_replacements: 15,
            widget_wrappers: 10,
            secrets: 10,
        }
    }
}

impl CheckLimits {
    /// Reporting cap for `check_id`, if the check has one.
    #[must_use]
    pub fn cap_of(&self, check_id: &str) -> Option<usize> {
        match check_id {
            ids::COMMIT_FORMAT => Some(self.commit_format),
            ids::HARDCODED_STRINGS => Some(self.hardcoded_strings),
            ids::DEBUG_PRINTS => Some(self.debug_prints),
            ids::TODO_TICKETS => Some(self.todo_tickets),
            ids::DIMENSION_CONVENTIONS => Some(self.dimension_conventions),
            ids::WIDGET_REPLACEMENTS => Some(self.widget_replacements),
            ids::SECRETS => Some(self.secrets),
            _ => None,
        }
    }
}

// ============================================================================
// Check Result Types
// ============================================================================

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check passed.
    pub passed: bool,
    /// One-line summary without a status icon.
    pub summary_line: String,
    /// Violations or suggestions, already truncated for display.
    pub issues: Vec<String>,
}

impl CheckResult {
    /// Create a passing result.
    pub fn pass(summary_line: impl Into<String>) -> Self {
        Self {
            passed: true,
            summary_line: summary_line.into(),
            issues: Vec::new(),
        }
    }

    /// Create a failing result with issues.
    pub fn fail(summary_line: impl Into<String>, issues: Vec<String>) -> Self {
        Self {
            passed: false,
            summary_line: summary_line.into(),
            issues,
        }
    }

    /// Attach non-blocking caveats to a result.
    #[must_use]
    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        self.issues = issues;
        self
    }
}

/// A check's result tagged with its registered severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check_id: String,
    pub check_name: String,
    pub severity: Severity,
    pub result: CheckResult,
}

impl Finding {
    /// Whether this finding flips the verdict.
    #[must_use]
    pub fn is_blocking_failure(&self) -> bool {
        !self.result.passed && self.severity.is_blocking()
    }

    /// Status icon for this finding.
    #[must_use]
    pub fn status_icon(&self) -> &'static str {
        if self.result.passed {
            "✅"
        } else {
            self.severity.failure_icon()
        }
    }

    /// Summary line with its status icon.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} {}", self.status_icon(), self.result.summary_line)
    }
}

// ============================================================================
// Check Trait
// ============================================================================

/// A single independent rule.
///
/// Checks are read-only over the [`CheckContext`] and never observe another
/// check's output, so they can run in any order or concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use mrgate::rules::{Check, CheckContext, CheckResult};
///
/// struct NonEmptyTitle;
///
/// impl Check for NonEmptyTitle {
///     fn id(&self) -> &'static str { "non_empty_title" }
///     fn name(&self) -> &'static str { "Non-empty title" }
///     fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
///         Ok(if ctx.merge_request.title.is_empty() {
///             CheckResult::fail("MR title is empty", vec![])
///         } else {
///             CheckResult::pass("MR title present")
///         })
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// Stable identifier, see [`ids`].
    fn id(&self) -> &'static str;

    /// Display name.
    fn name(&self) -> &'static str;

    /// Evaluate the check.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot complete; the engine reports it
    /// as a failing finding.
    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult>;
}

// ============================================================================
// Check Context
// ============================================================================

/// Read-only snapshot of one MR that every check evaluates against.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    pub merge_request: MergeRequest,
    pub commits: Vec<Commit>,
    pub changes: Vec<FileChange>,
    contents: HashMap<String, Arc<str>>,
    unscanned: HashSet<String>,
}

impl CheckContext {
    /// Create a context without file content.
    pub fn new(merge_request: MergeRequest, commits: Vec<Commit>, changes: Vec<FileChange>) -> Self {
        Self {
            merge_request,
            commits,
            changes,
            contents: HashMap::new(),
            unscanned: HashSet::new(),
        }
    }

    /// Builder form of [`insert_content`](Self::insert_content).
    #[must_use]
    pub fn with_content(mut self, path: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        self.insert_content(path, content);
        self
    }

    /// Record the post-change content of `path`.
    pub fn insert_content(&mut self, path: impl Into<String>, content: impl Into<Arc<str>>) {
        self.contents.insert(path.into(), content.into());
    }

    /// Content of `path`; empty when it was never fetched or fetch failed.
    #[must_use]
    pub fn content(&self, path: &str) -> &str {
        self.contents.get(path).map(|c| &**c).unwrap_or("")
    }

    /// Flag `path` as never fetched; content checks leave it out.
    pub fn mark_unscanned(&mut self, path: impl Into<String>) {
        self.unscanned.insert(path.into());
    }

    /// Whether `path` was cut off before its content was fetched.
    #[must_use]
    pub fn is_unscanned(&self, path: &str) -> bool {
        self.unscanned.contains(path)
    }

    /// Number of files flagged by [`mark_unscanned`](Self::mark_unscanned).
    #[must_use]
    pub fn unscanned_count(&self) -> usize {
        self.unscanned.len()
    }

    /// Changes that add or modify a file.
    pub fn live_changes(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|c| !c.deleted)
    }

    /// Paths of live changes with one of the given extensions.
    pub fn source_files<'a>(&'a self, extensions: &'a [String]) -> impl Iterator<Item = &'a str> {
        self.live_changes()
            .map(|c| c.path.as_str())
            .filter(move |p| heuristics::has_extension(p, extensions))
    }

    /// [`source_files`](Self::source_files) whose content was gathered.
    pub fn scannable_files<'a>(
        &'a self,
        extensions: &'a [String],
    ) -> impl Iterator<Item = &'a str> {
        self.source_files(extensions)
            .filter(move |p| !self.is_unscanned(p))
    }
}

// ============================================================================
// Bookkeeping
// ============================================================================

/// Violation collector enforcing a reporting cap.
///
/// Every violation is counted; only the first `cap` are retained and only
/// the first `listed` are rendered, followed by `... and N more`.
#[derive(Debug, Clone)]
pub struct Violations {
    cap: usize,
    listed: usize,
    total: usize,
    retained: Vec<String>,
}

impl Violations {
    /// Collector that lists everything it retains.
    #[must_use]
    pub fn capped(cap: usize) -> Self {
        Self::with_listing(cap, cap)
    }

    /// Collector retaining `cap` and listing `listed` (clamped to `cap`).
    #[must_use]
    pub fn with_listing(cap: usize, listed: usize) -> Self {
        Self {
            cap,
            listed: listed.min(cap),
            total: 0,
            retained: Vec::new(),
        }
    }

    /// Record a violation.
    pub fn push(&mut self, violation: impl Into<String>) {
        self.total += 1;
        if self.retained.len() < self.cap {
            self.retained.push(violation.into());
        }
    }

    /// Violations seen, including those beyond the cap.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Render the list with its truncation line.
    #[must_use]
    pub fn into_issues(self) -> Vec<String> {
        let listed = self.listed;
        let mut issues: Vec<String> = self.retained.into_iter().take(listed).collect();
        if self.total > listed {
            issues.push(truncation_line(self.total - listed));
        }
        issues
    }
}

/// `... and N more`
#[must_use]
pub fn truncation_line(hidden: usize) -> String {
    format!("... and {} more", hidden)
}

/// `N` when `issue` is a truncation line.
#[must_use]
pub fn truncated_count(issue: &str) -> Option<usize> {
    issue
        .strip_prefix("... and ")?
        .strip_suffix(" more")?
        .parse()
        .ok()
}

/// Files visited by a content check, independent of violations.
#[derive(Debug, Clone, Default)]
pub struct ScanTally {
    files: usize,
    examples: Vec<String>,
}

impl ScanTally {
    const EXAMPLES: usize = 5;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scanned file.
    pub fn record(&mut self, path: &str) {
        self.files += 1;
        if self.examples.len() < Self::EXAMPLES {
            self.examples.push(heuristics::basename(path).to_string());
        }
    }

    /// Number of files scanned.
    #[must_use]
    pub fn files(&self) -> usize {
        self.files
    }

    /// `checked 3 files: a.dart, b.dart, c.dart`
    #[must_use]
    pub fn describe(&self) -> String {
        if self.files == 0 {
            return "no eligible files".to_string();
        }
        let noun = if self.files == 1 { "file" } else { "files" };
        let more = if self.files > self.examples.len() { ", ..." } else { "" };
        format!(
            "checked {} {}: {}{}",
            self.files,
            noun,
            self.examples.join(", "),
            more
        )
    }
}

// ============================================================================
// Standard Registry
// ============================================================================

/// Every built-in check in registration order.
#[must_use]
pub fn standard_checks(tables: &Arc<RuleTables>, limits: &CheckLimits) -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(metadata::TitleCheck::new(Arc::clone(tables))),
        Arc::new(metadata::DescriptionCheck::new(Arc::clone(tables))),
        Arc::new(metadata::WipCommitCheck::new(Arc::clone(tables))),
        Arc::new(metadata::CommitFormatCheck::new(
            Arc::clone(tables),
            limits.commit_format,
        )),
        Arc::new(paths::SensitiveFilesCheck::new(Arc::clone(tables))),
        Arc::new(paths::NamingConventionCheck::new(Arc::clone(tables))),
        Arc::new(paths::FolderStructureCheck::new(Arc::clone(tables))),
        Arc::new(content::HardcodedStringsCheck::new(
            Arc::clone(tables),
            limits.hardcoded_strings,
            limits.hardcoded_strings_listed,
        )),
        Arc::new(content::DebugPrintCheck::new(
            Arc::clone(tables),
            limits.debug_prints,
        )),
        Arc::new(content::TodoTicketCheck::new(
            Arc::clone(tables),
            limits.todo_tickets,
        )),
        Arc::new(content::DimensionConventionCheck::new(
            Arc::clone(tables),
            limits.dimension_conventions,
        )),
        Arc::new(widgets::WidgetReplacementCheck::new(
            Arc::clone(tables),
            limits.widget_replacements,
            limits.widget_wrappers,
        )),
        Arc::new(secrets::SecretsCheck::new(Arc::clone(tables), limits.secrets)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_of() {
        let limits = CheckLimits::default();
        assert_eq!(limits.cap_of(ids::SECRETS), Some(10));
        assert_eq!(limits.cap_of(ids::HARDCODED_STRINGS), Some(15));
        assert_eq!(limits.cap_of(ids::MR_TITLE), None);
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("blocker".parse::<Severity>().is_err());
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_only_critical_blocks() {
        assert!(Severity::Critical.is_blocking());
        assert!(!Severity::Warning.is_blocking());
        assert!(!Severity::Info.is_blocking());
    }

    #[test]
    fn test_policy_covers_every_check() {
        let policy = SeverityPolicy::default();
        for id in ids::ALL {
            assert!(policy.0.contains_key(*id), "no default severity for {}", id);
        }
        assert_eq!(policy.severity_of(ids::TODO_TICKETS), Severity::Info);
        assert_eq!(policy.severity_of("unknown"), Severity::Warning);
    }

    #[test]
    fn test_policy_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert(ids::DIMENSION_CONVENTIONS.to_string(), Severity::Warning);
        let policy = SeverityPolicy::with_overrides(&overrides);
        assert_eq!(
            policy.severity_of(ids::DIMENSION_CONVENTIONS),
            Severity::Warning
        );
        assert_eq!(policy.severity_of(ids::SECRETS), Severity::Critical);
    }

    #[test]
    fn test_violations_truncation_law() {
        let mut v = Violations::capped(10);
        for i in 0..14 {
            v.push(format!("v{}", i));
        }
        assert_eq!(v.total(), 14);
        let issues = v.into_issues();
        assert_eq!(issues.len(), 11);
        assert_eq!(issues[9], "v9");
        assert_eq!(issues[10], "... and 4 more");
    }

    #[test]
    fn test_truncated_count() {
        assert_eq!(truncated_count(&truncation_line(4)), Some(4));
        assert_eq!(truncated_count("lib/a.dart:3: print(x)"), None);
        assert_eq!(truncated_count("... and many more"), None);
    }

    #[test]
    fn test_violations_listing_below_cap() {
        let mut v = Violations::with_listing(15, 10);
        for i in 0..20 {
            v.push(format!("v{}", i));
        }
        let issues = v.into_issues();
        assert_eq!(issues.len(), 11);
        assert_eq!(issues[10], "... and 10 more");
    }

    #[test]
    fn test_violations_at_cap_has_no_suffix() {
        let mut v = Violations::capped(3);
        for i in 0..3 {
            v.push(format!("v{}", i));
        }
        assert_eq!(v.into_issues().len(), 3);
    }

    #[test]
    fn test_scan_tally_describe() {
        let mut tally = ScanTally::new();
        assert_eq!(tally.describe(), "no eligible files");

        tally.record("lib/a.dart");
        assert_eq!(tally.describe(), "checked 1 file: a.dart");

        for i in 0..6 {
            tally.record(&format!("lib/f{}.dart", i));
        }
        assert_eq!(tally.files(), 7);
        assert_eq!(
            tally.describe(),
            "checked 7 files: a.dart, f0.dart, f1.dart, f2.dart, f3.dart, ..."
        );
    }

    #[test]
    fn test_context_content_lookup() {
        let ctx = CheckContext::new(
            MergeRequest::default(),
            vec![],
            vec![
                FileChange::new("lib/a.dart"),
                FileChange::deleted("lib/b.dart"),
                FileChange::new("assets/logo.png"),
            ],
        )
        .with_content("lib/a.dart", "class A {}");

        assert_eq!(ctx.content("lib/a.dart"), "class A {}");
        assert_eq!(ctx.content("lib/missing.dart"), "");
        assert_eq!(ctx.live_changes().count(), 2);

        let exts = vec!["dart".to_string()];
        let sources: Vec<_> = ctx.source_files(&exts).collect();
        assert_eq!(sources, vec!["lib/a.dart"]);
    }

    #[test]
    fn test_unscanned_files_are_not_scannable() {
        let mut ctx = CheckContext::new(
            MergeRequest::default(),
            vec![],
            vec![FileChange::new("lib/a.dart"), FileChange::new("lib/b.dart")],
        )
        .with_content("lib/a.dart", "class A {}");
        ctx.mark_unscanned("lib/b.dart");

        let exts = vec!["dart".to_string()];
        assert_eq!(ctx.source_files(&exts).count(), 2);
        let scannable: Vec<_> = ctx.scannable_files(&exts).collect();
        assert_eq!(scannable, vec!["lib/a.dart"]);
        assert!(ctx.is_unscanned("lib/b.dart"));
        assert_eq!(ctx.unscanned_count(), 1);
    }

    #[test]
    fn test_standard_checks_match_id_order() {
        let tables = Arc::new(RuleTables::standard().unwrap());
        let checks = standard_checks(&tables, &CheckLimits::default());
        let registered: Vec<_> = checks.iter().map(|c| c.id()).collect();
        assert_eq!(registered, ids::ALL);
    }

    #[test]
    fn test_finding_icons() {
        let failing = Finding {
            check_id: ids::TODO_TICKETS.into(),
            check_name: "TODO tickets".into(),
            severity: Severity::Info,
            result: CheckResult::fail("2 TODOs without ticket", vec![]),
        };
        assert_eq!(failing.status_icon(), "ℹ️");
        assert!(!failing.is_blocking_failure());
        assert_eq!(failing.summary(), "ℹ️ 2 TODOs without ticket");
    }
}
