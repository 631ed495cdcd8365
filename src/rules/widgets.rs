//! Wrapper-component enforcement.
//!
//! Baseline widgets (`ElevatedButton`, `Text`, `Image.asset`, ...) must go
//! through the project's wrappers. A file that defines a wrapper class is
//! exempt for that wrapper, since the wrapper has to build on the baseline.
//! A secondary scan flags wrappers nested inside styling containers.

use std::sync::Arc;

use super::heuristics::{
    excerpt, in_trailing_comment, inside_string_literal, is_comment_line, is_generated_file,
    is_test_file,
};
use super::tables::{WidgetRule, WrapperRule};
use super::{ids, Check, CheckContext, CheckResult, RuleTables, ScanTally, Violations};

pub struct WidgetReplacementCheck {
    tables: Arc<RuleTables>,
    cap: usize,
    wrapper_cap: usize,
}

/// Whether a match at `idx` is code rather than text or commentary.
fn is_code(line: &str, idx: usize) -> bool {
    !inside_string_literal(line, idx) && !in_trailing_comment(line, idx)
}

impl WidgetReplacementCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize, wrapper_cap: usize) -> Self {
        Self {
            tables,
            cap,
            wrapper_cap,
        }
    }

    fn scan_baselines(&self, path: &str, content: &str, violations: &mut Violations) {
        let active: Vec<&WidgetRule> = self
            .tables
            .widget_rules
            .iter()
            .filter(|rule| !rule.definition.is_match(content))
            .collect();
        if active.is_empty() {
            return;
        }

        for (idx, line) in content.lines().enumerate() {
            if is_comment_line(line) {
                continue;
            }
            for rule in &active {
                if rule.usage.find_iter(line).any(|m| is_code(line, m.start())) {
                    violations.push(format!(
                        "{}:{}: {} -> use {}",
                        path,
                        idx + 1,
                        rule.baseline,
                        rule.replacement
                    ));
                }
            }
        }
    }

    fn scan_wrappers(&self, path: &str, content: &str, violations: &mut Violations) {
        let lines: Vec<&str> = content.lines().collect();
        for rule in &self.tables.wrapper_rules {
            for (idx, line) in lines.iter().enumerate() {
                if is_comment_line(line) {
                    continue;
                }
                let Some(container) = rule.container.find(line) else {
                    continue;
                };
                if !is_code(line, container.start()) {
                    continue;
                }
                if let Some(child) = wrapped_child(rule, &lines, idx) {
                    violations.push(format!(
                        "{}:{}: {} wraps `{}`: {}",
                        path,
                        idx + 1,
                        container.as_str().trim_end_matches('('),
                        excerpt(child, 40),
                        rule.message
                    ));
                }
            }
        }
    }
}

/// The wrapped-child text within the rule's window, if any.
fn wrapped_child<'a>(rule: &WrapperRule, lines: &[&'a str], start: usize) -> Option<&'a str> {
    let end = (start + rule.window).min(lines.len().saturating_sub(1));
    (start..=end).find_map(|i| {
        let line = lines[i];
        if is_comment_line(line) {
            return None;
        }
        rule.wrapped
            .find_iter(line)
            .find(|m| is_code(line, m.start()))
            .map(|m| m.as_str())
    })
}

impl Check for WidgetReplacementCheck {
    fn id(&self) -> &'static str {
        ids::WIDGET_REPLACEMENTS
    }

    fn name(&self) -> &'static str {
        "Widget replacements"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut baselines = Violations::capped(self.cap);
        let mut wrappers = Violations::capped(self.wrapper_cap);

        for path in ctx.scannable_files(&t.source_extensions) {
            if is_generated_file(path, &t.generated_files) || is_test_file(path, &t.test_files) {
                continue;
            }
            tally.record(path);
            let content = ctx.content(path);
            self.scan_baselines(path, content, &mut baselines);
            self.scan_wrappers(path, content, &mut wrappers);
        }

        if baselines.is_empty() && wrappers.is_empty() {
            return Ok(CheckResult::pass(format!(
                "Project wrapper widgets used ({})",
                tally.describe()
            )));
        }

        let summary = format!(
            "{} baseline widget(s) instead of project wrappers, {} redundant wrapping(s) ({})",
            baselines.total(),
            wrappers.total(),
            tally.describe()
        );
        let mut issues = baselines.into_issues();
        issues.extend(wrappers.into_issues());
        Ok(CheckResult::fail(summary, issues))
    }
}
