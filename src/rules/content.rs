//! Line scans over changed-file content.

use std::collections::HashSet;
use std::sync::Arc;

use super::heuristics::{
    enclosing_call, excerpt, has_dynamic_marker, has_interpolation, has_ticket_reference,
    in_trailing_comment, inside_string_literal, is_comment_line, is_escape_only,
    is_generated_file, is_test_file, is_ui_file, is_zero_literal,
};
use super::tables::DimensionRule;
use super::{ids, Check, CheckContext, CheckResult, RuleTables, ScanTally, Violations};

const EXCERPT_LEN: usize = 80;

/// Preceding lines searched for the call enclosing a dimension argument.
const CALL_LOOKBACK: usize = 6;

/// Fetched source files a content check reads, minus the ones `skip` rejects.
fn eligible<'a>(
    ctx: &'a CheckContext,
    tables: &'a RuleTables,
    skip: impl Fn(&str) -> bool + 'a,
) -> impl Iterator<Item = &'a str> {
    ctx.scannable_files(&tables.source_extensions)
        .filter(move |p| !skip(p))
}

fn conclude(
    violations: Violations,
    tally: &ScanTally,
    pass_line: &str,
    fail_label: &str,
) -> CheckResult {
    if violations.is_empty() {
        return CheckResult::pass(format!("{} ({})", pass_line, tally.describe()));
    }
    CheckResult::fail(
        format!("{} {} ({})", violations.total(), fail_label, tally.describe()),
        violations.into_issues(),
    )
}

// ============================================================================
// Hardcoded strings
// ============================================================================

/// User-facing literals in UI construction calls.
pub struct HardcodedStringsCheck {
    tables: Arc<RuleTables>,
    cap: usize,
    listed: usize,
}

impl HardcodedStringsCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize, listed: usize) -> Self {
        Self {
            tables,
            cap,
            listed,
        }
    }

    fn scan(&self, path: &str, content: &str, violations: &mut Violations) {
        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line) {
                continue;
            }
            let mut seen = HashSet::new();
            for pattern in &self.tables.hardcoded_patterns {
                for caps in pattern.captures_iter(line) {
                    let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
                        continue;
                    };
                    if !seen.insert(value.start())
                        || in_trailing_comment(line, whole.start())
                        || inside_string_literal(line, whole.start())
                    {
                        continue;
                    }
                    self.consider(path, &lines, idx, idx, value.as_str(), violations);
                }
            }
            self.scan_wrapped(path, &lines, idx, violations);
        }
    }

    /// `AppText(` closing a line, with its literal on the next non-blank line.
    fn scan_wrapped(&self, path: &str, lines: &[&str], idx: usize, violations: &mut Violations) {
        let line = lines[idx];
        let opened = self.tables.hardcoded_open_patterns.iter().any(|p| {
            p.find(line).is_some_and(|m| {
                !in_trailing_comment(line, m.start()) && !inside_string_literal(line, m.start())
            })
        });
        if !opened {
            return;
        }
        let Some(next) = (idx + 1..lines.len()).find(|&i| !lines[i].trim().is_empty()) else {
            return;
        };
        let literal = self
            .tables
            .leading_literal_patterns
            .iter()
            .find_map(|p| p.captures(lines[next]))
            .and_then(|c| c.name("value"));
        if let Some(value) = literal {
            self.consider(path, lines, idx, next, value.as_str(), violations);
        }
    }

    /// Record `text` found on line `at` unless it is dynamic or not prose.
    fn consider(
        &self,
        path: &str,
        lines: &[&str],
        opened_at: usize,
        at: usize,
        text: &str,
        violations: &mut Violations,
    ) {
        let markers = &self.tables.dynamic_markers;
        if has_interpolation(text)
            || is_escape_only(text)
            || has_dynamic_marker(lines, at, markers)
            || has_dynamic_marker(lines, opened_at, markers)
        {
            return;
        }
        violations.push(format!(
            "{}:{}: \"{}\"",
            path,
            at + 1,
            excerpt(text, EXCERPT_LEN)
        ));
    }
}

impl Check for HardcodedStringsCheck {
    fn id(&self) -> &'static str {
        ids::HARDCODED_STRINGS
    }

    fn name(&self) -> &'static str {
        "Hardcoded strings"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut violations = Violations::with_listing(self.cap, self.listed);

        let files = eligible(ctx, t, |p| {
            !is_ui_file(p, &t.ui_segments, &t.ui_suffixes)
                || is_generated_file(p, &t.generated_files)
                || is_test_file(p, &t.test_files)
        });
        for path in files {
            tally.record(path);
            self.scan(path, ctx.content(path), &mut violations);
        }

        Ok(conclude(
            violations,
            &tally,
            "No hardcoded UI strings",
            "hardcoded UI string(s); move them to localization",
        ))
    }
}

// ============================================================================
// Debug prints
// ============================================================================

/// Console print calls left in shipped code.
pub struct DebugPrintCheck {
    tables: Arc<RuleTables>,
    cap: usize,
}

impl DebugPrintCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize) -> Self {
        Self { tables, cap }
    }
}

impl Check for DebugPrintCheck {
    fn id(&self) -> &'static str {
        ids::DEBUG_PRINTS
    }

    fn name(&self) -> &'static str {
        "Debug prints"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut violations = Violations::capped(self.cap);

        let files = eligible(ctx, t, |p| {
            is_generated_file(p, &t.generated_files) || is_test_file(p, &t.test_files)
        });
        for path in files {
            tally.record(path);
            for (idx, line) in ctx.content(path).lines().enumerate() {
                if is_comment_line(line) {
                    continue;
                }
                let hit = t.debug_patterns.iter().any(|p| {
                    p.find_iter(line).any(|m| {
                        !inside_string_literal(line, m.start())
                            && !in_trailing_comment(line, m.start())
                    })
                });
                if hit {
                    violations.push(format!(
                        "{}:{}: {}",
                        path,
                        idx + 1,
                        excerpt(line, EXCERPT_LEN)
                    ));
                }
            }
        }

        Ok(conclude(
            violations,
            &tally,
            "No debug prints",
            "debug print(s); use the app logger",
        ))
    }
}

// ============================================================================
// TODO tickets
// ============================================================================

/// `// TODO` comments must reference a ticket.
pub struct TodoTicketCheck {
    tables: Arc<RuleTables>,
    cap: usize,
}

impl TodoTicketCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize) -> Self {
        Self { tables, cap }
    }
}

impl Check for TodoTicketCheck {
    fn id(&self) -> &'static str {
        ids::TODO_TICKETS
    }

    fn name(&self) -> &'static str {
        "TODO tickets"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut violations = Violations::capped(self.cap);

        for path in eligible(ctx, t, |p| is_generated_file(p, &t.generated_files)) {
            tally.record(path);
            for (idx, line) in ctx.content(path).lines().enumerate() {
                let Some(caps) = t.todo_pattern.captures(line) else {
                    continue;
                };
                let (Some(whole), Some(rest)) = (caps.get(0), caps.name("rest")) else {
                    continue;
                };
                if inside_string_literal(line, whole.start()) {
                    continue;
                }
                if !has_ticket_reference(rest.as_str(), &t.ticket_pattern) {
                    violations.push(format!(
                        "{}:{}: {}",
                        path,
                        idx + 1,
                        excerpt(line, EXCERPT_LEN)
                    ));
                }
            }
        }

        Ok(conclude(
            violations,
            &tally,
            "All TODOs reference a ticket",
            "TODO(s) without a ticket reference (e.g. // TODO(APP-123): ...)",
        ))
    }
}

// ============================================================================
// Dimension conventions
// ============================================================================

/// Whether the match at `offset` of line `idx` is an argument of one of the
/// rule's exempt calls, looking back up to [`CALL_LOOKBACK`] lines.
fn in_exempt_call(rule: &DimensionRule, lines: &[&str], idx: usize, offset: usize) -> bool {
    if rule.exempt_calls.is_empty() {
        return false;
    }
    let mut before = lines[idx.saturating_sub(CALL_LOOKBACK)..idx].join("\n");
    before.push('\n');
    before.push_str(&lines[idx][..offset]);
    enclosing_call(&before).is_some_and(|call| rule.exempt_calls.iter().any(|c| c == call))
}

/// Layout literals must use the scaling-suffix convention.
pub struct DimensionConventionCheck {
    tables: Arc<RuleTables>,
    cap: usize,
}

impl DimensionConventionCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize) -> Self {
        Self { tables, cap }
    }
}

impl Check for DimensionConventionCheck {
    fn id(&self) -> &'static str {
        ids::DIMENSION_CONVENTIONS
    }

    fn name(&self) -> &'static str {
        "Dimension conventions"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut violations = Violations::capped(self.cap);

        for path in eligible(ctx, t, |p| is_generated_file(p, &t.generated_files)) {
            tally.record(path);
            let lines: Vec<&str> = ctx.content(path).lines().collect();
            for (idx, line) in lines.iter().enumerate() {
                if is_comment_line(line) {
                    continue;
                }
                for rule in &t.dimension_rules {
                    for caps in rule.pattern.captures_iter(line) {
                        let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
                            continue;
                        };
                        if is_zero_literal(value.as_str())
                            || inside_string_literal(line, whole.start())
                            || in_trailing_comment(line, whole.start())
                            || in_exempt_call(rule, &lines, idx, whole.start())
                        {
                            continue;
                        }
                        let accepted = caps.name("suffix").is_some_and(|s| {
                            rule.accepted_suffixes.iter().any(|a| a == s.as_str())
                        });
                        if !accepted {
                            violations.push(format!(
                                "{}:{}: `{}` - {}",
                                path,
                                idx + 1,
                                whole.as_str().trim(),
                                rule.suggestion
                            ));
                        }
                    }
                }
            }
        }

        Ok(conclude(
            violations,
            &tally,
            "Dimensions use scaling suffixes",
            "hardcoded dimension(s) without a scaling suffix",
        ))
    }
}
