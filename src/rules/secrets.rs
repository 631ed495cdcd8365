//! Credential detection.

use std::sync::Arc;

use super::heuristics::{
    in_trailing_comment, inside_string_literal, is_comment_line, is_constant_declaration,
    is_generated_file, is_placeholder_value, is_safe_identifier, is_test_file,
};
use super::tables::SecretPattern;
use super::{ids, Check, CheckContext, CheckResult, RuleTables, ScanTally, Violations};

/// Show only the first four characters of a candidate secret.
fn redact(value: &str) -> String {
    let head: String = value.chars().take(4).collect();
    format!("{}****", head)
}

pub struct SecretsCheck {
    tables: Arc<RuleTables>,
    cap: usize,
}

impl SecretsCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize) -> Self {
        Self { tables, cap }
    }

    /// First credential-looking match on a line.
    fn detect<'p>(&'p self, line: &str) -> Option<(&'p SecretPattern, String)> {
        let t = &self.tables;
        for pattern in &t.secret_patterns {
            for caps in pattern.regex.captures_iter(line) {
                let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
                    continue;
                };
                let quoted_key = caps.name("key_quote").is_some();
                if pattern.skip_in_literal
                    && !quoted_key
                    && inside_string_literal(line, whole.start())
                {
                    continue;
                }
                if in_trailing_comment(line, whole.start())
                    || is_placeholder_value(value.as_str(), &t.secret_placeholders)
                {
                    continue;
                }
                if caps
                    .name("name")
                    .is_some_and(|n| is_safe_identifier(n.as_str(), &t.safe_identifier_suffixes))
                {
                    continue;
                }
                return Some((pattern, redact(value.as_str())));
            }
        }
        None
    }
}

impl Check for SecretsCheck {
    fn id(&self) -> &'static str {
        ids::SECRETS
    }

    fn name(&self) -> &'static str {
        "Secrets"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let t = &self.tables;
        let mut tally = ScanTally::new();
        let mut violations = Violations::capped(self.cap);

        for path in ctx.scannable_files(&t.source_extensions) {
            if is_test_file(path, &t.test_files) || is_generated_file(path, &t.generated_files) {
                continue;
            }
            tally.record(path);
            for (idx, line) in ctx.content(path).lines().enumerate() {
                if is_comment_line(line) || is_constant_declaration(line) {
                    continue;
                }
                if let Some((pattern, shown)) = self.detect(line) {
                    violations.push(format!(
                        "{}:{}: possible {} ({})",
                        path,
                        idx + 1,
                        pattern.name,
                        shown
                    ));
                }
            }
        }

        if violations.is_empty() {
            return Ok(CheckResult::pass(format!(
                "No secrets detected ({})",
                tally.describe()
            )));
        }

        Ok(CheckResult::fail(
            format!(
                "{} possible secret(s); move them to CI variables or a secure store ({})",
                violations.total(),
                tally.describe()
            ),
            violations.into_issues(),
        ))
    }
}
