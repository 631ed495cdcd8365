//! Checks over MR metadata and the commit list.
//!
//! These need no file content and run on data fetched up front.

use std::sync::Arc;

use super::heuristics::{excerpt, is_wip};
use super::{ids, Check, CheckContext, CheckResult, RuleTables, Violations};

/// MR title must follow the conventional-commit grammar.
pub struct TitleCheck {
    tables: Arc<RuleTables>,
}

impl TitleCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl Check for TitleCheck {
    fn id(&self) -> &'static str {
        ids::MR_TITLE
    }

    fn name(&self) -> &'static str {
        "MR title"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let title = ctx.merge_request.title.trim();
        if self.tables.conventional_title.is_match(title) {
            return Ok(CheckResult::pass("MR title follows conventional format"));
        }

        Ok(CheckResult::fail(
            "MR title does not follow conventional format",
            vec![
                format!("Current title: \"{}\"", excerpt(title, 80)),
                "Expected: type(scope): description".to_string(),
                "Example: feat(login): add forgot password".to_string(),
            ],
        ))
    }
}

/// MR description must have some substance; the template is suggested.
pub struct DescriptionCheck {
    tables: Arc<RuleTables>,
}

impl DescriptionCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl Check for DescriptionCheck {
    fn id(&self) -> &'static str {
        ids::MR_DESCRIPTION
    }

    fn name(&self) -> &'static str {
        "MR description"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let description = &ctx.merge_request.description;
        let length = description.chars().count();
        let min = self.tables.description_min_len;

        if length < min {
            return Ok(CheckResult::fail(
                format!(
                    "MR description is too short ({} characters, minimum {})",
                    length, min
                ),
                vec![format!(
                    "Describe what changed and why; use the template sections: {}",
                    self.tables.description_markers.join(", ")
                )],
            ));
        }

        let templated = self
            .tables
            .description_markers
            .iter()
            .any(|m| description.contains(m.as_str()));
        let result = CheckResult::pass("MR description provided");
        if templated {
            Ok(result)
        } else {
            Ok(result.with_issues(vec![format!(
                "Consider using the MR template ({})",
                self.tables.description_markers.join(", ")
            )]))
        }
    }
}

/// No commit may be marked work-in-progress.
pub struct WipCommitCheck {
    tables: Arc<RuleTables>,
}

impl WipCommitCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl Check for WipCommitCheck {
    fn id(&self) -> &'static str {
        ids::WIP_COMMITS
    }

    fn name(&self) -> &'static str {
        "WIP commits"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let prefixes = &self.tables.wip_prefixes;
        let offenders: Vec<String> = ctx
            .commits
            .iter()
            .filter(|c| is_wip(&c.title, prefixes) || is_wip(&c.message, prefixes))
            .map(|c| format!("{}: {}", c.short_id, excerpt(&c.title, 72)))
            .collect();

        if offenders.is_empty() {
            return Ok(CheckResult::pass("No WIP commits"));
        }

        Ok(CheckResult::fail(
            format!("Found {} WIP commit(s); squash or reword them", offenders.len()),
            offenders,
        ))
    }
}

/// Every commit title must follow the conventional-commit grammar.
pub struct CommitFormatCheck {
    tables: Arc<RuleTables>,
    cap: usize,
}

impl CommitFormatCheck {
    pub fn new(tables: Arc<RuleTables>, cap: usize) -> Self {
        Self { tables, cap }
    }
}

impl Check for CommitFormatCheck {
    fn id(&self) -> &'static str {
        ids::COMMIT_FORMAT
    }

    fn name(&self) -> &'static str {
        "Commit format"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let mut violations = Violations::capped(self.cap);
        for commit in &ctx.commits {
            if !self.tables.conventional_title.is_match(commit.title.trim()) {
                violations.push(format!(
                    "{}: {}",
                    commit.short_id,
                    excerpt(&commit.title, 72)
                ));
            }
        }

        let total = ctx.commits.len();
        if violations.is_empty() {
            return Ok(CheckResult::pass(format!(
                "All {} commit(s) follow conventional format",
                total
            )));
        }

        Ok(CheckResult::fail(
            format!(
                "{} of {} commit(s) do not follow conventional format",
                violations.total(),
                total
            ),
            violations.into_issues(),
        ))
    }
}
