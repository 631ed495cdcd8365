//! Checks over changed-file paths. Deleted files are ignored.

use std::sync::Arc;

use super::heuristics::{basename, dir_segments, stem};
use super::tables::LayerRule;
use super::{ids, Check, CheckContext, CheckResult, RuleTables, ScanTally};

/// Forbidden basenames and sensitive path patterns.
pub struct SensitiveFilesCheck {
    tables: Arc<RuleTables>,
}

impl SensitiveFilesCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    fn classify(&self, path: &str) -> Option<&'static str> {
        let name = basename(path);
        if self.tables.forbidden_files.iter().any(|f| f == name) {
            Some("forbidden file")
        } else if self.tables.sensitive_patterns.iter().any(|p| p.is_match(path)) {
            Some("matches a sensitive pattern")
        } else {
            None
        }
    }
}

impl Check for SensitiveFilesCheck {
    fn id(&self) -> &'static str {
        ids::SENSITIVE_FILES
    }

    fn name(&self) -> &'static str {
        "Sensitive files"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let mut tally = ScanTally::new();
        let mut issues = Vec::new();

        for change in ctx.live_changes() {
            tally.record(&change.path);
            if let Some(reason) = self.classify(&change.path) {
                issues.push(format!("{} ({})", change.path, reason));
            }
        }

        if issues.is_empty() {
            return Ok(CheckResult::pass(format!(
                "No sensitive files ({})",
                tally.describe()
            )));
        }

        Ok(CheckResult::fail(
            format!(
                "Found {} sensitive file(s); remove them and rotate any exposed credentials",
                issues.len()
            ),
            issues,
        ))
    }
}

fn in_folder(path: &str, rule: &LayerRule) -> bool {
    dir_segments(path).any(|seg| seg == rule.folder)
}

fn has_suffix(path: &str, rule: &LayerRule) -> bool {
    stem(path).ends_with(rule.suffix.as_str())
}

/// Files inside a layer folder must carry that layer's suffix.
pub struct NamingConventionCheck {
    tables: Arc<RuleTables>,
}

impl NamingConventionCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl Check for NamingConventionCheck {
    fn id(&self) -> &'static str {
        ids::NAMING_CONVENTION
    }

    fn name(&self) -> &'static str {
        "Naming convention"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let mut tally = ScanTally::new();
        let mut issues = Vec::new();

        for path in ctx.source_files(&self.tables.source_extensions) {
            tally.record(path);
            for rule in &self.tables.layer_rules {
                if in_folder(path, rule) && !has_suffix(path, rule) {
                    issues.push(format!(
                        "{}: files in {}/ must be named *{}.*",
                        path, rule.folder, rule.suffix
                    ));
                }
            }
        }

        if issues.is_empty() {
            return Ok(CheckResult::pass(format!(
                "File names follow conventions ({})",
                tally.describe()
            )));
        }

        Ok(CheckResult::fail(
            format!("{} file(s) violate naming conventions", issues.len()),
            issues,
        ))
    }
}

/// Files carrying a layer suffix must live in that layer's folder.
pub struct FolderStructureCheck {
    tables: Arc<RuleTables>,
}

impl FolderStructureCheck {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl Check for FolderStructureCheck {
    fn id(&self) -> &'static str {
        ids::FOLDER_STRUCTURE
    }

    fn name(&self) -> &'static str {
        "Folder structure"
    }

    fn evaluate(&self, ctx: &CheckContext) -> anyhow::Result<CheckResult> {
        let mut tally = ScanTally::new();
        let mut issues = Vec::new();

        for path in ctx.source_files(&self.tables.source_extensions) {
            tally.record(path);
            for rule in &self.tables.layer_rules {
                if has_suffix(path, rule) && !in_folder(path, rule) {
                    issues.push(format!(
                        "{}: *{} files belong under a {}/ folder",
                        path, rule.suffix, rule.folder
                    ));
                }
            }
        }

        if issues.is_empty() {
            return Ok(CheckResult::pass(format!(
                "Folder structure is correct ({})",
                tally.describe()
            )));
        }

        Ok(CheckResult::fail(
            format!("{} file(s) are in the wrong folder", issues.len()),
            issues,
        ))
    }
}
