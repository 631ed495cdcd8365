//! Severity aggregation.

use serde::{Deserialize, Serialize};

use crate::rules::{Finding, Severity};

/// Final pass/fail decision for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub critical_failures: usize,
    pub warnings: usize,
    pub info_issues: usize,
    pub overall_pass: bool,
}

impl Verdict {
    /// Reduce findings to a verdict. Only critical failures block.
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        let failed = |severity: Severity| {
            findings
                .iter()
                .filter(|f| f.severity == severity && !f.result.passed)
                .count()
        };
        let critical_failures = failed(Severity::Critical);
        Self {
            critical_failures,
            warnings: failed(Severity::Warning),
            info_issues: failed(Severity::Info),
            overall_pass: critical_failures == 0,
        }
    }

    /// Process exit status for CI: 0 iff the run passed.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.overall_pass {
            0
        } else {
            1
        }
    }
}
