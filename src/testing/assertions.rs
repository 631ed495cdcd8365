//! Custom assertions for domain-specific testing.

use crate::rules::{CheckResult, Finding};

/// Find the finding for `check_id`.
///
/// # Panics
///
/// Panics if no finding carries that id.
pub fn finding<'a>(findings: &'a [Finding], check_id: &str) -> &'a Finding {
    findings
        .iter()
        .find(|f| f.check_id == check_id)
        .unwrap_or_else(|| panic!("no finding for check '{}'", check_id))
}

/// Assert that the check with `check_id` passed.
///
/// # Panics
///
/// Panics with the check's issues if it failed.
pub fn assert_check_passed(findings: &[Finding], check_id: &str) {
    let f = finding(findings, check_id);
    assert!(
        f.result.passed,
        "Expected check '{}' to pass, but it failed: {}\nIssues: {:?}",
        check_id,
        f.result.summary_line,
        f.result.issues
    );
}

/// Assert that the check with `check_id` failed.
///
/// # Panics
///
/// Panics if the check passed.
pub fn assert_check_failed(findings: &[Finding], check_id: &str) {
    let f = finding(findings, check_id);
    assert!(
        !f.result.passed,
        "Expected check '{}' to fail, but it passed: {}",
        check_id,
        f.result.summary_line
    );
}

/// Assert the truncation law: `listed` entries followed by
/// `... and {total - listed} more`.
///
/// # Panics
///
/// Panics if the issue list is not truncated as expected.
pub fn assert_truncated(result: &CheckResult, listed: usize, total: usize) {
    assert_eq!(
        result.issues.len(),
        listed + 1,
        "Expected {} listed issues plus a summary line, got {:?}",
        listed,
        result.issues
    );
    let expected = format!("... and {} more", total - listed);
    assert_eq!(result.issues[listed], expected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    fn sample(passed: bool) -> Vec<Finding> {
        vec![Finding {
            check_id: "mr_title".into(),
            check_name: "MR title".into(),
            severity: Severity::Critical,
            result: if passed {
                CheckResult::pass("ok")
            } else {
                CheckResult::fail("bad", vec!["a".into(), "... and 2 more".into()])
            },
        }]
    }

    #[test]
    fn test_assert_check_passed() {
        assert_check_passed(&sample(true), "mr_title");
    }

    #[test]
    #[should_panic(expected = "Expected check 'mr_title' to pass")]
    fn test_assert_check_passed_panics_on_failure() {
        assert_check_passed(&sample(false), "mr_title");
    }

    #[test]
    fn test_assert_truncated() {
        let findings = sample(false);
        assert_check_failed(&findings, "mr_title");
        assert_truncated(&findings[0].result, 1, 3);
    }

    #[test]
    #[should_panic(expected = "no finding for check 'secrets'")]
    fn test_missing_finding_panics() {
        finding(&sample(true), "secrets");
    }
}
