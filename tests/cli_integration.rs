//! Integration tests for the mrgate CLI

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A Command for the mrgate binary, isolated from the caller's user config
/// and CI environment.
fn mrgate(home: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("mrgate"));
    cmd.env("XDG_CONFIG_HOME", home)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("GITLAB_TOKEN")
        .env_remove("CI_PROJECT_ID")
        .env_remove("CI_MERGE_REQUEST_IID")
        .env_remove("CI_API_V4_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn clean_snapshot() -> serde_json::Value {
    json!({
        "merge_request": {
            "title": "feat(home): add home module",
            "description": "## Description\nAdds the home module with its controller.",
            "source_branch": "feature/home"
        },
        "commits": [{ "short_id": "a1b2c3d", "title": "feat: add home" }],
        "changes": [{ "path": "lib/modules/home/controller/home_controller.dart" }],
        "files": {
            "lib/modules/home/controller/home_controller.dart":
                "class HomeController {\n  void load() {}\n}\n"
        }
    })
}

fn write_snapshot(dir: &Path, snapshot: &serde_json::Value) -> PathBuf {
    let path = dir.join("mr.json");
    std::fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
    path
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    mrgate(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Merge request quality gate"));
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    mrgate(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_scan_clean_snapshot_passes() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let snapshot = write_snapshot(project.path(), &clean_snapshot());

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("scan")
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Project MR quality check PASSED"))
        .stdout(predicate::str::contains("0 warning(s), 0 info"));
}

#[test]
fn test_scan_env_leak_fails() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let mut snapshot = clean_snapshot();
    snapshot["changes"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "path": ".env" }));
    let snapshot = write_snapshot(project.path(), &snapshot);

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("scan")
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED: 1 critical issue(s)"))
        .stdout(predicate::str::contains("Found 1 sensitive file(s)"));
}

#[test]
fn test_scan_respects_project_label_and_writes_summary() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("mrgate.toml"),
        "project_label = \"Mobile App\"\n",
    )
    .unwrap();
    let snapshot = write_snapshot(project.path(), &clean_snapshot());
    let summary = project.path().join("summary.json");

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("scan")
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("--markdown")
        .arg("--json-out")
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("## ✅ Mobile App MR Quality Check: PASSED"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(written["project"], "Mobile App");
    assert_eq!(written["verdict"]["overall_pass"], true);
    assert_eq!(written["complete"], true);
}

#[test]
fn test_severity_override_turns_failure_into_warning() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("mrgate.toml"),
        "[severity]\nsensitive_files = \"warning\"\n",
    )
    .unwrap();
    let mut snapshot = clean_snapshot();
    snapshot["changes"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "path": ".env" }));
    let snapshot = write_snapshot(project.path(), &snapshot);

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("scan")
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("1 warning(s)"));
}

#[test]
fn test_scan_missing_snapshot_is_an_error() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("scan")
        .arg("--snapshot")
        .arg(project.path().join("absent.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid snapshot"));
}

#[test]
fn test_check_lists_every_missing_setting() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GITLAB_TOKEN"))
        .stderr(predicate::str::contains("CI_PROJECT_ID"))
        .stderr(predicate::str::contains("CI_MERGE_REQUEST_IID"));
}

#[test]
fn test_rules_lists_checks_and_disabled() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("mrgate.toml"),
        "[checks]\ndisabled = [\"todo_tickets\"]\n",
    )
    .unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("sensitive_files"))
        .stdout(predicate::str::contains("critical"))
        .stdout(predicate::str::contains("cap 10"))
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn test_config_validate_default_is_ok() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("config")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid."));
}

#[test]
fn test_config_validate_reports_unknown_check() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("mrgate.toml"),
        "[checks]\ndisabled = [\"spelling\"]\n",
    )
    .unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("config")
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown check id 'spelling'"));
}

#[test]
fn test_config_show_merges_explicit_file() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let explicit = project.path().join("ci.toml");
    std::fs::write(&explicit, "[limits]\nsecrets = 3\n").unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("--config")
        .arg(&explicit)
        .arg("config")
        .arg("show")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"secrets\": 3"));
}

#[test]
fn test_missing_explicit_config_exits_two() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("--config")
        .arg(project.path().join("nope.toml"))
        .arg("rules")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_paths() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("config")
        .arg("paths")
        .assert()
        .success()
        .stdout(predicate::str::contains("mrgate.toml"))
        .stdout(predicate::str::contains(".gitlab-ci.yml"));
}

#[test]
fn test_ci_init_is_idempotent() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("ci")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let first = std::fs::read_to_string(project.path().join(".gitlab-ci.yml")).unwrap();
    assert!(first.contains("mr_quality_check:"));
    assert!(project.path().join("mrgate.toml").exists());

    mrgate(home.path())
        .arg("--project")
        .arg(project.path())
        .arg("ci")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already has the quality-check job"));

    let second = std::fs::read_to_string(project.path().join(".gitlab-ci.yml")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_nonexistent_project_directory() {
    let home = TempDir::new().unwrap();

    mrgate(home.path())
        .arg("--project")
        .arg("/nonexistent/mrgate/project")
        .arg("rules")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Project directory does not exist"));
}
