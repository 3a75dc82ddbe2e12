//! Smoke tests for the assetscope CLI

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the assetscope binary with a clean environment
fn assetscope() -> Command {
    let mut cmd = Command::cargo_bin("assetscope").expect("assetscope binary should exist");
    for key in [
        "ASSETSCOPE_CONFIG",
        "ASSETSCOPE_USERNAME",
        "ASSETSCOPE_PASSWORD",
        "ASSETSCOPE_SERVER_URL",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    assetscope()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    assetscope()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_unknown_subcommand_fails() {
    assetscope().arg("record").assert().failure();
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_shows_scenarios() {
    assetscope()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("asset_list::displayed"))
        .stdout(predicate::str::contains("edit_asset::subtype_saved"))
        .stdout(predicate::str::contains("link_node::link_existing"));
}

#[test]
fn test_list_filter() {
    assetscope()
        .args(["list", "--filter", "connections"])
        .assert()
        .success()
        .stdout(predicate::str::contains("connections::source_required"))
        .stdout(predicate::str::contains("asset_list::").not());
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_never_prints_password() {
    assetscope()
        .arg("config")
        .env("ASSETSCOPE_USERNAME", "tech@example.com")
        .env("ASSETSCOPE_PASSWORD", "hunter2-secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("tech@example.com"))
        .stdout(predicate::str::contains("hidden"))
        .stdout(predicate::str::contains("hunter2-secret").not());
}

#[test]
fn test_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("suite.yaml");
    fs::write(&path, "max_scroll_attempts: 3\n").unwrap();

    assetscope()
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("max_scroll_attempts: 3"));
}

#[test]
fn test_config_missing_file_fails() {
    assetscope()
        .args(["config", "--config", "/nonexistent/suite.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_simulated_writes_report() {
    let dir = TempDir::new().unwrap();

    assetscope()
        .args(["--color", "never", "run", "--simulate", "--output"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED"));

    let reports: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "json"))
        .collect();
    assert_eq!(reports.len(), 1);

    let text = fs::read_to_string(reports[0].path()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["failed"], 0);
    assert_eq!(report["skipped"], 0);
}

#[test]
fn test_run_without_device_config_fails() {
    let dir = TempDir::new().unwrap();

    assetscope()
        .args(["run", "--output"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_run_unmatched_filter_fails() {
    let dir = TempDir::new().unwrap();

    assetscope()
        .args(["run", "--simulate", "--filter", "no-such-scenario", "--output"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
}
