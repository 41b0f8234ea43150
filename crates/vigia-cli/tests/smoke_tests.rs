//! Smoke tests for the vigia CLI
//!
//! Storefront runs use the scripted browser so no network or Chromium is
//! needed.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the vigia binary with a clean environment
fn vigia(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vigia").expect("vigia binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("VIGIA_CONFIG")
        .env_remove("RUST_LOG")
        .env("VIGIA_EVIDENCE_DIR", dir.path().join("evidence"));
    cmd
}

fn offline(dir: &TempDir) -> Command {
    let mut cmd = vigia(dir);
    cmd.env("VIGIA_BROWSER", "scripted")
        .env("VIGIA_POLL_INTERVAL_MS", "5");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    vigia(&dir).assert().failure();
}

#[test]
fn test_unknown_suite_fails() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .args(["run", "--suite", "mobile"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mobile"));
}

// ============================================================================
// list / config
// ============================================================================

#[test]
fn test_list_shows_scenarios() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("List all posts"))
        .stdout(predicate::str::contains("Place an order"));
}

#[test]
fn test_list_storefront_only() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .args(["list", "--suite", "ui"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Demoblaze storefront"))
        .stdout(predicate::str::contains("JSONPlaceholder").not());
}

#[test]
fn test_config_prints_yaml() {
    let dir = TempDir::new().unwrap();
    offline(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("api_base_url:"))
        .stdout(predicate::str::contains("browser: scripted"))
        .stdout(predicate::str::contains("poll_interval_ms: 5"));
}

#[test]
fn test_config_file_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yaml");
    fs::write(&path, "navigation_retries: 7\n").unwrap();
    vigia(&dir)
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("navigation_retries: 7"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .env("VIGIA_DEFAULT_TIMEOUT", "0")
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_storefront_offline() {
    let dir = TempDir::new().unwrap();
    offline(&dir)
        .args(["run", "--suite", "storefront"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feature: Demoblaze storefront"))
        .stdout(predicate::str::contains("8/8 passed"));
}

#[test]
fn test_run_json_report_to_file() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("reports/run.json");
    offline(&dir)
        .args(["-q", "run", "--suite", "storefront", "--tag", "smoke"])
        .args(["--format", "json", "--output"])
        .arg(&report)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    let scenarios = json["features"][0]["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 2);
    assert!(scenarios.iter().all(|s| s["status"] == "passed"));
    assert!(json["run_id"].is_string());
}

#[test]
fn test_run_failure_exits_one() {
    let dir = TempDir::new().unwrap();
    offline(&dir)
        .env("VIGIA_API_BASE_URL", "http://127.0.0.1:9")
        .args(["run", "--suite", "api", "--filter", "single post"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("0/1 passed"));
}

#[test]
fn test_blank_filter_is_usage_error() {
    let dir = TempDir::new().unwrap();
    offline(&dir)
        .args(["run", "--filter", " "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn test_missing_config_file_names_path() {
    let dir = TempDir::new().unwrap();
    vigia(&dir)
        .args(["config", "--config", "nowhere.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("nowhere.yaml"));
}
