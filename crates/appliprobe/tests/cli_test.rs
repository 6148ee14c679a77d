//! Integration tests for the `appliprobe` CLI binary.
//!
//! Argument parsing, help output, and credential errors run without a
//! service. Session, listing, and export run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OVEN_ID: &str = "944188772-00-31862190-443E07363DAB";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `appliprobe` binary with env isolation.
///
/// Clears credential and `APPLIPROBE_*` env vars and points config lookup at
/// a nonexistent path so tests never touch the user's real configuration.
fn appliprobe_cmd(config_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("appliprobe");
    cmd.env("HOME", "/tmp/appliprobe-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/appliprobe-cli-test-nonexistent")
        .env("APPLIPROBE_CONFIG", config_dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("API_KEY")
        .env_remove("ACCESS_TOKEN")
        .env_remove("REFRESH_TOKEN")
        .env_remove("APPLIPROBE_PROFILE")
        .env_remove("APPLIPROBE_BASE_URL")
        .env_remove("APPLIPROBE_OUTPUT")
        .env_remove("APPLIPROBE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same as [`appliprobe_cmd`], wired to a mock service with dummy credentials.
fn connected_cmd(config_dir: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = appliprobe_cmd(config_dir);
    cmd.env("APPLIPROBE_BASE_URL", server.uri())
        .env("API_KEY", "test-key")
        .env("ACCESS_TOKEN", "at-1")
        .env("REFRESH_TOKEN", "rt-1");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn appliance_path(suffix: &str) -> String {
    format!("/api/v1/appliances/{OVEN_ID}/{suffix}")
}

async fn oven_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/appliances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "applianceId": OVEN_ID,
                "connectionState": "Connected",
                "applianceData": { "applianceName": "My Oven", "modelName": "" }
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(appliance_path("info")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "applianceInfo": { "brand": "Electrolux" },
            "capabilities": {
                "cavityLight": { "access": "readwrite", "type": "boolean" },
                "targetTemperatureC": {
                    "access": "readwrite", "type": "temperature",
                    "min": 30, "max": 250, "step": 5
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(appliance_path("state")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "applianceId": OVEN_ID,
            "connectionState": "Connected",
            "properties": { "reported": { "cavityLight": false, "applianceState": "IDLE" } }
        })))
        .mount(&server)
        .await;

    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    appliprobe_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("appliances")
                .and(predicate::str::contains("session"))
                .and(predicate::str::contains("export")),
        );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    appliprobe_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("appliprobe"));
}

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    appliprobe_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let output = appliprobe_cmd(dir.path())
        .args(["--output", "xml", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("xml"), "Expected the bad value echoed:\n{text}");
}

#[test]
fn test_export_requires_target_or_all() {
    let dir = tempfile::tempdir().unwrap();
    let output = appliprobe_cmd(dir.path()).arg("export").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().join("config.toml").display().to_string();
    appliprobe_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[test]
fn test_config_show_redacts_secrets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "default_profile = \"home\"\n\n[profiles.home]\napi_key = \"super-secret\"\n",
    )
    .unwrap();

    appliprobe_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.home]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("super-secret").not()),
        );
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn test_missing_credentials_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = appliprobe_cmd(dir.path())
        .args(["--base-url", "http://127.0.0.1:9", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(text.contains("API_KEY"), "Expected env var hint:\n{text}");
}

// ── Against a mock service ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json() {
    let server = oven_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = connected_cmd(dir.path(), &server);
    cmd.args(["--output", "json", "list"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["index"], 1);
    assert_eq!(listed[0]["appliance_id"], OVEN_ID);
    assert_eq!(listed[0]["display_name"], "My Oven");
    assert_eq!(listed[0]["resolved_model"], "944188772");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_account_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/appliances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = connected_cmd(dir.path(), &server);
    cmd.arg("list");
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("No appliances"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_piped_session() {
    let server = oven_server().await;
    Mock::given(method("PUT"))
        .and(path(appliance_path("command")))
        .and(body_json(json!({ "cavityLight": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = connected_cmd(dir.path(), &server);
    cmd.write_stdin("1\nstate\n{\"cavityLight\": true}\n{bad\nquit\n");
    let output = run_blocking(cmd).await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(stdout.contains("Session: My Oven"), "{stdout}");
    assert!(stdout.contains("Brand: Electrolux  Model: 944188772"), "{stdout}");
    assert!(stdout.contains("Capabilities: 2 (2 writable)"), "{stdout}");
    assert!(stdout.contains("\"applianceState\": \"IDLE\""), "{stdout}");
    assert!(stdout.contains("#1 accepted"), "{stdout}");
    assert!(stdout.contains("Invalid command JSON"), "{stdout}");
    assert!(stdout.contains("[2]> "), "parse errors keep the counter:\n{stdout}");
    assert!(!stdout.contains("[3]> "), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_ends_cleanly_on_eof_at_picker() {
    let server = oven_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = connected_cmd(dir.path(), &server);
    cmd.arg("session").write_stdin("7\n");
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Invalid selection '7'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_writes_artifact() {
    let server = oven_server().await;
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("exports");

    let mut cmd = connected_cmd(dir.path(), &server);
    cmd.args(["--output", "plain", "export", "1", "--dir"])
        .arg(&out_dir);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let artifact = std::fs::read_to_string(out_dir.join("944188772.txt")).unwrap();
    assert!(artifact.starts_with("Appliance: My Oven\n"));
    assert!(artifact.contains("Brand: Electrolux\nModel: 944188772\n"));
    assert!(artifact.contains("Capabilities: 2 (2 writable)"));
    assert!(artifact.contains("--- STATE ---"));
    assert!(artifact.contains("--- CAPABILITIES ---"));
}
