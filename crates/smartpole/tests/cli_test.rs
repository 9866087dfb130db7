//! Integration tests for the `smartpole` CLI binary.
//!
//! Each test points the binary at its own config file and a fixed cipher
//! key, so nothing touches the user's real configuration or keyring.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CIPHER_KEY: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

// ── Helpers ─────────────────────────────────────────────────────────

fn smartpole_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("smartpole");
    cmd.env("HOME", "/tmp/smartpole-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/smartpole-cli-test-nonexistent")
        .env("SMARTPOLE_CONFIG", config)
        .env("SMARTPOLE_CIPHER_KEY", CIPHER_KEY)
        .env_remove("SMARTPOLE_CONNECTION__ENDPOINT")
        .env_remove("SMARTPOLE_CONNECTION__USERNAME")
        .env_remove("SMARTPOLE_CONNECTION__PASSWORD")
        .env_remove("SMARTPOLE_CONNECTION__TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn init(config: &Path, endpoint: &str) {
    smartpole_cmd(config)
        .args(["config", "init", "--endpoint", endpoint])
        .args(["--username", "operator", "--timeout", "5", "--password-stdin"])
        .write_stdin("s3cret\n")
        .assert()
        .success();
}

async fn console() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/doggoconsole/Authentication/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "",
            "authHeader": {
                "token": "tok",
                "assets": [{ "assetId": 12, "name": "North Pole" }]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doggoconsole/SmartPole/GetDeviceListByAsset"))
        .and(query_param("assetId", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "",
            "devices": [
                { "deviceId": 301, "deviceName": "Air Sensor" },
                { "deviceId": 302, "deviceName": "pH Probe" }
            ]
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = smartpole_cmd(&dir.path().join("config.toml")).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    smartpole_cmd(&dir.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("sync")
                .and(predicate::str::contains("test-connection"))
                .and(predicate::str::contains("watch")),
        );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    smartpole_cmd(&dir.path().join("config.toml"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("smartpole"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_without_file_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    smartpole_cmd(&dir.path().join("config.toml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs = 30"));
}

#[test]
fn test_config_init_stores_encrypted_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, "https://console.example.com");

    let raw = std::fs::read_to_string(&config).unwrap();
    assert!(raw.contains("https://console.example.com"));
    assert!(!raw.contains("s3cret"));

    let output = smartpole_cmd(&config)
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["connection"]["password"], "****");
    assert_eq!(shown["connection"]["timeout_secs"], 5);
}

#[test]
fn test_config_init_rejects_relative_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = smartpole_cmd(&config)
        .args(["config", "init", "--endpoint", "console.local"])
        .args(["--username", "operator", "--password-stdin"])
        .write_stdin("s3cret\n")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!config.exists());
}

#[test]
fn test_config_init_rejects_empty_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    smartpole_cmd(&config)
        .args(["config", "init", "--endpoint", "https://console.example.com"])
        .args(["--username", "operator", "--password-stdin"])
        .write_stdin("\n")
        .assert()
        .code(2);
    assert!(!config.exists());
}

#[test]
fn test_config_set_keeps_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, "https://console.example.com");
    let before = std::fs::read_to_string(&config).unwrap();

    smartpole_cmd(&config)
        .args(["config", "set", "--timeout", "60", "--insecure", "true"])
        .assert()
        .success();

    let after = std::fs::read_to_string(&config).unwrap();
    assert!(after.contains("timeout_secs = 60"));
    assert!(after.contains("insecure = true"));
    let password_line = |s: &str| s.lines().find(|l| l.starts_with("password")).map(str::to_owned);
    assert_eq!(password_line(&before), password_line(&after));
}

#[test]
fn test_wrong_cipher_key_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, "https://console.example.com");

    smartpole_cmd(&config)
        .env("SMARTPOLE_CIPHER_KEY", "c2hvcnQ=")
        .args(["read", "air"])
        .assert()
        .code(2);
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_read_without_config_exits_with_usage_code() {
    let dir = tempfile::tempdir().unwrap();
    smartpole_cmd(&dir.path().join("config.toml"))
        .args(["read", "air"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_unknown_asset_exits_with_not_found_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, "https://console.example.com");

    smartpole_cmd(&config)
        .args(["asset", "enable", "99"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_invalid_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let output = smartpole_cmd(&dir.path().join("config.toml"))
        .args(["--output", "yaml", "assets"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("yaml"));
}

// ── Against a mock console ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_then_toggle_then_read() {
    let server = console().await;
    Mock::given(method("GET"))
        .and(path("/doggoconsole/TBData/GetAirSensorDataByDeviceId"))
        .and(query_param("deviceId", "301"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "co": 1, "no2": 2, "so2": 3, "humidity": 40, "temperature": 25
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, &server.uri());

    smartpole_cmd(&config)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully synced 1 assets with 2 total devices",
        ));

    smartpole_cmd(&config)
        .arg("assets")
        .assert()
        .success()
        .stdout(predicate::str::contains("North Pole"));

    smartpole_cmd(&config)
        .args(["device", "disable", "12", "302"])
        .assert()
        .success();
    smartpole_cmd(&config)
        .args(["devices", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Air Sensor").and(predicate::str::contains("pH Probe").not()));

    let output = smartpole_cmd(&config)
        .args(["-o", "json", "read", "air"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let latest: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(latest["stale"], false);
    assert_eq!(latest["data"]["metrics"]["co"], 1.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_test_connection_reports_assets() {
    let server = console().await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, &server.uri());

    smartpole_cmd(&config)
        .arg("test-connection")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assets visible: 1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/doggoconsole/Authentication/Login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, &server.uri());

    smartpole_cmd(&config)
        .arg("sync")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn test_watch_stops_after_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    init(&config, "https://console.example.com");

    // No assets configured: every poll degrades without a request.
    smartpole_cmd(&config)
        .args(["watch", "air", "--interval-ms", "10", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no enabled asset").count(2));
}
