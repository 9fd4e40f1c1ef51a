//! Integration tests for the `smartwash` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without any cloud. The end-to-end cases drive a full setup/unload cycle
//! against a wiremock SmartThings API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `smartwash` binary with env isolation.
///
/// Clears all `SMARTWASH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn smartwash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("smartwash");
    cmd.env("HOME", "/tmp/smartwash-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/smartwash-cli-test-nonexistent")
        .env_remove("SMARTWASH_CONFIG")
        .env_remove("SMARTWASH_ENTRY")
        .env_remove("SMARTWASH_LOCATION")
        .env_remove("SMARTWASH_INSTALLED_APP")
        .env_remove("SMARTWASH_TOKEN")
        .env_remove("SMARTWASH_API_URL")
        .env_remove("SMARTWASH_OUTPUT")
        .env_remove("SMARTWASH_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Mount a one-washer location with an event stream that stays quiet.
async fn mount_cloud(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .and(body_partial_json(json!({"installedAppId": "app-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub-1",
            "registrationUrl": format!("{}/sse/sub-1", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sse/sub-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/subscriptions/sub-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/locations/loc/rooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"roomId": "r1", "name": "Laundry"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"deviceId": "d1", "label": "Washer", "roomId": "r1"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/devices/d1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"components": {"main": {
            "switch": {"switch": {"value": "off"}},
            "remoteControlStatus": {"remoteControlEnabled": {"value": "true"}},
            "samsungce.washerOperatingState": {"operatingState": {"value": "ready"}}
        }}})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/scenes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(server)
        .await;
}

/// Flags that stand in for a stored entry.
fn entry_flags(server: &MockServer, config: &std::path::Path) -> Vec<String> {
    vec![
        "--config".into(),
        config.display().to_string(),
        "--location".into(),
        "loc".into(),
        "--installed-app".into(),
        "app-1".into(),
        "--token".into(),
        "pat-123".into(),
        "--api-url".into(),
        format!("{}/v1", server.uri()),
    ]
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = smartwash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    smartwash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("SmartThings")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("entities"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    smartwash_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("smartwash"));
}

#[test]
fn test_invalid_subcommand() {
    smartwash_cmd()
        .arg("dishwasher")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_set_requires_a_number() {
    smartwash_cmd()
        .args(["entities", "set", "d1.temp", "hot"])
        .assert()
        .failure()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    smartwash_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    smartwash_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("smartwash"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_no_config_fails_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let output = smartwash_cmd()
        .args(["--config", config.to_str().unwrap(), "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("Configuration file not found"),
        "Expected config hint in output:\n{text}"
    );
}

#[test]
fn test_config_path_honors_flag() {
    smartwash_cmd()
        .args(["--config", "/tmp/custom/smartwash.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom/smartwash.toml"));
}

#[test]
fn test_config_show_masks_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        r#"
default_entry = "home"

[entries.home]
location_id = "loc"
installed_app_id = "app-1"
access_token = "pat-secret"
"#,
    )
    .unwrap();

    smartwash_cmd()
        .args(["--config", config.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[entries.home]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("pat-secret").not()),
        );
}

#[test]
fn test_config_use_unknown_entry() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[entries.home]\nlocation_id = \"loc\"\ninstalled_app_id = \"app-1\"\n",
    )
    .unwrap();

    let output = smartwash_cmd()
        .args(["--config", config.to_str().unwrap(), "config", "use", "cabin"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("cabin"), "Expected entry name in output:\n{text}");
    assert!(text.contains("home"), "Expected available entries:\n{text}");
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_devices_list_json_against_mock_cloud() {
    let server = MockServer::start().await;
    mount_cloud(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = smartwash_cmd()
        .args(entry_flags(&server, &config))
        .args(["-o", "json", "devices", "list"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "devices list failed:\n{}",
        combined_output(&output)
    );

    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(devices[0]["device_id"], "d1");
    assert_eq!(devices[0]["label"], "Washer");
    assert_eq!(devices[0]["room"], "Laundry");
    // Flag-only entries are never written back.
    assert!(!config.exists());
}

#[tokio::test]
async fn test_entities_list_plain_against_mock_cloud() {
    let server = MockServer::start().await;
    mount_cloud(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = smartwash_cmd()
        .args(entry_flags(&server, &config))
        .args(["-o", "plain", "entities", "list", "--device", "Washer"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "entities list failed:\n{}",
        combined_output(&output)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("d1.start"), "Expected start button:\n{stdout}");
}

#[tokio::test]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "UnauthorizedError", "message": "token expired"}
        })))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = smartwash_cmd()
        .args(entry_flags(&server, &config))
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
