//! Integration tests for the `farmsync` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! error handling, and one full refresh against a mock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `farmsync` binary with env isolation.
///
/// Clears all `FARMSYNC_*` env vars and points config and data
/// directories at a nonexistent path so tests never touch the user's
/// real configuration.
fn farmsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("farmsync");
    cmd.env("HOME", "/tmp/farmsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/farmsync-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/farmsync-cli-test-nonexistent")
        .env_remove("FARMSYNC_CONFIG")
        .env_remove("FARMSYNC_PROFILE")
        .env_remove("FARMSYNC_SERVER")
        .env_remove("FARMSYNC_EMAIL")
        .env_remove("FARMSYNC_PASSWORD")
        .env_remove("FARMSYNC_DATABASE")
        .env_remove("FARMSYNC_OUTPUT")
        .env_remove("FARMSYNC_INSECURE")
        .env_remove("FARMSYNC_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same as [`farmsync_cmd`], with the config file at `config`.
fn farmsync_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = farmsync_cmd();
    cmd.env("FARMSYNC_CONFIG", config);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = farmsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    farmsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("farm")
            .and(predicate::str::contains("farms"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    farmsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("farmsync"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    farmsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    farmsync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("farmsync"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = farmsync_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_refresh_without_config_fails_with_usage_code() {
    let output = farmsync_cmd().args(["farms", "refresh"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("Configuration") || text.contains("config init"),
        "Expected a missing-config diagnostic:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    farmsync_with_config(&dir.path().join("config.toml"))
        .args(["--profile", "ghost", "farms", "refresh"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_server_without_credentials_fails_as_auth() {
    farmsync_cmd()
        .args(["--server", "https://api.pestscout.test", "farms", "refresh"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("credentials"));
}

#[test]
fn test_invalid_output_format() {
    let output = farmsync_cmd()
        .args(["--output", "invalid", "farms", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Local store ─────────────────────────────────────────────────────

#[test]
fn test_list_on_fresh_database_is_empty_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("farms.db");

    farmsync_cmd()
        .args(["--output", "json-compact", "farms", "list", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
    assert!(db.exists());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    farmsync_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_set_then_show_masks_nothing_it_does_not_have() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    farmsync_with_config(&config)
        .args(["config", "set", "server", "https://api.pestscout.test"])
        .assert()
        .success();
    farmsync_with_config(&config)
        .args(["config", "set", "write_mode", "mirror"])
        .assert()
        .success();

    farmsync_with_config(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("write_mode = \"mirror\""))
                .and(predicate::str::contains("password").not()),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    farmsync_with_config(&dir.path().join("config.toml"))
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_subcommands_exist() {
    farmsync_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles"))
                .and(predicate::str::contains("set-password")),
        );
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_against_mock_server_then_list_offline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "grower@example.com",
            "password": "s3cret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "access-1",
            "refreshToken": "refresh-1",
            "expiresIn": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/farms"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 2, "name": "Ridge Farm", "licensedArea": 12.5, "updatedAt": "2024-05-01T09:00:00Z" },
            { "id": 1, "name": "Creek Farm", "updatedAt": "2024-05-02T09:00:00Z" },
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("farms.db");
    let uri = server.uri();

    let refreshed = tokio::task::spawn_blocking({
        let db = db.clone();
        move || {
            farmsync_cmd()
                .env("FARMSYNC_PASSWORD", "s3cret")
                .args(["--quiet", "--server", &uri, "--email", "grower@example.com"])
                .args(["farms", "refresh", "--database"])
                .arg(&db)
                .output()
                .unwrap()
        }
    })
    .await
    .unwrap();
    assert!(
        refreshed.status.success(),
        "refresh failed:\n{}",
        combined_output(&refreshed)
    );

    let listed = tokio::task::spawn_blocking(move || {
        farmsync_cmd()
            .args(["--output", "plain", "farms", "list", "--database"])
            .arg(&db)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(listed.status.success());
    assert_eq!(String::from_utf8_lossy(&listed.stdout), "1\n2\n");
}
