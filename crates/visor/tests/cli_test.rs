//! Integration tests for the `visor` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a backend; endpoint commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `visor` binary with env isolation.
///
/// Clears all `VISOR_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn visor_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("visor");
    cmd.env("HOME", "/tmp/visor-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/visor-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("VISOR_URL")
        .env_remove("VISOR_CONFIG")
        .env_remove("VISOR_OUTPUT")
        .env_remove("VISOR_INSECURE")
        .env_remove("VISOR_TIMEOUT")
        .env_remove("VISOR_BACKEND__BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = visor_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    visor_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("vision-inference backend")
            .and(predicate::str::contains("detections"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    visor_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("visor"));
}

#[test]
fn test_completions_zsh() {
    visor_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_face_subcommands_exist() {
    visor_cmd().args(["face", "--help"]).assert().success().stdout(
        predicate::str::contains("register")
            .and(predicate::str::contains("recognize"))
            .and(predicate::str::contains("last")),
    );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = visor_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_url_is_usage_error() {
    let output = visor_cmd()
        .args(["--url", "not a url", "health"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("backend.base_url"));
}

#[test]
fn test_unreachable_backend_is_connection_error() {
    let output = visor_cmd()
        .args(["--url", "http://127.0.0.1:9", "--timeout", "2", "health"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("health_failed"));
}

#[test]
fn test_empty_face_name_is_rejected_locally() {
    // Port 9 is never contacted: the name is checked first.
    let output = visor_cmd()
        .args(["--url", "http://127.0.0.1:9", "face", "register", "  "])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("name_required"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    visor_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://localhost:8000")
                .and(predicate::str::contains("detections_ms = 800")),
        );
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let file_arg = file.to_str().unwrap();

    visor_cmd()
        .args(["--config", file_arg, "config", "init", "--url", "http://10.1.2.3:8000"])
        .assert()
        .success();
    assert!(file.exists());

    visor_cmd()
        .args(["--config", file_arg, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://10.1.2.3:8000"));

    // A second init refuses to clobber the file.
    let output = visor_cmd()
        .args(["--config", file_arg, "config", "init"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_invalid_threshold_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[auth]\nthreshold = 2.0\n").unwrap();

    let output = visor_cmd()
        .args(["--config", file.to_str().unwrap(), "config", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("auth.threshold"));
}

// ── Endpoint commands ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_health_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ok(json!({"ok": true, "camera": true, "model": false, "uploader": true})))
        .expect(1)
        .mount(&server)
        .await;

    let output = visor_cmd()
        .args(["--url", &server.uri(), "-o", "json-compact", "health"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["model"], json!(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ok(json!({"ok": true, "camera": false, "model": true, "uploader": true})))
        .mount(&server)
        .await;

    visor_cmd()
        .args(["--url", &server.uri(), "health"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Backend: Online")
                .and(predicate::str::contains("Camera: Down"))
                .and(predicate::str::contains("Model: Loaded")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_detections_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detections"))
        .respond_with(ok(json!({
            "timestamp": "2024-05-01T10:00:00",
            "objects": [{"label": "person", "confidence": 0.92, "bbox": [1, 2, 3, 4]}]
        })))
        .mount(&server)
        .await;

    visor_cmd()
        .args(["--url", &server.uri(), "detections"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Last update: 2024-05-01T10:00:00")
                .and(predicate::str::contains("person"))
                .and(predicate::str::contains("92%")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_detail_becomes_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/capture"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"ok": false, "error": "cooldown"})),
        )
        .mount(&server)
        .await;

    let output = visor_cmd()
        .args(["--url", &server.uri(), "capture"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("cooldown"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_security_frame_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/security/unknown-frame"))
        .and(query_param("unknown_id", "4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xD9])
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("u4.jpg");
    visor_cmd()
        .args(["--url", &server.uri(), "security", "frame", "4", "-O", out.to_str().unwrap()])
        .assert()
        .success();
    assert_eq!(std::fs::read(&out).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_once_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/face/recognize"))
        .respond_with(ok(json!({"ok": true, "best": {"id": 1, "name": "Shami", "score": 0.61}, "matches": []})))
        .expect(1)
        .mount(&server)
        .await;

    visor_cmd()
        .args(["--url", &server.uri(), "login", "--once"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Shami 0.61"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_once_below_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/face/recognize"))
        .respond_with(ok(json!({"ok": true, "best": {"id": 1, "name": "Shami", "score": 0.44}, "matches": []})))
        .mount(&server)
        .await;

    let output = visor_cmd()
        .args(["--url", &server.uri(), "login", "--once"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Shami (0.440)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_scans_until_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/face/recognize"))
        .respond_with(ok(json!({"ok": true, "best": null, "matches": []})))
        .mount(&server)
        .await;

    let output = visor_cmd()
        .env("VISOR_AUTH__PERIOD_MS", "200")
        .args(["--url", &server.uri(), "login", "--wait", "1s"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    assert!(combined_output(&output).contains("Status: no_match"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_stops_after_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/last"))
        .respond_with(ok(json!({"ok": true, "result": null})))
        .mount(&server)
        .await;

    visor_cmd()
        .args(["--url", &server.uri(), "-o", "plain", "watch", "audio", "--every", "100ms", "-n", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No alert detected.").count(3));
}
