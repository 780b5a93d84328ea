//! Process-level tests for the `hwbot` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::json;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates an empty scratch directory so no stray `.env` or `hwbot.json` is picked up.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hwbot-cli-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn hwbot(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hwbot"));
    command
        .current_dir(dir)
        .env_remove("PRACTICUM_TOKEN")
        .env_remove("TELEGRAM_TOKEN")
        .env_remove("TELEGRAM_CHAT_ID")
        .env_remove("RUST_LOG");
    command
}

async fn run(mut command: Command) -> Output {
    command.output().await.expect("failed to run hwbot")
}

#[tokio::test]
async fn missing_credentials_exit_with_status_one() {
    let dir = scratch_dir("no-env");

    let output = run(hwbot(&dir)).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PRACTICUM_TOKEN"), "stderr: {stderr}");
    assert!(stderr.contains("TELEGRAM_TOKEN"), "stderr: {stderr}");
    assert!(stderr.contains("TELEGRAM_CHAT_ID"), "stderr: {stderr}");
}

#[tokio::test]
async fn one_missing_credential_is_fatal() {
    let dir = scratch_dir("partial-env");

    let mut command = hwbot(&dir);
    command
        .env("PRACTICUM_TOKEN", "p")
        .env("TELEGRAM_TOKEN", "123:abc");
    let output = run(command).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TELEGRAM_CHAT_ID"), "stderr: {stderr}");
}

#[tokio::test]
async fn dotenv_file_supplies_credentials() {
    let dir = scratch_dir("dotenv");
    let homework_api = MockServer::start().await;
    let telegram_api = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [],
            "current_date": 1
        })))
        .expect(1)
        .mount(&homework_api)
        .await;

    std::fs::write(
        dir.join(".env"),
        "PRACTICUM_TOKEN=p\nTELEGRAM_TOKEN=123:abc\nTELEGRAM_CHAT_ID=1\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("hwbot.json"),
        json!({
            "endpoint": format!("{}/", homework_api.uri()),
            "telegramApiUrl": telegram_api.uri(),
        })
        .to_string(),
    )
    .unwrap();

    let mut command = hwbot(&dir);
    command.arg("--once");
    let output = run(command).await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[tokio::test]
async fn once_mode_delivers_status_change() {
    let dir = scratch_dir("once");
    let homework_api = MockServer::start().await;
    let telegram_api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user_api/homework_statuses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 1000
        })))
        .expect(1)
        .mount(&homework_api)
        .await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .expect(1)
        .mount(&telegram_api)
        .await;

    let config_path = dir.join("custom.json");
    std::fs::write(
        &config_path,
        json!({
            "endpoint": format!("{}/api/user_api/homework_statuses/", homework_api.uri()),
            "telegramApiUrl": telegram_api.uri(),
            "requestTimeoutSecs": 5
        })
        .to_string(),
    )
    .unwrap();

    let mut command = hwbot(&dir);
    command
        .env("PRACTICUM_TOKEN", "p")
        .env("TELEGRAM_TOKEN", "123:abc")
        .env("TELEGRAM_CHAT_ID", "1")
        .arg("--once")
        .arg("--config")
        .arg(&config_path);
    let output = run(command).await;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[tokio::test]
async fn invalid_config_exits_with_status_one() {
    let dir = scratch_dir("bad-config");
    std::fs::write(dir.join("hwbot.json"), r#"{"retryPeriodSecs": 0}"#).unwrap();

    let mut command = hwbot(&dir);
    command
        .env("PRACTICUM_TOKEN", "p")
        .env("TELEGRAM_TOKEN", "123:abc")
        .env("TELEGRAM_CHAT_ID", "1");
    let output = run(command).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("retryPeriodSecs"), "stderr: {stderr}");
}

#[tokio::test]
async fn log_file_is_appended_without_colors() {
    let dir = scratch_dir("log-file");
    let log_path = dir.join("hwbot.log");
    std::fs::write(&log_path, "previous run\n").unwrap();

    let mut command = hwbot(&dir);
    command.arg("--log-file").arg(&log_path);
    let output = run(command).await;

    assert_eq!(output.status.code(), Some(1));
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.starts_with("previous run\n"), "log: {log}");
    assert!(log.contains("Startup aborted"), "log: {log}");
    assert!(log.contains("PRACTICUM_TOKEN"), "log: {log}");
    assert!(!log.contains('\u{1b}'), "log: {log}");
}
