//! End-to-end tests for the toot-relay binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn relay_cmd() -> Command {
    let mut cmd = Command::cargo_bin("toot-relay").unwrap();
    cmd.env_remove("TOOTRELAY_CONFIG")
        .env_remove("RUST_LOG")
        .env("TOOTRELAY_LOG_LEVEL", "warn");
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn twitter_section(api: &str) -> String {
    format!(
        r#"
[twitter]
consumer_key = "ck"
consumer_secret = "cs"
access_key = "ak"
access_secret = "as"
api_url = "{api}"
stream_url = "{api}"
"#
    )
}

fn config_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn test_help_lists_exit_codes() {
    relay_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_missing_config_exits_3() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    relay_cmd()
        .arg("--config")
        .arg(config_arg(&missing))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_malformed_config_exits_3() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[twitter\nconsumer_key = ");

    relay_cmd()
        .arg("--config")
        .arg(config_arg(&path))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_missing_credential_exits_3() {
    let dir = TempDir::new().unwrap();
    let content = r#"
[twitter]
consumer_key = "ck"
consumer_secret = ""
access_key = "ak"
access_secret = "as"
"#;
    let path = write_config(&dir, content);

    relay_cmd()
        .arg("--config")
        .arg(config_arg(&path))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("twitter.consumer_secret"));
}

#[test]
fn test_invalid_log_format_rejected() {
    relay_cmd()
        .args(["--log-format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log format"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_twitter_credentials_exit_2() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{"code": 32, "message": "Could not authenticate you."}]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &twitter_section(&server.uri()));

    relay_cmd()
        .arg("--config")
        .arg(config_arg(&path))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Could not authenticate you."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_closed_stream_exits_0() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_str": "999",
            "screen_name": "relaybot"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1.1/user.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "{\"friends\":[1]}\r\n",
            "{\"id_str\":\"5\",\"text\":\"hi\",\"user\":{\"id_str\":\"1\",\"screen_name\":\"alice\"}}\r\n",
        )))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &twitter_section(&server.uri()));

    relay_cmd()
        .arg("--config")
        .arg(config_arg(&path))
        .assert()
        .success();
}
