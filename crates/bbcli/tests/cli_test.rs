//! Integration tests for the `bbcli` binary.
//!
//! Argument parsing, help, completions and error exit codes run without a
//! router; the session tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `bbcli` binary with env isolation.
///
/// Clears all `BBOX_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn bbcli_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("bbcli");
    cmd.env("HOME", "/tmp/bbcli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/bbcli-test-nonexistent")
        .env_remove("BBOX_PROFILE")
        .env_remove("BBOX_URL")
        .env_remove("BBOX_PWD")
        .env_remove("BBOX_OUTPUT")
        .env_remove("BBOX_INSECURE")
        .env_remove("BBOX_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn router() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/login"))
        .and(body_string("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "BBOX_ID=cafe; Path=/"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/device/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "device": { "token": "tok", "expires": "2030-06-01T12:00:00+0100" }
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/firewall/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "firewall": { "rules": [
                { "id": 1, "enable": 1, "description": "ssh", "action": "Accept",
                  "dstports": 22, "protocols": "tcp", "ipprotocol": "IPv4", "order": 1 },
                { "id": 2, "enable": 0, "description": "telnet", "action": "Drop",
                  "dstports": "23", "protocols": "tcp", "ipprotocol": "IPv4", "order": 2 }
            ] }
        }])))
        .mount(&server)
        .await;

    server
}

fn session_cmd(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = bbcli_cmd();
    cmd.env("BBOX_PWD", "hunter2")
        .args(["--url", &format!("{}/api/v1", server.uri())]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = bbcli_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    bbcli_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Bbox")
            .and(predicate::str::contains("firewall"))
            .and(predicate::str::contains("nat"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    bbcli_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bbcli"));
}

#[test]
fn test_firewall_help_lists_actions() {
    bbcli_cmd().args(["firewall", "--help"]).assert().success().stdout(
        predicate::str::contains("add")
            .and(predicate::str::contains("update"))
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("enable"))
            .and(predicate::str::contains("disable")),
    );
}

#[test]
fn test_invalid_rule_id_is_usage_error() {
    bbcli_cmd()
        .args(["firewall", "get", "not-a-number"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    bbcli_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    bbcli_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path() {
    bbcli_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    bbcli_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]").and(predicate::str::contains("timeout = 30")));
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_unknown_profile_is_usage_error() {
    let output = bbcli_cmd()
        .args(["--profile", "office", "firewall", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("office"));
}

#[test]
fn test_unreachable_router_exit_code() {
    let output = bbcli_cmd()
        .env("BBOX_PWD", "hunter2")
        .args(["--url", "http://127.0.0.1:1/api/v1", "--timeout", "2", "nat", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

// ── Router sessions ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_firewall_list_json() {
    let server = router().await;

    let output = session_cmd(&server)
        .args(["-o", "json", "firewall", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rules.as_array().unwrap().len(), 2);
    assert_eq!(rules[0]["description"], "ssh");
    assert_eq!(rules[0]["dstports"], "22");
    assert_eq!(rules[1]["enable"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_firewall_list_plain_ids() {
    let server = router().await;

    session_cmd(&server)
        .args(["-o", "plain", "firewall", "list"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected_exit_code() {
    let server = router().await;

    let output = session_cmd(&server)
        .env("BBOX_PWD", "wrong")
        .args(["firewall", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_firewall_get_missing_exit_code() {
    let server = router().await;

    let output = session_cmd(&server)
        .args(["firewall", "get", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("firewall list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_firewall_delete_with_yes() {
    let server = router().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/firewall/rules/2"))
        .and(query_param("btoken", "tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    session_cmd(&server)
        .args(["--yes", "firewall", "delete", "2"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_needs_terminal() {
    let server = router().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    session_cmd(&server)
        .args(["firewall", "delete", "2"])
        .assert()
        .code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_firewall_update_unknown_description() {
    let server = router().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    session_cmd(&server)
        .args(["firewall", "update", "--description", "nope", "--dst-ports", "80"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nat_disable() {
    let server = router().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/nat/rules/5"))
        .and(query_param("btoken", "tok"))
        .and(body_string("enable=0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    session_cmd(&server)
        .args(["nat", "disable", "5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("NAT rule 5 disabled"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dotenv_supplies_password() {
    let server = router().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "BBOX_PWD=hunter2\n").unwrap();

    bbcli_cmd()
        .current_dir(dir.path())
        .args(["--url", &format!("{}/api/v1", server.uri())])
        .args(["-o", "plain", "firewall", "list"])
        .assert()
        .success()
        .stdout("1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_default_output_applies() {
    let server = router().await;
    let home = tempfile::tempdir().unwrap();
    let cfg_dir = home.path().join("bbcli");
    std::fs::create_dir_all(&cfg_dir).unwrap();
    std::fs::write(cfg_dir.join("config.toml"), "[defaults]\noutput = \"plain\"\n").unwrap();

    session_cmd(&server)
        .env("XDG_CONFIG_HOME", home.path())
        .args(["firewall", "list"])
        .assert()
        .success()
        .stdout("1\n2\n");

    session_cmd(&server)
        .env("XDG_CONFIG_HOME", home.path())
        .args(["-o", "json", "firewall", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}
