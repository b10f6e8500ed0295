//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temp dir so
//! config and state never leak between tests.

use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_focusguard"));
    cmd.env("HOME", home.path())
        .env_remove("FOCUSGUARD_ENV")
        .env("RUST_LOG", "off");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = cli(home)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is not JSON"))
        .collect()
}

#[test]
fn test_session_status_starts_idle() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&home, &["session", "status"]);
    assert_eq!(code, 0);
    let status: Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(status["isSessionActive"], false);
    assert!(status["currentGoal"].is_null());
}

#[test]
fn test_session_start_then_status() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&home, &["session", "start", "  Learn Rust  "]);
    assert_eq!(code, 0);
    assert!(out.contains(r#""status":"started""#));

    let (out, _, _) = run_cli(&home, &["session", "status"]);
    let status: Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(status["isSessionActive"], true);
    assert_eq!(status["currentGoal"], "Learn Rust");
}

#[test]
fn test_session_start_rejects_blank_goal() {
    let home = TempDir::new().unwrap();
    let (_, err, code) = run_cli(&home, &["session", "start", "   "]);
    assert_ne!(code, 0);
    assert!(err.contains("goal must not be empty"), "stderr: {err}");

    let (out, _, _) = run_cli(&home, &["session", "status"]);
    assert!(out.contains(r#""isSessionActive":false"#));
}

#[test]
fn test_session_end_is_idempotent() {
    let home = TempDir::new().unwrap();
    let _ = run_cli(&home, &["session", "start", "Write report"]);

    for _ in 0..2 {
        let (out, _, code) = run_cli(&home, &["session", "end"]);
        assert_eq!(code, 0);
        assert!(out.contains(r#""status":"stopped""#));
    }

    let (out, _, _) = run_cli(&home, &["session", "status"]);
    assert!(out.contains(r#""isSessionActive":false"#));
}

#[test]
fn test_config_get_defaults() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&home, &["config", "get", "monitor.interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "60");

    let (out, _, _) = run_cli(&home, &["config", "get", "oracle.endpoint"]);
    assert_eq!(out.trim(), "http://localhost:5000/api/analyze-focus");
}

#[test]
fn test_config_set_persists() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "notifications.snooze_minutes", "10"]);
    assert_eq!(code, 0);

    let (out, _, _) = run_cli(&home, &["config", "get", "notifications.snooze_minutes"]);
    assert_eq!(out.trim(), "10");

    let (_, _, code) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&home, &["config", "get", "notifications.snooze_minutes"]);
    assert_eq!(out.trim(), "5");
}

#[test]
fn test_config_rejects_bad_values() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "get", "nope.key"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(&home, &["config", "set", "monitor.interval_secs", "0"]);
    assert_ne!(code, 0);

    let (out, _, _) = run_cli(&home, &["config", "get", "monitor.interval_secs"]);
    assert_eq!(out.trim(), "60");
}

#[test]
fn test_config_list_is_json() {
    let home = TempDir::new().unwrap();
    let (out, _, code) = run_cli(&home, &["config", "list"]);
    assert_eq!(code, 0);
    let config: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(config["oracle"]["timeout_secs"], 15);
}

#[test]
fn test_target_set_show_clear() {
    let home = TempDir::new().unwrap();
    let (out, _, _) = run_cli(&home, &["target", "show"]);
    assert_eq!(out.trim(), "no target");

    let (_, _, code) = run_cli(&home, &["target", "set", "https://example.com/article"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&home, &["target", "show"]);
    assert_eq!(out.trim(), "https://example.com/article");

    let (_, _, code) = run_cli(&home, &["target", "clear"]);
    assert_eq!(code, 0);
    let (out, _, _) = run_cli(&home, &["target", "show"]);
    assert_eq!(out.trim(), "no target");
}

#[test]
fn test_target_rejects_non_http() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["target", "set", "ftp://example.com"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(&home, &["target", "set", "not a url"]);
    assert_ne!(code, 0);
}

#[test]
fn test_check_without_session_fails() {
    let home = TempDir::new().unwrap();
    let (_, err, code) = run_cli(&home, &["check"]);
    assert_ne!(code, 0);
    assert!(err.contains("no active session"), "stderr: {err}");
}

#[test]
fn test_watch_control_channel() {
    let home = TempDir::new().unwrap();
    let _ = run_cli(&home, &["session", "start", "Persisted goal"]);

    let mut child = cli(&home)
        .arg("watch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn watch");

    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, r#"{{"type":"GET_STATUS"}}"#).unwrap();
        writeln!(stdin, r#"{{"type":"START_SESSION","goal":"New goal"}}"#).unwrap();
        writeln!(stdin, r#"{{"type":"GET_STATUS"}}"#).unwrap();
        writeln!(stdin, "garbage").unwrap();
        writeln!(stdin, r#"{{"type":"END_SESSION"}}"#).unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let lines = json_lines(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(lines.len(), 6, "unexpected output: {lines:?}");

    // Recovered from the persisted record.
    assert_eq!(lines[0]["isSessionActive"], true);
    assert_eq!(lines[0]["currentGoal"], "Persisted goal");
    assert_eq!(lines[1]["currentGoal"], "Persisted goal");
    assert_eq!(lines[2]["status"], "started");
    assert_eq!(lines[3]["currentGoal"], "New goal");
    assert_eq!(lines[4]["status"], "error");
    assert_eq!(lines[5]["status"], "stopped");

    let (out, _, _) = run_cli(&home, &["session", "status"]);
    assert!(out.contains(r#""isSessionActive":false"#));
}
