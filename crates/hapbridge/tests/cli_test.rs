//! Integration tests for the `hapbridge` CLI binary.
//!
//! Every test points the config at a temporary or nonexistent path so the
//! user's real configuration is never read or written.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hapbridge` binary with env isolation.
fn hapbridge_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hapbridge");
    cmd.env("HOME", "/tmp/hapbridge-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/hapbridge-cli-test-nonexistent")
        .env("HAPBRIDGE_CONFIG", "/tmp/hapbridge-cli-test-nonexistent/config.toml")
        .env_remove("HAPBRIDGE_CATEGORY")
        .env_remove("HAPBRIDGE_SETUP_ID")
        .env_remove("HAPBRIDGE_PIN")
        .env_remove("HAPBRIDGE_DEBOUNCE")
        .env_remove("HAPBRIDGE_SHUTDOWN_GRACE")
        .env_remove("RUST_LOG");
    cmd
}

fn with_config(path: &Path) -> assert_cmd::Command {
    let mut cmd = hapbridge_cmd();
    cmd.env("HAPBRIDGE_CONFIG", path);
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
    let output = hapbridge_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    hapbridge_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("setup-uri")
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("dry-run")),
    );
}

// ── setup-uri ───────────────────────────────────────────────────────

#[test]
fn test_setup_uri_with_explicit_identity() {
    hapbridge_cmd()
        .args(["setup-uri", "--setup-id", "ABCD", "--pin", "03145154"])
        .assert()
        .success()
        .stdout("X-HM://0023ISYWYABCD\n")
        .stderr(predicate::str::contains("031-45-154"));
}

#[test]
fn test_setup_uri_with_category() {
    hapbridge_cmd()
        .args([
            "setup-uri",
            "--category",
            "5",
            "--setup-id",
            "1QJ8",
            "--pin",
            "12345678",
        ])
        .assert()
        .success()
        .stdout("X-HM://00527Y91Q1QJ8\n");
}

#[test]
fn test_setup_uri_generates_missing_values() {
    hapbridge_cmd()
        .arg("setup-uri")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^X-HM://[0-9A-Z]{9}[0-9A-F]{4}\n$").unwrap());
}

#[test]
fn test_setup_uri_reads_env() {
    hapbridge_cmd()
        .env("HAPBRIDGE_SETUP_ID", "ABCD")
        .env("HAPBRIDGE_PIN", "03145154")
        .arg("setup-uri")
        .assert()
        .success()
        .stdout("X-HM://0023ISYWYABCD\n");
}

#[test]
fn test_setup_uri_rejects_bad_pin() {
    let output = hapbridge_cmd()
        .args(["setup-uri", "--setup-id", "ABCD", "--pin", "1234"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("pin"), "Expected pin error:\n{text}");
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    hapbridge_cmd()
        .args(["config", "path", "--config", "/tmp/elsewhere/hapbridge.toml"])
        .assert()
        .success()
        .stdout("/tmp/elsewhere/hapbridge.toml\n");
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    with_config(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("X-HM://"));
    assert!(path.exists());

    with_config(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("setup_id")
                .and(predicate::str::contains("pin"))
                .and(predicate::str::contains("debounce = \"0s\"")),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "category = 2\n").unwrap();

    let output = with_config(&path).args(["config", "init"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));

    with_config(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_set_feeds_setup_uri() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    with_config(&path)
        .args(["config", "set", "setup_id", "ABCD"])
        .assert()
        .success();
    with_config(&path)
        .args(["config", "set", "pin", "03145154"])
        .assert()
        .success();

    with_config(&path)
        .arg("setup-uri")
        .assert()
        .success()
        .stdout("X-HM://0023ISYWYABCD\n");
}

#[test]
fn test_config_set_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let output = with_config(&path)
        .args(["config", "set", "debounce", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!path.exists());

    let output = with_config(&path)
        .args(["config", "set", "colour", "blue"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("colour"));
}

// ── dry-run ─────────────────────────────────────────────────────────

#[test]
fn test_dry_run_restarts_per_line() {
    hapbridge_cmd()
        .args(["dry-run", "--exit-on-eof", "--debounce", "0s"])
        .env("HAPBRIDGE_SETUP_ID", "ABCD")
        .env("HAPBRIDGE_PIN", "03145154")
        .write_stdin("lamp\n# comment\nlamp, fan\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("X-HM://0023ISYWYABCD")
                .and(predicate::str::contains("serving #1 [lamp]"))
                .and(predicate::str::contains("stopped #1"))
                .and(predicate::str::contains("serving #2 [lamp, fan]"))
                .and(predicate::str::contains("stopped #2"))
                .and(predicate::str::contains("#3").not()),
        );
}

#[test]
fn test_dry_run_empty_input_exits_cleanly() {
    hapbridge_cmd()
        .args(["dry-run", "--exit-on-eof"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("serving").not());
}

#[test]
fn test_dry_run_rejects_bad_debounce() {
    let output = hapbridge_cmd()
        .args(["dry-run", "--exit-on-eof", "--debounce", "later"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
