//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, each subcommand
//! responds to `--help`, and the offline subcommands work end to end.

#![allow(deprecated)] // cargo_bin deprecation — replacement not yet stable

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: get a Command for the `storyreel` binary.
fn storyreel() -> Command {
    Command::cargo_bin("storyreel").expect("binary 'storyreel' should be built")
}

/// Helper: an empty config file so the user's own config never leaks in.
fn empty_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();
    path
}

fn write_passages(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("passages.json");
    std::fs::write(&path, json).unwrap();
    path
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    storyreel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: storyreel"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("budget"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("footage"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_flag_shows_semver() {
    storyreel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^storyreel \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    storyreel()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: storyreel"));
}

#[test]
fn invalid_subcommand_fails() {
    storyreel()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn render_help() {
    storyreel()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("narrated video"))
        .stdout(predicate::str::contains("<PASSAGES>"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--budget"))
        .stdout(predicate::str::contains("--keep-links"));
}

#[test]
fn footage_help() {
    storyreel()
        .args(["footage", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<QUERY>"))
        .stdout(predicate::str::contains("--min-duration"));
}

// ─── Subcommand argument validation ──────────────────────────────────────────

#[test]
fn render_missing_output_fails() {
    storyreel()
        .args(["render", "passages.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn missing_explicit_config_fails() {
    storyreel()
        .args(["--config", "/nonexistent/storyreel.toml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ─── Offline subcommands ─────────────────────────────────────────────────────

#[test]
fn budget_selects_fitting_prefix() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let passages = write_passages(
        dir.path(),
        &format!(r#"["{}", "{}", "{}"]"#, "a".repeat(30), "b".repeat(20), "c".repeat(20)),
    );

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("budget")
        .arg(&passages)
        .args(["--budget", "6", "--rate", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 3 passages"));
}

#[test]
fn budget_reports_insufficient_content() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let passages = write_passages(dir.path(), &format!(r#"["{}", "short"]"#, "a".repeat(70)));

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("budget")
        .arg(&passages)
        .args(["--budget", "6", "--rate", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only 0 of 2 segments fit"));
}

#[test]
fn budget_rejects_non_finite_budget() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let passages = write_passages(dir.path(), r#"["first passage", "second passage"]"#);

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("budget")
        .arg(&passages)
        .args(["--budget", "nan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("time budget must be a positive number"));
}

#[test]
fn budget_rejects_malformed_passages() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);
    let passages = write_passages(dir.path(), r#"{"not": "an array"}"#);

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("budget")
        .arg(&passages)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid passages"));
}

#[test]
fn probe_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    storyreel()
        .arg("--config")
        .arg(&config)
        .args(["probe", "/nonexistent/storyreel/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot probe"));
}

#[test]
fn check_lists_dependencies() {
    let dir = TempDir::new().unwrap();
    let config = empty_config(&dir);

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("ffprobe"))
        .stdout(predicate::str::contains("browser"));
}
