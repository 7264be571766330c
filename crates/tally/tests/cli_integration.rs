//! CLI integration tests for the tally console.
//!
//! These tests drive the binary over stdin and check what it prints. Each
//! run uses a short shutdown timeout so a live session is closed quickly
//! once input ends.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the tally binary with a fast shutdown.
fn tally() -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.args(["--shutdown-timeout", "50ms"]);
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    Command::cargo_bin("tally")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calculator sessions"))
        .stdout(predicate::str::contains("--session-ttl"))
        .stdout(predicate::str::contains("--shutdown-timeout"));
}

#[test]
fn test_version_displays() {
    Command::cargo_bin("tally")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tally"));
}

#[test]
fn test_invalid_duration_rejected() {
    Command::cargo_bin("tally")
        .unwrap()
        .args(["--session-ttl", "forever"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_welcome_on_empty_input() {
    tally()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome!"));
}

#[test]
fn test_addition() {
    tally()
        .write_stdin("/open\n5 + 3 =\n")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("5\n5\n3\n8\n"));
}

#[test]
fn test_divide_by_zero_keeps_display() {
    tally()
        .write_stdin("/open 1 / 0 =\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: Calculator error: Unsupported divide by zero"))
        .stdout(predicate::str::ends_with("zero\n0\n"));
}

#[test]
fn test_modulo() {
    tally()
        .write_stdin("/open 7 % 2 =\n")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("1\n"));
}

#[test]
fn test_tokens_before_open() {
    tally()
        .write_stdin("5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("please /open a new one"));
}

#[test]
fn test_open_twice() {
    tally()
        .write_stdin("/open\n/open\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Your session is not expired!"));
}

#[test]
fn test_help_command() {
    tally()
        .write_stdin("/help\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("/open - open a new session."));
}

#[test]
fn test_all_clear() {
    tally()
        .write_stdin("/open 9 * AC 2 =\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error:"))
        .stdout(predicate::str::ends_with("2\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Duration Range Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_huge_session_ttl() {
    tally()
        .args(["--session-ttl", "500000000000years"])
        .write_stdin("/open 5 + 3 =\n")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("8\n"));
}

#[test]
fn test_huge_shutdown_timeout() {
    Command::cargo_bin("tally")
        .unwrap()
        .args(["--shutdown-timeout", "500000000000years"])
        .args(["--cleanup-interval", "500000000000years"])
        .write_stdin("/help\n")
        .assert()
        .success();
}
