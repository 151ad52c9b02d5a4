//! Integration tests for CLI commands

#![allow(deprecated)]

use assert_cmd::{assert::OutputAssertExt, cargo::CommandCargoExt};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("simsanity").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cheats"))
        .stdout(predicate::str::contains("howto"))
        .stdout(predicate::str::contains("--backend"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("simsanity").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("simsanity "));
}

#[test]
fn test_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("simsanity").unwrap();
    cmd.arg("teleport");

    cmd.assert().failure();
}

#[test]
fn test_cheats_against_unreachable_backend_reports_error() {
    // Nothing listens on port 9 of the loopback interface
    let mut cmd = Command::cargo_bin("simsanity").unwrap();
    cmd.env("SIMSANITY_BACKEND_URL", "http://127.0.0.1:9")
        .env("NO_COLOR", "1")
        .arg("cheats");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Loading Sims 4 cheats"))
        .stdout(predicate::str::contains("⚠️ Error:"));
}

#[test]
fn test_chat_help_then_quit() {
    let mut cmd = assert_cmd::Command::cargo_bin("simsanity").unwrap();
    cmd.env("SIMSANITY_BACKEND_URL", "http://127.0.0.1:9")
        .env("NO_COLOR", "1")
        .arg("chat")
        .write_stdin("/help\n/quit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("/modfix"))
        .stdout(predicate::str::contains("Goodbye!"));
}
