//! CLI argument parsing and validation tests — no network I/O.
//!
//! These tests verify that invalid arguments are rejected before any cassette
//! or live adapter is consulted.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("negar").unwrap()
}

#[test]
fn missing_prompt_exits_with_error() {
    // Neither prompt nor --prompt-file given → resolve_prompt() returns an error
    cmd().assert().failure().stderr(predicate::str::contains("Provide a prompt string"));
}

#[test]
fn invalid_target_exits_with_error() {
    cmd()
        .args(["--target", "gif", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported target"));
}

#[test]
fn invalid_aspect_ratio_exits_with_error() {
    // Validation fires before any cassette is opened; no API key needed
    cmd()
        .args(["--aspect-ratio", "100:200", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported aspect ratio"));
}

#[test]
fn invalid_resolution_exits_with_error() {
    cmd()
        .args(["--resolution", "480p", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported resolution"));
}

#[test]
fn invalid_format_exits_with_error() {
    cmd()
        .args(["--format", "gif", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn no_api_keys_exits_with_error() {
    cmd()
        .env_remove("GEMINI_API_KEYS")
        .env_remove("GEMINI_API_KEY")
        .env_remove("NEGAR_REPLAY")
        .env("NEGAR_CONFIG", "/nonexistent/negar-config.toml")
        .arg("a cat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API keys configured"));
}

#[test]
fn missing_replay_cassette_exits_with_error() {
    cmd()
        .env("NEGAR_REPLAY", "/nonexistent/cassette.yaml")
        .arg("a cat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load cassette"));
}
