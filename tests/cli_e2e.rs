//! End-to-end smoke tests for the filefetch binary.
//!
//! Network-free: only argument handling and fail-fast validation paths.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_no_args_shows_usage_error() {
    Command::cargo_bin("filefetch")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_download_options() {
    Command::cargo_bin("filefetch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--folder"))
        .stdout(predicate::str::contains("--header"))
        .stdout(predicate::str::contains("--out"));
}

#[test]
fn test_version_flag_prints_name_and_version() {
    Command::cargo_bin("filefetch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("filefetch"));
}

#[test]
fn test_malformed_url_exits_nonzero() {
    Command::cargo_bin("filefetch")
        .unwrap()
        .args(["not a url", "--name", "a.pdf", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to download"));
}

#[test]
fn test_invalid_header_value_exits_nonzero() {
    Command::cargo_bin("filefetch")
        .unwrap()
        .args([
            "https://example.invalid/a.pdf",
            "--name",
            "a.pdf",
            "-H",
            "no-colon-here",
            "--no-progress",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --header value"));
}
