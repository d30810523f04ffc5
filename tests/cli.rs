//! CLI surface tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("jll_forge")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rebuild"))
        .stdout(predicate::str::contains("provision"));
}

#[test]
fn rebuild_requires_arguments() {
    Command::cargo_bin("jll_forge")
        .unwrap()
        .arg("rebuild")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tarballs"));
}

#[test]
fn rebuild_with_missing_recipe_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("jll_forge")
        .unwrap()
        .args([
            "rebuild",
            "--recipe",
            "does-not-exist.toml",
            "--tarballs",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--bin-prefix",
            "https://example.com/releases",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn unknown_subcommand_rejected() {
    Command::cargo_bin("jll_forge")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}
