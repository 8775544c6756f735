//! tests cli_unit.rs
//! Argument handling and fast-failure paths of the `vigil` binary.

use assert_cmd::Command;
use predicates::str;
use tempfile::tempdir;

fn vigil() -> Command {
    Command::cargo_bin("vigil").unwrap()
}

#[test]
fn help_shows_usage() {
    vigil()
        .arg("--help")
        .assert()
        .success()
        .stdout(str::contains("Usage: vigil"))
        .stdout(str::contains("run"))
        .stdout(str::contains("events"));
}

#[test]
fn version_prints_the_crate_version() {
    vigil()
        .arg("--version")
        .assert()
        .success()
        .stdout(str::contains("vigil"));
}

#[test]
fn run_requires_at_least_one_root() {
    vigil()
        .arg("run")
        .assert()
        .failure()
        .stderr(str::contains("required"));
}

#[test]
fn run_rejects_a_broken_exclude_pattern() {
    let tmp = tempdir().unwrap();
    vigil()
        .args(["run", &tmp.path().to_string_lossy(), "--exclude", "*broken"])
        .assert()
        .failure()
        .stderr(str::contains("could not start watching"));
}

#[test]
fn events_requires_a_root() {
    vigil().arg("events").assert().failure();
}

#[test]
fn unknown_subcommands_are_rejected() {
    vigil()
        .arg("observe")
        .assert()
        .failure()
        .stderr(str::contains("unrecognized"));
}
