use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

// Only argument handling is covered here; anything past validation talks to AWS.

#[test]
fn test_help() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classic load balancer"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_version() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ami-rollover"));
}

#[test]
fn test_missing_new_image() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.arg("ami-88888")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NEW_IMAGE"));
}

#[test]
fn test_too_many_arguments() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.args(["ami-88888", "ami-12345", "ami-99999"])
        .assert()
        .failure();
}

#[test]
fn test_identical_images_rejected() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.env_remove("AWS_PROFILE")
        .args(["ami-88888", "ami-88888"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot be the same"));
}

#[test]
fn test_zero_attempts_rejected() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.args(["ami-88888", "ami-12345", "--health-attempts", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--health-attempts"));
}

#[test]
fn test_unknown_format_rejected() {
    let mut cmd = Command::new(cargo::cargo_bin!("ami-rollover"));
    cmd.args(["ami-88888", "ami-12345", "--dry-run", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yaml"));
}
