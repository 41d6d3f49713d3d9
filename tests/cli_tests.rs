//! CLI argument and error path coverage.

use assert_cmd::Command;
use predicates::prelude::*;

fn installmedia_cmd() -> Command {
    Command::cargo_bin("installmedia").unwrap()
}

fn write_metadata(dir: &std::path::Path, identifier: &str) {
    std::fs::write(
        dir.join("installer.json"),
        format!(
            r#"{{
                "identifier": "{identifier}",
                "name": "macOS Test",
                "version": "12.6",
                "build": "21G115",
                "packages": [{{ "filename": "InstallAssistant.pkg" }}]
            }}"#
        ),
    )
    .unwrap();
}

#[test]
fn missing_required_arguments_fails() {
    installmedia_cmd().assert().failure();
}

#[test]
fn help_describes_the_tool() {
    installmedia_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("installer media"));
}

#[test]
fn no_output_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    installmedia_cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No output type requested"));
}

#[test]
fn missing_metadata_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    installmedia_cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--image",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn corrupt_metadata_is_a_metadata_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("installer.json"), "{not json").unwrap();

    installmedia_cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--image",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("installer metadata error"));
}

#[test]
fn existing_destination_without_force_is_reported_and_preserved() {
    let dir = tempfile::tempdir().unwrap();
    write_metadata(dir.path(), "cli-test-existing");

    let destination = dir.path().join("macOS Test 12.6-21G115.dmg");
    std::fs::write(&destination, b"previous artifact").unwrap();

    installmedia_cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--image",
            "--quiet",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read(&destination).unwrap(), b"previous artifact");
}

#[test]
fn zero_image_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_metadata(dir.path(), "cli-test-size");

    installmedia_cmd()
        .args([
            "--input",
            dir.path().to_str().unwrap(),
            "--output",
            dir.path().to_str().unwrap(),
            "--iso",
            "--image-size",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--image-size"));
}
