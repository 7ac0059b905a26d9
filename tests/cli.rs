//! Tests for the cvtex binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const FIXTURE: &str = "tests/fixtures/resume.tex";

fn cvtex() -> Command {
    let mut cmd = Command::cargo_bin("cvtex").expect("binary should build");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_parse_prints_document_json() {
    let output = cvtex().args(["parse", FIXTURE]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["documentClass"], "resume");
    assert_eq!(json["metadata"]["slug"], "resume");
    assert_eq!(json["metadata"]["name"], "Ada Lovelace");
    assert_eq!(json["sections"].as_array().unwrap().len(), 4);
}

#[test]
fn test_parse_with_slug_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let overrides = dir.path().join("extra.yaml");
    fs::write(&overrides, "title: Countess\n").unwrap();

    let output = cvtex()
        .args(["parse", FIXTURE, "--slug", "ada"])
        .arg("--overrides")
        .arg(&overrides)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metadata"]["slug"], "ada");
    assert_eq!(json["metadata"]["title"], "Countess");
}

#[test]
fn test_parse_tokens_format() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("tiny.tex");
    fs::write(&source, "\\name{Ada}").unwrap();

    cvtex()
        .args(["parse", "--format", "tokens"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("command:\"name\"@1:1\n"))
        .stdout(predicate::str::contains("close-brace:\"}\"@1:10"));
}

#[test]
fn test_parse_index_format() {
    cvtex()
        .args(["parse", FIXTURE, "-f", "index", "-s", "ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"slug\": \"ada\""))
        .stdout(predicate::str::contains("\"title\": \"Ada Lovelace\""));
}

#[test]
fn test_parse_rejects_unknown_format() {
    cvtex()
        .args(["parse", FIXTURE, "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format: xml"));
}

#[test]
fn test_parse_missing_file_fails() {
    cvtex()
        .args(["parse", "tests/fixtures/missing.tex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}

#[test]
fn test_build_writes_index() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::copy(FIXTURE, input.path().join("ada.tex")).unwrap();

    cvtex()
        .arg("build")
        .arg(input.path())
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ada -> "));

    assert!(output.path().join("ada.json").exists());
    let index = fs::read_to_string(output.path().join("index.json")).unwrap();
    assert!(index.contains("\"slug\": \"ada\""));
}

#[test]
fn test_build_respects_config_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = input.path().join("cvtex.toml");
    fs::write(&config, "[build]\nindex_file = \"catalog.json\"\npretty = false\n").unwrap();
    fs::copy(FIXTURE, input.path().join("ada.tex")).unwrap();

    cvtex()
        .arg("--config")
        .arg(&config)
        .arg("build")
        .arg(input.path())
        .arg(output.path())
        .assert()
        .success();

    let index = fs::read_to_string(output.path().join("catalog.json")).unwrap();
    assert!(index.starts_with("[{\"slug\":\"ada\""));
}

#[test]
fn test_commands_lists_registered_names() {
    cvtex()
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("\\section\n"))
        .stdout(predicate::str::contains("\\datedexperience\n"))
        .stdout(predicate::str::contains("\\%").not());
}
