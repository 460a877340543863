//! CLI smoke tests for poemkit.
//!
//! These tests verify that the commands run end to end and return
//! appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use poemkit_lib::llb::Definition;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the poemkit binary.
fn poemkit_cmd() -> Command {
  cargo_bin_cmd!("poemkit")
}

/// Create a temp context directory holding one file.
fn temp_context(name: &str, content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join(name), content).unwrap();
  temp
}

const POEM: &str = "Ozymandias\nI met a traveller from an antique land,\nWho said: Two vast and trunkless legs of stone";

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  poemkit_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  poemkit_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("poemkit"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["llb", "preview"] {
    poemkit_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// llb
// =============================================================================

#[test]
fn llb_writes_decodable_definition() {
  let output = poemkit_cmd().arg("llb").output().unwrap();
  assert!(output.status.success());

  let definition = Definition::decode(&output.stdout).unwrap();
  assert_eq!(definition.len(), 2);
  definition.validate().unwrap();
}

#[test]
fn llb_binary_format_matches_default() {
  let default = poemkit_cmd().arg("llb").output().unwrap();
  let binary = poemkit_cmd().args(["llb", "--format", "binary"]).output().unwrap();

  assert!(binary.status.success());
  assert_eq!(binary.stdout, default.stdout);
}

#[test]
fn llb_rejects_unknown_format() {
  poemkit_cmd().args(["llb", "--format", "text"]).assert().failure();
}

#[test]
fn llb_json_shows_digests() {
  poemkit_cmd()
    .args(["llb", "--format", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("sha256:"))
    .stdout(predicate::str::contains("source.image"));
}

#[test]
fn llb_respects_base_image_opt() {
  poemkit_cmd()
    .args(["llb", "--format", "json", "--opt", "base-image=docker-image://docker.io/library/busybox:latest"])
    .assert()
    .success()
    .stdout(predicate::str::contains("busybox"));
}

#[test]
fn llb_rejects_malformed_opt() {
  poemkit_cmd().args(["llb", "--opt", "nokey"]).assert().failure();
}

// =============================================================================
// preview
// =============================================================================

#[test]
fn preview_lists_history_newest_first() {
  let temp = temp_context("Poem", POEM);

  let output = poemkit_cmd()
    .args(["preview", "--format", "json", "--context"])
    .arg(temp.path())
    .output()
    .unwrap();
  assert!(output.status.success());

  let image: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let history = image["history"].as_array().unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0]["created_by"], "Who said: Two vast and trunkless legs of stone");
  assert_eq!(history[1]["created_by"], "I met a traveller from an antique land,");
  assert!(history.iter().all(|h| h["empty_layer"] == true));
}

#[test]
fn preview_text_output() {
  let temp = temp_context("Poem", POEM);

  poemkit_cmd()
    .args(["preview", "--context"])
    .arg(temp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("History: 2"))
    .stdout(predicate::str::contains("antique land"));
}

#[test]
fn preview_reads_named_file() {
  let temp = temp_context("Limerick", "--\nThere once was a man from Peru");

  poemkit_cmd()
    .args(["preview", "--file", "Limerick", "--context"])
    .arg(temp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("man from Peru"));
}

#[test]
fn preview_missing_artifact_fails() {
  let temp = TempDir::new().unwrap();

  poemkit_cmd()
    .args(["preview", "--context"])
    .arg(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Build failed"));
}

#[test]
fn preview_missing_context_fails() {
  poemkit_cmd()
    .args(["preview", "--context", "/nonexistent/poemkit/context"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Context directory not found"));
}
