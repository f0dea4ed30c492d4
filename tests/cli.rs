//! End-to-end CLI tests using `assert_cmd`

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary run inside a scratch directory so the task log lands there.
fn factotum(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("factotum").unwrap_or_else(|err| panic!("Binary not found: {err}"));
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_list_shows_every_task() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generate-password"))
        .stdout(predicate::str::contains("organize-files"))
        .stdout(predicate::str::contains("github-repo-cloner"));
}

#[test]
fn test_unknown_task_exits_with_usage_code() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "nonexistent"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown task: 'nonexistent'"))
        .stderr(predicate::str::contains("generate-password"));
}

#[test]
fn test_missing_url_is_reported_before_any_download() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "download-webpage"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'url'"));
    assert!(!temp.path().join("downloaded_page.html").exists());
}

#[test]
fn test_invalid_argument_exits_with_usage_code() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "generate-password", "--arg", "length=abc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected integer"));
}

#[test]
fn test_generate_password_writes_task_log() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "generate-password", "--length", "20", "--specials", "y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated password: "));

    let log = fs::read_to_string(temp.path().join("factotum.log")).unwrap();
    assert!(log.contains("Generated a 20-character password"));
    assert!(log.contains("Task 'generate-password' completed"));
}

#[test]
fn test_help_for_task() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "help", "--tool", "generate-password"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate a secure random password."))
        .stdout(predicate::str::contains("length : integer (default: 12)"));
}

#[test]
fn test_help_for_unknown_tool() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "help", "--tool", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Tool 'nope' not found"));
}

#[test]
fn test_organize_files_end_to_end() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("inbox");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.txt"), "a").unwrap();
    fs::write(target.join("b.PNG"), "b").unwrap();

    factotum(&temp)
        .args(["--task", "organize-files", "--directory"])
        .arg(&target)
        .assert()
        .success();

    assert!(target.join("txt/a.txt").is_file());
    assert!(target.join("png/b.PNG").is_file());
}

#[test]
fn test_missing_directory_is_a_tool_failure() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "organize-files", "--directory", "does-not-exist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));

    let log = fs::read_to_string(temp.path().join("factotum.log")).unwrap();
    assert!(log.contains("Task 'organize-files' failed"));
}

#[test]
fn test_log_file_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    factotum(&temp)
        .args(["--task", "generate-password", "--log-file", "custom.log"])
        .assert()
        .success();
    assert!(temp.path().join("custom.log").is_file());
}
