//! Integration tests for the assay CLI.
//!
//! These tests invoke the `assay` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn assay() -> Command {
    Command::cargo_bin("assay").unwrap()
}

/// Return the workspace root (parent of assay-cli/).
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Return the absolute path to a test program file.
fn test_program(name: &str) -> PathBuf {
    workspace_root().join("tests/programs").join(name)
}

fn program_arg(name: &str) -> String {
    test_program(name).to_str().unwrap().to_string()
}

/// Write `text` to a temporary .air file.
fn write_temp(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("input.air");
    fs::write(&path, text).unwrap();
    path
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    assay()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: assay"));
}

#[test]
fn help_flag_exits_0() {
    assay()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn unknown_command_exits_1() {
    assay()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown command"));
}

// ---- Check ----

#[test]
fn check_passing_program() {
    assay()
        .args(["check", &program_arg("passing.air")])
        .assert()
        .success()
        .stdout("2 assertions: 2 passed, 0 failed\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn check_pound_assert_reports_every_failure() {
    let file = program_arg("pound_assert.air");
    assay()
        .args(["check", &file])
        .assert()
        .failure()
        .code(3)
        .stdout("31 assertions: 18 passed, 13 failed\n")
        .stderr(predicate::str::contains(format!(
            "{file}:17:3: error: assertion failed\n"
        )))
        .stderr(predicate::str::contains(format!(
            "{file}:18:3: error: 2 is not 1\n"
        )))
        .stderr(predicate::str::contains(format!(
            "{file}:39:3: error: assertion condition not constant\n\
             {file}:31:3: note: condition always evaluates to true\n\
             {file}:31:3: note: control flow loop found\n\
             {file}:39:11: note: when called from here\n"
        )))
        .stderr(predicate::str::contains(
            "note: exceeded instruction limit: 512 when evaluating the expression at compile time",
        ))
        .stderr(predicate::str::contains(format!(
            "{file}:84:7: note: could not fold operation"
        )))
        .stderr(predicate::str::contains(format!(
            "{file}:113:16: note: integer overflow detected"
        )));
}

#[test]
fn check_limit_flag_changes_budget() {
    assay()
        .args(["check", &program_arg("passing.air"), "--limit", "40"])
        .assert()
        .failure()
        .code(3)
        .stdout("2 assertions: 1 passed, 1 failed\n")
        .stderr(predicate::str::contains("exceeded instruction limit: 40"));
}

#[test]
fn check_bad_limit_exits_1() {
    assay()
        .args(["check", &program_arg("passing.air"), "--limit", "lots"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid --limit"));
}

#[test]
fn check_syntax_error_exits_1() {
    assay()
        .args(["check", &program_arg("syntax_error.air")])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 3: unexpected token 'maybe'"));
}

#[test]
fn check_missing_file_exits_1() {
    assay()
        .args(["check", "/nonexistent/file.air"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn check_invalid_program_exits_2() {
    assay()
        .args(["check", &program_arg("invalid.air")])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("passes 1 argument(s), expected 2"));
}

#[test]
fn check_malformed_evaluation_counts_as_failure() {
    // Verifies, but compares a bool with an integer.
    let dir = TempDir::new().unwrap();
    let path = write_temp(
        &dir,
        "\
func @cond() {
bb0:
  %0 = bool true
  %1 = int Int64 1
  %2 = cmp eq %0, %1
  ret %2
}
assert @cond @5:1
",
    );
    assay()
        .args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(3)
        .stdout("1 assertions: 0 passed, 1 failed\n")
        .stderr(predicate::str::contains("5:1: error: malformed module"));
}

#[test]
fn verbose_flag_enables_debug_logs() {
    assay()
        .args(["-v", "check", &program_arg("passing.air")])
        .assert()
        .success()
        .stderr(predicate::str::contains("assembled module"));
}

// ---- Verify ----

#[test]
fn verify_valid_program() {
    assay()
        .args(["verify", &program_arg("pound_assert.air")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("OK:"))
        .stdout(predicate::str::contains("31 assertions"));
}

#[test]
fn verify_invalid_program_exits_2() {
    assay()
        .args(["verify", &program_arg("invalid.air")])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

// ---- Fmt ----

#[test]
fn fmt_output_is_canonical_and_checks_the_same() {
    let output = assay()
        .args(["fmt", &program_arg("pound_assert.air")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let canonical = String::from_utf8(output).unwrap();
    assert!(!canonical.contains(';'));

    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, &canonical);
    let path = path.to_str().unwrap();

    assay()
        .args(["fmt", path])
        .assert()
        .success()
        .stdout(predicate::str::diff(canonical.clone()));
    assay()
        .args(["check", path])
        .assert()
        .code(3)
        .stdout("31 assertions: 18 passed, 13 failed\n");
}

#[test]
fn fmt_bad_input_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "func @f() {\nbb0:\n  %0 = frob\n}\n");
    assay()
        .args(["fmt", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown mnemonic 'frob'"));
}
