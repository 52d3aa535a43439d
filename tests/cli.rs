//! CLI-level tests driving the `jackc` binary as a subprocess.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn jackc() -> Command {
    Command::cargo_bin("jackc").unwrap()
}

#[test]
fn compiles_a_single_file_and_reports_it() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("Main.jack");
    fs::write(&in_path, "class Main { function void main() { return; } }").unwrap();

    jackc()
        .arg(&in_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled").and(predicate::str::contains("Main.vm")));

    assert!(dir.path().join("Main.vm").exists());
}

#[test]
fn missing_input_path_fails_with_nonzero_exit() {
    jackc()
        .arg("/no/such/file.jack")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn parse_error_fails_with_nonzero_exit_and_message() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("Bad.jack");
    fs::write(&in_path, "class Bad { function void f() { let = 1; return; } }").unwrap();

    jackc()
        .arg(&in_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn verbose_flag_raises_log_level_without_breaking_compilation() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("V.jack");
    fs::write(&in_path, "class V { function void f() { return; } }").unwrap();

    jackc().arg(&in_path).arg("-vv").assert().success();
    assert!(dir.path().join("V.vm").exists());
}
