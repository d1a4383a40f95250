//! End-to-end tests for the `sceneconv` binary.

#![allow(missing_docs)]

use std::{io::Write, process::Command};

fn sceneconv() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sceneconv"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn no_arguments_is_a_usage_error() {
    let output = sceneconv().output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "sceneconv <inputfile>\n");
}

#[test]
fn two_arguments_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let first = tmp.path().join("first.unity");
    let second = tmp.path().join("second.unity");

    let output = sceneconv().arg(&first).arg(&second).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("sceneconv <inputfile>"));
    assert!(!first.exists() && !second.exists());
}

#[test]
fn empty_file_composes_nothing() {
    let file = tempfile::NamedTempFile::new().unwrap();

    let output = sceneconv().arg(file.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.starts_with("Importing scene from "));
    assert!(!stdout.contains("GameObject"));
    assert!(!stdout.contains("--- ["));
}

#[test]
fn reports_progress_and_documents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        b"--- !u!1 GameObject &100\nGameObject:\n  m_Name: Player\n--- !u!29 29 &1\nSettings: {}\n",
    )
    .unwrap();

    let output = sceneconv().arg(file.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("GameObject 0\n"));
    assert!(stdout.contains("GameObject 1\n"));
    assert!(stdout.contains("m_Name: Player"));
    assert!(stdout.contains("~ placeholder"));
}

#[test]
fn missing_file_fails() {
    let tmp = tempfile::tempdir().unwrap();

    let output = sceneconv()
        .arg(tmp.path().join("missing.unity"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn malformed_separator_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"--- !u!1 &12345\n").unwrap();

    let output = sceneconv().arg(file.path()).output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed document separator"));
}

#[test]
fn bare_log_level_enables_library_events() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"--- !u!1 GameObject &100\nGameObject: {}\n")
        .unwrap();

    let output = sceneconv()
        .env("RUST_LOG", "debug")
        .arg(file.path())
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(stderr.contains("rewrote document separator"));
    assert!(stderr.contains("normalized scene"));
}
