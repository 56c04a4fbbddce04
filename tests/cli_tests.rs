// ABOUTME: Binary-level tests for file dispatch, exit codes and output

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn ocrpi() -> Command {
    Command::cargo_bin("ocrpi").expect("binary should build")
}

fn script(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write script");
    path
}

#[test]
fn test_hello_world_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "hello.ocr", "print(\"hello, world\")");
    ocrpi()
        .arg(path)
        .assert()
        .success()
        .stdout("hello, world\n");
}

#[test]
fn test_function_call_program() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = "global x = 3\n\
                  function add(a, b)\n\
                      return a + b\n\
                  endfunction\n\
                  print(add(x, 4))";
    let path = script(&dir, "add.ocr", source);
    ocrpi().arg(path).assert().success().stdout("7\n");
}

#[test]
fn test_parse_error_exits_with_parser_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "broken.ocr", "global x 3");
    ocrpi()
        .arg(path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[line 1:"));
}

#[test]
fn test_runtime_fault_exits_with_interpreter_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "div.ocr", "print(1 / 0)");
    ocrpi()
        .arg(path)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Division by zero!"));
}

#[test]
fn test_native_fault_exits_with_native_lib_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "native.ocr", "typeof(1, 2)");
    ocrpi()
        .arg(path)
        .assert()
        .code(4)
        .stdout(predicate::str::contains("typeof: expected 1 argument"));
}

#[test]
fn test_extended_mode_is_reserved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "future.ocrx", "print(1)");
    ocrpi()
        .arg(path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Extended mode not supported yet!"));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "prog.txt", "print(1)");
    ocrpi()
        .arg(path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unknown file extension!"));
}

#[test]
fn test_missing_file_is_a_main_fault() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.ocr");
    ocrpi().arg(path).assert().code(1);
}

#[test]
fn test_faults_print_in_red() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = script(&dir, "div.ocr", "print(1 / 0)");
    ocrpi()
        .arg(path)
        .assert()
        .stdout(predicate::str::contains("\x1b[31m"));
}

#[test]
fn test_version_flag() {
    ocrpi()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}
