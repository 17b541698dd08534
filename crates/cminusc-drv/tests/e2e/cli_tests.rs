//! CLI-level end-to-end tests: invoke the built `cminusc` binary against
//! fixture `.cm` files and assert on its exit status, stdout/stderr, and
//! (where relevant) the emitted assembly file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn cminusc() -> Command {
    Command::cargo_bin("cminusc").expect("binary should build")
}

#[test]
fn compiles_a_valid_program_to_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("ok.asm");
    cminusc()
        .arg(fixtures_dir().join("ok.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let asm = std::fs::read_to_string(&out).unwrap();
    assert!(asm.contains("gvar_x: resb 8"));
    assert!(asm.contains("main:"));
    assert!(asm.contains("push rbp"));
}

#[test]
fn unterminated_comment_is_a_fatal_lexer_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.asm");
    cminusc()
        .arg(fixtures_dir().join("unterminated_comment.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compilation aborted: lexer error"));
}

#[test]
fn parameter_mismatch_is_a_fatal_emitter_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.asm");
    cminusc()
        .arg(fixtures_dir().join("param_mismatch.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compilation aborted: emitter error"));
}

#[test]
fn call_to_undeclared_function_is_a_fatal_emitter_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.asm");
    cminusc()
        .arg(fixtures_dir().join("undeclared_call.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("undeclared function"));
}

#[test]
fn called_but_never_defined_is_a_fatal_emitter_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.asm");
    cminusc()
        .arg(fixtures_dir().join("never_defined.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no existing definition"));
}

#[test]
fn write_string_literal_ends_up_in_data_section() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("hello.asm");
    cminusc()
        .arg(fixtures_dir().join("hello.cm"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let asm = std::fs::read_to_string(&out).unwrap();
    assert!(asm.contains("str_lit0: db \"hi\", 0xA, 0"));
    assert!(asm.contains("call printf"));
}

#[test]
fn emit_ast_flag_prints_ast_and_skips_the_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("skipped.asm");
    cminusc()
        .arg(fixtures_dir().join("ok.cm"))
        .arg("-o")
        .arg(&out)
        .arg("--emit-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("PROGRAM"));

    assert!(!out.exists());
}

#[test]
fn missing_input_file_exits_nonzero() {
    cminusc()
        .arg("tests/fixtures/does-not-exist.cm")
        .assert()
        .failure();
}

#[test]
fn unknown_flag_exits_nonzero() {
    cminusc()
        .arg(fixtures_dir().join("ok.cm"))
        .arg("--not-a-real-flag")
        .assert()
        .failure();
}
