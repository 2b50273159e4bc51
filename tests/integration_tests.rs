use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

fn ls8() -> Command {
  Command::cargo_bin("ls8").unwrap()
}

fn image(source: &str) -> NamedTempFile {
  let mut file = NamedTempFile::new().unwrap();
  file.write_all(source.as_bytes()).unwrap();
  file.flush().unwrap();
  file
}

#[test]
fn runs_print8() {
  ls8().arg("demos/print8.ls8").assert().success().stdout("8\n");
}

#[test]
fn runs_mult() {
  ls8().arg("demos/mult.ls8").assert().success().stdout("72\n");
}

#[test]
fn runs_stack() {
  ls8()
    .arg("demos/stack.ls8")
    .assert()
    .success()
    .stdout("2\n4\n2\n1\n");
}

#[test]
fn runs_call() {
  ls8()
    .arg("demos/call.ls8")
    .assert()
    .success()
    .stdout("20\n30\n36\n60\n");
}

#[test]
fn runs_sctest() {
  ls8()
    .arg("demos/sctest.ls8")
    .assert()
    .success()
    .stdout("1\n4\n5\n");
}

#[test]
fn adds_and_prints() {
  let file = image(
    "10000010 # LDI R0,8\n00000000\n00001000\n\
     10000010 # LDI R1,9\n00000001\n00001001\n\
     10100000 # ADD R0,R1\n00000000\n00000001\n\
     01000111 # PRN R0\n00000000\n\
     00000001 # HLT\n",
  );
  ls8().arg(file.path()).assert().success().stdout("17\n");
}

#[test]
fn missing_file() {
  let dir = tempfile::tempdir().unwrap();
  ls8()
    .arg(dir.path().join("missing.ls8"))
    .assert()
    .code(2)
    .stdout("");
}

#[test]
fn invalid_literal() {
  let file = image("10000010\n00000000\n0000100x\n");
  ls8().arg(file.path()).assert().code(1).stdout("");
}

#[test]
fn unknown_opcode_is_fatal() {
  // PRN output before the fault is kept
  let file = image("10000010\n00000000\n00000101\n01000111\n00000000\n11111111\n");
  ls8().arg(file.path()).assert().code(3).stdout("5\n");
}

#[test]
fn requires_a_path() {
  ls8().assert().failure();
}

#[test]
fn trace_goes_to_stderr() {
  ls8()
    .args(["--trace", "demos/print8.ls8"])
    .assert()
    .success()
    .stdout("8\n");
}
