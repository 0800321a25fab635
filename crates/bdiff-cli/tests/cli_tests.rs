//! End-to-end tests for the bdiff binary.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn run_bdiff(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_bdiff"))
        .args(args)
        .output()
        .expect("failed to spawn bdiff")
}

fn write_pair(dir: &TempDir, src: &str, dest: &str) -> (String, String) {
    let src_path = dir.path().join("left.txt");
    let dest_path = dir.path().join("right.txt");
    fs::write(&src_path, src).unwrap();
    fs::write(&dest_path, dest).unwrap();
    (
        src_path.to_string_lossy().into_owned(),
        dest_path.to_string_lossy().into_owned(),
    )
}

#[test]
fn identical_files_print_nothing() {
    let dir = TempDir::new().unwrap();
    let (src, dest) = write_pair(&dir, "a\nb\n", "a\nb\n");
    let out = run_bdiff(&[&src, &dest]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn delete_is_reported() {
    let dir = TempDir::new().unwrap();
    let (src, dest) = write_pair(&dir, "a\nb\nc\n", "a\nc\n");
    let out = run_bdiff(&[&src, &dest]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Delete line 2"), "stdout: {stdout}");
}

#[test]
fn json_output_is_valid() {
    let dir = TempDir::new().unwrap();
    let (src, dest) = write_pair(&dir, "x\n", "x\ny\n");
    let out = run_bdiff(&[&src, &dest, "--json"]);
    assert!(out.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["mode"], "insert");
    assert_eq!(records[0]["dest_line"], 2);
    assert_eq!(records[0]["edit_action"], "Insert line 2");
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let (src, _) = write_pair(&dir, "a\n", "b\n");
    let missing = dir.path().join("nope.txt");
    let out = run_bdiff(&[&src, &missing.to_string_lossy()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("fatal:"), "stderr: {stderr}");
}

#[test]
fn non_utf8_input_fails() {
    let dir = TempDir::new().unwrap();
    let src_path = dir.path().join("bin.dat");
    let dest_path = dir.path().join("ok.txt");
    fs::write(&src_path, [0xff, 0xfe, 0x00, 0x41]).unwrap();
    fs::write(&dest_path, "a\n").unwrap();
    let out = run_bdiff(&[
        &src_path.to_string_lossy(),
        &dest_path.to_string_lossy(),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("UTF-8"), "stderr: {stderr}");
}

#[test]
fn version_flag_short_and_long() {
    let short = run_bdiff(&["-v"]);
    assert!(short.status.success());
    let out = String::from_utf8(short.stdout).unwrap();
    assert!(out.starts_with("bdiff"), "stdout: {out}");
    let long = run_bdiff(&["--version"]);
    assert!(long.status.success());
    assert_eq!(String::from_utf8(long.stdout).unwrap(), out);
}

#[test]
fn myers_algorithm_accepted() {
    let dir = TempDir::new().unwrap();
    let (src, dest) = write_pair(&dir, "a\nb\n", "a\n");
    let out = run_bdiff(&[&src, &dest, "--diff-algorithm", "Myers"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Delete line 2"), "stdout: {stdout}");
}

#[test]
fn detectors_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let (src, dest) = write_pair(&dir, "hello world\n", "hello\nworld\n");
    let out = run_bdiff(&[&src, &dest, "--disable-identifying-split"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(!stdout.contains("Split"), "stdout: {stdout}");
}
