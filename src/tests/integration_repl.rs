use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::{env, fs};
use tempfile::tempdir;

fn bin_path() -> String {
    if let Ok(path) = env::var("CARGO_BIN_EXE_gosling-lang") {
        return path;
    }
    let mut fallback =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("manifest dir not set by cargo"));
    fallback.push("target");
    fallback.push("debug");
    fallback.push("gosling-lang");
    if cfg!(windows) {
        fallback.set_extension("exe");
    }
    if fallback.exists() {
        return fallback.to_string_lossy().into_owned();
    }
    panic!(
        "binary path not set by cargo test and fallback {:?} not found",
        fallback
    );
}

fn run_repl_with_input(input: &str) -> (String, String) {
    let mut child = Command::new(bin_path())
        .arg("repl")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start repl");
    child
        .stdin
        .as_mut()
        .expect("child stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for repl");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn repl_evaluates_fragments_from_stdin() {
    let (stdout, _) = run_repl_with_input("x := 6 * 7\nfmt.Println(x)\n");
    assert!(stdout.contains("42"), "stdout: {stdout}");
}

#[test]
fn repl_buffers_multiline_fragments() {
    let (stdout, _) = run_repl_with_input("for i := 0; i < 3; i++ {\nfmt.Println(i)\n}\n");
    assert!(stdout.contains('0') && stdout.contains('1') && stdout.contains('2'));
}

#[test]
fn repl_reports_errors_and_keeps_going() {
    let (stdout, stderr) = run_repl_with_input("undefinedName\nfmt.Println(\"still here\")\n");
    assert!(stderr.contains("undefined"), "stderr: {stderr}");
    assert!(stdout.contains("still here"), "stdout: {stdout}");
}

#[test]
fn run_subcommand_executes_a_script() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("sum.gos");
    fs::write(
        &script,
        "sum := 0\nfor _, n := range []int{2, 3, 4} {\n\tsum += n\n}\nfmt.Println(sum)\n",
    )
    .expect("write script");

    let output = Command::new(bin_path())
        .arg("run")
        .arg(&script)
        .output()
        .expect("run script");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains('9'));
}

#[test]
fn run_subcommand_fails_on_truncated_scripts() {
    let dir = tempdir().expect("tempdir");
    let script = dir.path().join("broken.gos");
    fs::write(&script, "for {\n").expect("write script");

    let output = Command::new(bin_path())
        .arg("run")
        .arg(&script)
        .output()
        .expect("run script");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unexpected end of file"));
}
