/// End-to-end tests: run scripts through the `qs` binary and check what it
/// prints.
///
/// Every run uses a scratch `HOME` and working directory so a real `~/.qsrc`
/// never leaks in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn qs_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qs"))
}

fn run_qs(dir: &Path, args: &[&str]) -> Output {
    Command::new(qs_binary())
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("QSLIBDIR")
        .env_remove("QS_MAX_DEPTH")
        .env_remove("QS_LOG")
        .output()
        .expect("failed to spawn qs binary")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn write_script(dir: &Path, name: &str, src: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, src).expect("write script");
    path.display().to_string()
}

// ── Scripts ───────────────────────────────────────────────────────────────────

#[test]
fn script_prints_through_io() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "hello.qs", "{io:p:hello}");
    let out = run_qs(dir.path(), &[&script]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "hello");
}

#[test]
fn script_output_text_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "quiet.qs", "not shown{clc:1:+:1}");
    let out = run_qs(dir.path(), &[&script]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
}

#[test]
fn script_arguments_are_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "args.qs",
        "{io:p:{v:args-len}}\n{io:p:/{v:args-0}/{v:args-1}}",
    );
    let out = run_qs(dir.path(), &[&script, "alpha", "beta"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "2/alpha/beta");
}

#[test]
fn layout_characters_are_stripped() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "fact.qs",
        "{def:fact:n>\n\t{if:{v:n}:[:1>1>\n\t\t{clc:{v:n}:*:{fact:{clc:{v:n}:-:1}}}}}\n{io:p:{fact:5}}\n",
    );
    let out = run_qs(dir.path(), &[&script]);
    assert_eq!(stdout(&out), "120");
}

#[test]
fn missing_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_qs(dir.path(), &["no-such-script.qs"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("no-such-script.qs"));
}

#[test]
fn no_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_qs(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Usage: qs"));
}

// ── -c ────────────────────────────────────────────────────────────────────────

#[test]
fn command_prints_result() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_qs(dir.path(), &["-c", "{clc:6:*:7}"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "42\n");
}

#[test]
fn command_runs_after_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "lib.qs", "{def:greet:who>hi {v:who}}");
    let out = run_qs(dir.path(), &["-c{greet:there}", &script]);
    assert_eq!(stdout(&out), "hi there\n");
}

#[test]
fn version_is_bound() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_qs(dir.path(), &["-c{v:version}"]);
    assert_eq!(stdout(&out), format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn depth_limit_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_qs(dir.path(), &["-D50", "-c{def:r>{r}}{r}"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("50"));
}

// ── rc file and library dir ───────────────────────────────────────────────────

#[test]
fn rc_file_in_home_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), ".qsrc", "{def:greeting:howdy}");
    let out = run_qs(dir.path(), &["-c{v:greeting}"]);
    assert_eq!(stdout(&out), "howdy\n");
}

#[test]
fn bare_f_skips_rc_file() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), ".qsrc", "{def:greeting:howdy}");
    let out = run_qs(dir.path(), &["-f", "-c[{v:greeting}]"]);
    assert_eq!(stdout(&out), "[]\n");
}

#[test]
fn explicit_rc_file() {
    let dir = tempfile::tempdir().unwrap();
    let rc = write_script(dir.path(), "custom.rc", "{def:greeting:hello}");
    let flag = format!("-f{rc}");
    let out = run_qs(dir.path(), &[&flag, "-c{v:greeting}"]);
    assert_eq!(stdout(&out), "hello\n");
}

#[test]
fn use_searches_library_dir() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib");
    std::fs::create_dir(&lib).unwrap();
    write_script(&lib, "twice.qs", "{def:twice:x>{v:x}{v:x}}");
    let lib_flag = format!("-L{}", lib.display());
    let out = run_qs(dir.path(), &["-f", &lib_flag, "-c{use:twice.qs}{twice:ab}"]);
    assert_eq!(stdout(&out), "abab\n");
}
