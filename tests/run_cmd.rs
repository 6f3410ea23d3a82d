use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfi").unwrap();
    cmd.env("BFI_CONFIG", "/nonexistent/bfi.toml");
    for var in ["BFI_MEMORY", "BFI_BRACKETS", "BFI_EOF", "BFI_MAX_STEPS", "BFI_SHELL_MODE", "BFI_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn print_a() -> String {
    format!("{}.", "+".repeat(65))
}

fn hello_world() -> &'static str {
    "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>."
}

fn read_to_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn positional_code_runs() {
    cargo_bin()
        .arg(print_a())
        .assert()
        .success()
        .stdout("A")
        .stderr(predicate::str::is_empty());
}

#[test]
fn positional_parts_are_concatenated() {
    cargo_bin()
        .args(["++++++++[>++++++++", "<-]>+."])
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn file_code_runs() {
    let tf = read_to_tempfile(hello_world());
    cargo_bin()
        .arg("--file")
        .arg(tf.path())
        .assert()
        .success()
        .stdout("Hello World!\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn piped_stdin_is_the_program() {
    cargo_bin()
        .write_stdin(print_a())
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn empty_pipe_runs_nothing() {
    cargo_bin()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn newline_flag_appends_newline() {
    cargo_bin()
        .arg("-n")
        .arg(print_a())
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn comments_are_ignored() {
    let tf = read_to_tempfile(&format!("print the letter A\n{}\n# done\n", print_a()));
    cargo_bin()
        .arg("-f")
        .arg(tf.path())
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn file_and_code_together_is_a_usage_error() {
    let tf = read_to_tempfile("+");
    cargo_bin()
        .arg("--file")
        .arg(tf.path())
        .arg("+")
        .assert()
        .code(2);
}

#[test]
fn missing_file_reports_error() {
    cargo_bin()
        .arg("--file")
        .arg("/nonexistent/program.bf")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read code file"));
}

#[test]
fn help_goes_to_stderr_and_exits_zero() {
    cargo_bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("--memory")));
}

#[test]
fn high_bytes_are_written_raw() {
    cargo_bin()
        .args(["--", "-."])
        .assert()
        .success()
        .stdout(vec![255u8]);
}

#[test]
fn cursor_wraps_on_small_tape() {
    // On a 2-cell tape, '>>' returns to cell 0.
    cargo_bin()
        .args(["-m", "2", &format!(">>{}", print_a())])
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn eof_policy_flag_controls_input_at_end() {
    cargo_bin()
        .args(["--eof", "unchanged", "+++,."])
        .assert()
        .success()
        .stdout(vec![3u8]);

    cargo_bin()
        .args(["--eof", "zero", "+++,."])
        .assert()
        .success()
        .stdout(vec![0u8]);
}

#[test]
fn memory_env_is_used_and_flag_overrides_it() {
    cargo_bin()
        .env("BFI_MEMORY", "0")
        .arg("+")
        .assert()
        .code(1);

    cargo_bin()
        .env("BFI_MEMORY", "0")
        .args(["-m", "5", "+"])
        .assert()
        .success();
}

#[test]
fn config_file_sets_defaults() {
    let config = read_to_tempfile("[engine]\nmax_steps = 10\n");
    cargo_bin()
        .env("BFI_CONFIG", config.path())
        .arg("+[]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (10)"));
}
