use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

// Piped stdin puts the shell in bare mode: no prompt, one line at a time.
fn shell() -> Command {
    let mut cmd = Command::cargo_bin("bfi").unwrap();
    cmd.env("BFI_CONFIG", "/nonexistent/bfi.toml")
        .env_remove("BFI_SHELL_MODE")
        .env_remove("BFI_MEMORY")
        .env_remove("BFI_MAX_STEPS")
        .timeout(Duration::from_secs(5))
        .arg("-i");
    cmd
}

#[test]
fn quit_command_ends_the_session() {
    shell()
        .write_stdin("+++\n$d\n$q\n$d\n")
        .assert()
        .success()
        .stdout("3\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn eof_ends_the_session() {
    shell()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn tape_persists_between_lines() {
    shell()
        .write_stdin("++++++++[>++++++++<-]\n>+\n$lxd\n.\n")
        .assert()
        .success()
        .stdout("1\n0x41\n65\nA");
}

#[test]
fn window_shows_neighbourhood() {
    shell()
        .args(["-m", "10"])
        .write_stdin("+++++++\n$w\n")
        .assert()
        .success()
        .stdout("val: 0x00 0x00 0x07 0x00 0x00\nptr: 8    9    0    1    2\n");
}

#[test]
fn reset_command_zeroes_memory() {
    shell()
        .write_stdin(">+++\n$r\n$ld\n")
        .assert()
        .success()
        .stdout("Memory zeroed\n0\n0\n");
}

#[test]
fn newline_toggle_and_flag() {
    shell()
        .write_stdin("$n\n+.\n$n\n+.\n")
        .assert()
        .success()
        .stdout(b"Newlines: on\n\x01\nNewlines: off\n\x02".to_vec());

    shell()
        .arg("-n")
        .write_stdin("+.\n")
        .assert()
        .success()
        .stdout(b"\x01\n".to_vec());
}

#[test]
fn unknown_command_is_reported() {
    shell()
        .write_stdin("$?\n")
        .assert()
        .success()
        .stdout("Unknown command: ?\n");
}

#[test]
fn invalid_line_is_reported_and_shell_continues() {
    shell()
        .write_stdin("+\n]\n$d\n")
        .assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("Parse error: unmatched bracket ']'"));
}

#[test]
fn small_tape_wraps_cursor() {
    shell()
        .args(["-m", "3"])
        .write_stdin("<\n$l\n>>\n$l\n")
        .assert()
        .success()
        .stdout("2\n1\n");
}

#[test]
fn code_argument_runs_before_the_shell() {
    shell()
        .arg("+++")
        .write_stdin("$d\n")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn input_instruction_reads_following_stdin() {
    shell()
        .write_stdin(",.\nZ\n$q\n")
        .assert()
        .success()
        .stdout("Z");
}

#[test]
fn help_command_lists_commands() {
    shell()
        .write_stdin("$h\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:").and(predicate::str::contains("Print a window")));
}

#[test]
fn step_limit_applies_per_line() {
    shell()
        .args(["--max-steps", "20"])
        .write_stdin("+[]\n$d\n")
        .assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("step limit exceeded (20)"));
}

#[test]
fn forced_editor_on_non_tty_errors() {
    shell()
        .env("BFI_SHELL_MODE", "editor")
        .write_stdin("+\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stdin is not a TTY"));
}
