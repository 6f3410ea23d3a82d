use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfi").unwrap();
    cmd.env("BFI_CONFIG", "/nonexistent/bfi.toml");
    cmd
}

fn infinite_bf() -> &'static str {
    "+[]" // increments to 1, then [] does nothing forever
}

#[test]
fn step_limit_flag_aborts_infinite_loop() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env_remove("BFI_MAX_STEPS")
        .args(["--max-steps", "50", infinite_bf()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Execution aborted: step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn step_limit_env_applies_to_piped_program() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env("BFI_MAX_STEPS", "50")
        .write_stdin(infinite_bf())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn flag_overrides_env_limit() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env("BFI_MAX_STEPS", "2")
        .args(["--max-steps", "100", "+++++"])
        .assert()
        .success();
}

#[test]
fn finite_program_within_limit_succeeds() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env_remove("BFI_MAX_STEPS")
        .args(["--max-steps", "1000", "++++[-]"])
        .assert()
        .success();
}
