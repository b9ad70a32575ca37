//! Integration tests for the CLI binary
//!
//! Only commands that need no network are run here.

use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_transit-cli"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("TRANSITMAP_CONFIG")
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn normalize_extracts_l_parameter() {
    let output = run(&[
        "normalize",
        "A=1@O=S+U Alexanderplatz@X=13411267@Y=52521508@U=86@L=900100003@",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "900100003");
}

#[test]
fn normalize_takes_last_colon_segment() {
    let output = run(&["normalize", "de:11000:900100003"]);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "900100003");
}

#[test]
fn normalize_passes_plain_code_through() {
    let output = run(&["normalize", "900100003"]);
    assert_eq!(stdout_of(&output), "900100003");
}

#[test]
fn help_lists_subcommands() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let help = stdout_of(&output);
    for command in ["stops", "search", "departures", "planner-departures", "vehicles", "route", "normalize", "watch"] {
        assert!(help.contains(command), "missing {command} in help");
    }
}

#[test]
fn missing_subcommand_fails() {
    let output = run(&[]);
    assert!(!output.status.success());
}

#[test]
fn missing_config_file_fails() {
    let output = run(&["--config", "/nonexistent/transit-map.toml", "search", "Alex"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading configuration"));
}

#[test]
fn invalid_latitude_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("transit-map.toml");
    std::fs::write(&config, "").unwrap();

    let output = run(&[
        "--config",
        config.to_str().unwrap(),
        "stops",
        "--lat",
        "123.0",
    ]);
    assert!(!output.status.success());
}
