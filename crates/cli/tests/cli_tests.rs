//! CLI integration tests

use std::process::Command;

fn trustctl() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_trustctl"));
    command.env_remove("TRUSTCTL_API_URL");
    command
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = trustctl()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Metric Trust Engine"),
        "Should show app name"
    );
    for command in ["dashboard", "status", "evaluate", "push", "reset", "threshold", "inject", "audit"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = trustctl()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("trustctl"), "Should show binary name");
}

/// Test push subcommand help
#[test]
fn test_push_help() {
    let output = trustctl()
        .args(["push", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Push help should succeed");
    assert!(stdout.contains("--file"), "Should show file option");
}

/// Test audit subcommand help
#[test]
fn test_audit_help() {
    let output = trustctl()
        .args(["audit", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Audit help should succeed");
    assert!(stdout.contains("--limit"), "Should show limit option");
}

/// Threshold requires a numeric value
#[test]
fn test_threshold_rejects_non_numeric_value() {
    let output = trustctl()
        .args(["threshold", "margin", "high"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Non-numeric threshold should fail");
}

/// Test invalid format option
#[test]
fn test_invalid_format() {
    let output = trustctl()
        .args(["--format", "invalid", "dashboard"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid format should fail");
}

/// Unreachable agent is reported as an error, not a panic
#[test]
fn test_unreachable_agent_fails_cleanly() {
    let output = trustctl()
        .args(["--api-url", "http://127.0.0.1:1", "dashboard"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unreachable agent should fail");
    assert!(
        stderr.contains("Failed to send request"),
        "Should explain the failure"
    );
}
