// tests/integration_test.rs
mod common;

use common::{pyproject, Workspace};
use std::process::Command;

fn bumpy() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_bumpy"));
    for var in [
        "PYPROJECT_TOML",
        "PACKAGE_JSON",
        "GIT_ROOT_DIR",
        "RELEASE_TAG",
        "PYPI_URL",
        "CONDA_URL",
        "AZ_ACR_NAME",
        "AZ_ACR_REPO_NAME",
        "GITHUB_OUTPUT",
    ] {
        command.env_remove(var);
    }
    command
}

#[test]
fn test_bumpy_help() {
    let output = bumpy().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("bumpy"));
    assert!(stdout.contains("--check-current"));
}

#[test]
fn test_bumpy_requires_a_request() {
    let output = bumpy().output().expect("Failed to execute command");
    assert!(!output.status.success());
}

#[test]
fn test_bumpy_rejects_unknown_level() {
    let output = bumpy().arg("huge").output().expect("Failed to execute command");
    assert!(!output.status.success());
}

#[test]
fn test_bumpy_patch_via_environment() {
    let ws = Workspace::new("1.0.0", None);

    let output = bumpy()
        .arg("patch")
        .env("GIT_ROOT_DIR", ws.root())
        .current_dir(ws.root())
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(ws.read("pyproject.toml"), pyproject("1.0.1"));
    assert_eq!(ws.local_tags(), vec!["1.0.1"]);
}

#[test]
fn test_bumpy_dirty_repo_fails() {
    let ws = Workspace::new("1.0.0", None);
    ws.write("pyproject.toml", &format!("{}# edited\n", pyproject("1.0.0")));

    let output = bumpy()
        .args(["minor", "--root"])
        .arg(ws.root())
        .current_dir(ws.root())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("uncommitted changes"));
}
