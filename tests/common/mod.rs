//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An `agrilink` command isolated from the caller's environment and user config
pub fn agrilink(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("agrilink"));
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("XDG_DATA_HOME", tmp.path().join(".data"))
        .env_remove("AGRILINK_ACTOR")
        .env_remove("AGRILINK_DATABASE")
        .env_remove("AGRILINK_ENV")
        .env_remove("AGRILINK_LOG")
        .env_remove("AGRILINK_INVITE_SECRET");
    cmd
}

/// Create a workspace in a temp directory
pub fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    agrilink(&tmp).arg("init").assert().success();
    tmp
}

/// Run with JSON output and parse stdout; panics on a non-zero exit
pub fn json(tmp: &TempDir, args: &[&str]) -> Value {
    let output = agrilink(tmp).args(["-f", "json"]).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "agrilink {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Same as [`json`], running as account `actor`
pub fn json_as(tmp: &TempDir, actor: i64, args: &[&str]) -> Value {
    let actor = actor.to_string();
    let mut all = vec!["--as", actor.as_str()];
    all.extend_from_slice(args);
    json(tmp, &all)
}

/// Error body printed to stderr for a failing JSON-mode command
pub fn error_body(tmp: &TempDir, actor: Option<i64>, args: &[&str]) -> Value {
    let mut cmd = agrilink(tmp);
    cmd.args(["-f", "json"]);
    if let Some(actor) = actor {
        cmd.args(["--as", &actor.to_string()]);
    }
    let output = cmd.args(args).output().unwrap();
    assert!(!output.status.success(), "agrilink {:?} unexpectedly succeeded", args);
    serde_json::from_slice(&output.stderr).unwrap()
}

/// Register an account and return its id
pub fn create_account(tmp: &TempDir, email: &str, role: &str) -> i64 {
    let account = json(
        tmp,
        &[
            "account",
            "create",
            "--email",
            email,
            "--first-name",
            "Test",
            "--last-name",
            "User",
            "--role",
            role,
        ],
    );
    account["id"].as_i64().unwrap()
}

/// Create a worker through `applicator` and return the created record
pub fn create_worker(tmp: &TempDir, applicator: i64, email: &str, first_name: &str) -> Value {
    json_as(
        tmp,
        applicator,
        &[
            "worker",
            "create",
            "--email",
            email,
            "--first-name",
            first_name,
            "--last-name",
            "Pilot",
            "--percentage-fee",
            "10",
        ],
    )
}
