//! Smoke tests for the `ghex` binary.

use crate::common::{mount_latest, release_json};
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use wiremock::MockServer;

fn ghex(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ghex").unwrap();
    cmd.env("HOME", home)
        .env("GHEX_NO_PROGRESS", "1")
        .env_remove("RUST_LOG")
        .env_remove("GHEX_CONFIG_PATH");
    cmd
}

/// Settings file pointing the updater at `server`.
fn write_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, format!("[upgrade]\napi_url = \"{}\"\ntimeout_secs = 5\n", server.uri()))
        .unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    ghex(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update").and(predicate::str::contains("version")));
}

#[test]
fn test_update_help_lists_flags() {
    let home = TempDir::new().unwrap();
    ghex(home.path()).args(["update", "--help"]).assert().success().stdout(
        predicate::str::contains("--check")
            .and(predicate::str::contains("--changelog"))
            .and(predicate::str::contains("--rollback"))
            .and(predicate::str::contains("--force"))
            .and(predicate::str::contains("--yes")),
    );
}

#[test]
fn test_version_command() {
    let home = TempDir::new().unwrap();
    ghex(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("ghex v{}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_unknown_flag_fails() {
    let home = TempDir::new().unwrap();
    ghex(home.path()).args(["update", "--bogus"]).assert().failure();
}

#[tokio::test]
async fn test_check_reports_up_to_date() {
    let server = MockServer::start().await;
    let tag = format!("v{}", env!("CARGO_PKG_VERSION"));
    mount_latest(&server, &release_json(&server, &tag, &[])).await;

    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &server);
    let home_path = home.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        ghex(&home_path).args(["update", "--check", "--config"]).arg(&config).assert()
    })
    .await
    .unwrap();

    assert.success().stdout(predicate::str::contains("already running the latest version"));
}

#[tokio::test]
async fn test_check_reports_available_update_without_installing() {
    let server = MockServer::start().await;
    mount_latest(&server, &release_json(&server, "v99.0.0", &[])).await;

    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &server);
    let home_path = home.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        ghex(&home_path)
            .env("GHEX_CONFIG_PATH", &config)
            .args(["update", "-c"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("v99.0.0").and(predicate::str::contains("ghex update")));
    assert!(!home.path().join(".ghex").join("backup").exists());
}

#[tokio::test]
async fn test_check_failure_exits_nonzero() {
    // No mocks mounted: every request is a 404
    let server = MockServer::start().await;

    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &server);
    let home_path = home.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        ghex(&home_path).args(["update", "--check", "--config"]).arg(&config).assert()
    })
    .await
    .unwrap();

    assert.failure().stderr(predicate::str::contains("No releases found"));
}

#[cfg(unix)]
#[test]
fn test_rollback_without_backup_fails() {
    let home = TempDir::new().unwrap();
    ghex(home.path())
        .args(["update", "--rollback", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No backup available"));
}
