//! Integration tests for the layered configuration system.

use graft::cli::RunContext;
use graft::config::{ConfigLoader, GraftConfig};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_workspace_file_feeds_every_section() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("graft.toml"),
        r#"
[remote]
owner = "octocat"
repo = "hello-world"
branch = "trunk"

[http]
connect_timeout_secs = 3
request_timeout_secs = 7
operation_timeout_secs = 120

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load(temp_dir.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.remote.owner, "octocat");
    assert_eq!(config.remote.branch, "trunk");
    assert_eq!(config.http.connect_timeout_secs, 3);
    assert_eq!(
        config.http.operation_deadline(),
        Some(Duration::from_secs(120))
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_missing_workspace_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigLoader::load(temp_dir.path()).unwrap();

    assert_eq!(config.remote.branch, "main");
    assert_eq!(config.http.operation_deadline(), None);
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_run_context_applies_branch_override() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("graft.toml"),
        "[remote]\nowner = \"octocat\"\nrepo = \"hello-world\"\nbranch = \"trunk\"\n",
    )
    .unwrap();

    let context = RunContext::new(
        temp_dir.path().to_path_buf(),
        None,
        Some("release".to_string()),
    )
    .unwrap();
    assert_eq!(context.config().remote.branch, "release");

    let context = RunContext::new(temp_dir.path().to_path_buf(), None, None).unwrap();
    assert_eq!(context.config().remote.branch, "trunk");
}

#[test]
fn test_config_serializes_without_token_field() {
    // The token is never part of the config shape, so it can never be
    // written back into a file by tooling that round-trips the struct.
    let config = GraftConfig::default();
    let json = serde_json::to_value(&config).unwrap();
    assert!(json.get("token").is_none());
    assert!(json["remote"].get("token").is_none());
}
