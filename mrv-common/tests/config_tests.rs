//! Configuration resolution tests
//!
//! These mutate process environment variables and must run serially.

use mrv_common::config::{
    load_toml_config, CliOverrides, DashConfig, TomlConfig, DEFAULT_PORT, DEFAULT_STORAGE_BUCKET,
    ENV_BACKEND_KEY, ENV_BACKEND_URL, ENV_CONFIG, ENV_PORT, ENV_STORAGE_BUCKET,
};
use mrv_common::Error;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [ENV_BACKEND_URL, ENV_BACKEND_KEY, ENV_STORAGE_BUCKET, ENV_PORT, ENV_CONFIG] {
        std::env::remove_var(name);
    }
}

fn toml_with_url(url: &str) -> TomlConfig {
    TomlConfig {
        backend_url: Some(url.to_string()),
        ..TomlConfig::default()
    }
}

#[test]
#[serial]
fn test_defaults_apply_when_only_url_given() {
    clear_env();
    let config = DashConfig::from_sources(&CliOverrides::default(), toml_with_url("https://db.example/")).unwrap();

    assert_eq!(config.backend_url, "https://db.example");
    assert_eq!(config.backend_key, "");
    assert_eq!(config.storage_bucket, DEFAULT_STORAGE_BUCKET);
    assert_eq!(config.port, DEFAULT_PORT);
}

#[test]
#[serial]
fn test_missing_backend_url_is_error() {
    clear_env();
    let result = DashConfig::from_sources(&CliOverrides::default(), TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_BACKEND_URL)));
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    std::env::set_var(ENV_BACKEND_URL, "https://env.example");
    std::env::set_var(ENV_STORAGE_BUCKET, "env-bucket");
    std::env::set_var(ENV_PORT, "6100");

    let toml_config = TomlConfig {
        storage_bucket: Some("toml-bucket".to_string()),
        port: Some(6000),
        ..toml_with_url("https://toml.example")
    };
    let config = DashConfig::from_sources(&CliOverrides::default(), toml_config).unwrap();

    assert_eq!(config.backend_url, "https://env.example");
    assert_eq!(config.storage_bucket, "env-bucket");
    assert_eq!(config.port, 6100);
    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    std::env::set_var(ENV_BACKEND_URL, "https://env.example");
    std::env::set_var(ENV_PORT, "6100");

    let cli = CliOverrides {
        backend_url: Some("https://cli.example".to_string()),
        port: Some(7000),
        ..CliOverrides::default()
    };
    let config = DashConfig::from_sources(&cli, TomlConfig::default()).unwrap();

    assert_eq!(config.backend_url, "https://cli.example");
    assert_eq!(config.port, 7000);
    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_port_is_error() {
    clear_env();
    std::env::set_var(ENV_PORT, "not-a-port");

    let result = DashConfig::from_sources(&CliOverrides::default(), toml_with_url("https://db.example"));
    assert!(matches!(result, Err(Error::Config(_))));
    clear_env();
}

#[test]
#[serial]
fn test_resolve_reads_config_file_from_env() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
backend_url = "https://file.example"
storage_bucket = "file-bucket"

[workflows]
reviews_sub_workflow_id = "sub-from-file"

[digests]
stage_prefix = "stage6."
"#
    )
    .unwrap();
    std::env::set_var(ENV_CONFIG, file.path());

    let config = DashConfig::resolve(&CliOverrides::default()).unwrap();
    assert_eq!(config.backend_url, "https://file.example");
    assert_eq!(config.storage_bucket, "file-bucket");
    assert_eq!(config.workflows.reviews_sub_workflow_id, "sub-from-file");
    assert_eq!(config.workflows.movies_workflow_id, "eTbtW2WLgxa6ZqXS");
    assert_eq!(config.digests.stage_prefix, "stage6.");
    assert_eq!(config.digests.extension, ".md");
    clear_env();
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&dir.path().join("absent.toml")).unwrap();
    assert!(config.backend_url.is_none());
}

#[test]
fn test_malformed_config_file_is_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "backend_url = [unterminated").unwrap();

    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}
