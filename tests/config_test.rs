use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use shopcheck::config::{AppConfig, TEST_ENV_VAR};
use shopcheck::error::CheckError;

const SAMPLE: &str = r#"{
    "environments": {
        "local": {"name": "Local", "baseUrl": "http://localhost:3000", "basePath": "/"},
        "staging": {"name": "Staging", "baseUrl": "https://staging.fashionhub.example", "basePath": "/shop"},
        "production": {"name": "Production", "baseUrl": "https://fashionhub.example", "basePath": "/shop"}
    },
    "github": {"exampleRepo": "https://github.com/microsoft/playwright"},
    "credentials": {"demo": {"username": "demouser", "password": "fashion123"}}
}"#;

fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("shopcheck.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn loads_and_validates_sample_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SAMPLE);
    let config = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(config.environments.len(), 3);
    assert_eq!(config.environments[0].0, "local");
    assert_eq!(
        config.github.example_repo,
        "https://github.com/microsoft/playwright"
    );
    let creds = config.credentials("demo").unwrap();
    assert_eq!(creds.username, "demouser");
    assert_eq!(creds.password, "fashion123");
}

#[test]
fn missing_document_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, CheckError::Configuration(_)));
}

#[test]
fn malformed_document_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "{ not json");
    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("malformed"));
}

#[test]
fn zero_environments_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{"environments": {}, "github": {"exampleRepo": "https://github.com/x/y"}}"#,
    );
    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("no environments"));
}

#[test]
fn invalid_base_url_is_rejected_with_entry_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "environments": {"broken": {"baseUrl": "no scheme here", "basePath": "/"}},
            "github": {"exampleRepo": "https://github.com/x/y"}
        }"#,
    );
    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
#[serial]
fn test_env_var_selects_staging_regardless_of_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SAMPLE);
    let config = AppConfig::load(Some(&path)).unwrap();

    std::env::set_var(TEST_ENV_VAR, "staging");
    std::env::set_var("APP_ENV", "local");
    let resolved = config.resolve(None).unwrap();
    std::env::remove_var(TEST_ENV_VAR);
    std::env::remove_var("APP_ENV");

    assert_eq!(resolved.name.as_deref(), Some("Staging"));
}

#[test]
#[serial]
fn cli_override_beats_test_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, SAMPLE);
    let config = AppConfig::load(Some(&path)).unwrap();

    std::env::set_var(TEST_ENV_VAR, "staging");
    let resolved = config.resolve(Some("local")).unwrap();
    std::env::remove_var(TEST_ENV_VAR);

    assert_eq!(resolved.name.as_deref(), Some("Local"));
}
