//! # Configuration Loading Tests
//!
//! These tests mutate process environment variables, so they run serially.

use rldwatch::config::{get_config, MalformedDatePolicy};
use rldwatch::errors::ConfigError;
use rldwatch::fetcher::{DedupKeyMode, LedgerPolicy};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

const ENV_VARS: [&str; 3] = [
    "RLDWATCH_RETRIEVAL__MAX_RETRIES",
    "RLDWATCH_MALFORMED_DATE",
    "TEST_RLD_OUTPUT_ROOT",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_file_or_env() {
    clear_env();

    let config = get_config(None).unwrap();

    assert_eq!(config.output_root, PathBuf::from("."));
    assert_eq!(config.retrieval.max_retries, 5);
    assert_eq!(config.retrieval.timeout(), Duration::from_secs(5));
    assert_eq!(config.ledger_policy, LedgerPolicy::MarkOnAttempt);
    assert_eq!(config.dedup_key, DedupKeyMode::Raw);
    assert_eq!(config.malformed_date, MalformedDatePolicy::Include);
    assert_eq!(config.site.table_class, "drugTable");
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("RLDWATCH_RETRIEVAL__MAX_RETRIES", "2");
    env::set_var("RLDWATCH_MALFORMED_DATE", "skip");

    let config = get_config(None);
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.retrieval.max_retries, 2);
    assert_eq!(config.malformed_date, MalformedDatePolicy::Skip);
}

#[test]
#[serial]
fn test_yaml_file_with_substitution() {
    // --- Arrange ---
    clear_env();
    let dir = tempdir().unwrap();
    let output_root = dir.path().join("runs");
    env::set_var("TEST_RLD_OUTPUT_ROOT", output_root.to_str().unwrap());
    let path = dir.path().join("rldwatch.yml");
    fs::write(
        &path,
        r#"
output_root: "${TEST_RLD_OUTPUT_ROOT}"
ledger_policy: mark_on_success
dedup_key: tokens
site:
  letters: "XYZ"
retrieval:
  backoff_factor_secs: 0.5
"#,
    )
    .unwrap();

    // --- Act ---
    let config = get_config(Some(&path));
    clear_env();
    let config = config.unwrap();

    // --- Assert ---
    assert_eq!(config.output_root, output_root);
    assert_eq!(config.ledger_policy, LedgerPolicy::MarkOnSuccess);
    assert_eq!(config.dedup_key, DedupKeyMode::Tokens);
    assert_eq!(config.site.letters, "XYZ");
    // Unset keys keep their defaults.
    assert_eq!(config.site.rld_column, "RLD or RS Number");
    let policy = config.retrieval.retry_policy().unwrap();
    assert_eq!(policy.backoff_factor, Duration::from_millis(500));
    assert_eq!(policy.backoff(2), Duration::from_secs(1));
}

#[test]
#[serial]
fn test_missing_override_file_is_not_found() {
    clear_env();
    let dir = tempdir().unwrap();

    let err = get_config(Some(&dir.path().join("absent.yml"))).unwrap_err();

    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
#[serial]
fn test_template_without_placeholder_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    fs::write(
        &path,
        "site:\n  letter_url_template: \"https://guidance.test/psg\"\n",
    )
    .unwrap();

    let err = get_config(Some(&path)).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "site.letter_url_template",
            ..
        }
    ));
}
