//! # Application Configuration
//!
//! This module defines the configuration structure for a run and the logic for
//! loading it in layers:
//!
//! 1. Built-in defaults (every struct is `#[serde(default)]`, seeded from
//!    [`crate::constants`]).
//! 2. An optional YAML file (`--config` path, or `rldwatch.yml` in the working
//!    directory). `${VAR}` references in the file are substituted from the
//!    environment.
//! 3. `RLDWATCH_`-prefixed environment variables, with `__` separating nested
//!    keys (e.g. `RLDWATCH_RETRIEVAL__MAX_RETRIES=2`).
//!
//! Command-line flags are applied on top by the binary.

use crate::constants::{
    DATE_RECOMMENDED_KEY, DEFAULT_BACKOFF_FACTOR_SECS,
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_CONFIG_FILE, DEFAULT_LETTERS, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT_SECS, DRUG_TABLE_CLASS, ENV_PREFIX, LETTER_PLACEHOLDER,
    PDF_URL_KEY, PSG_GENERIC_DRUG_DEVELOPMENT_URL, PSG_WITH_LETTER_URL_TEMPLATE, RLD_KEY,
};
use crate::errors::ConfigError;
use crate::fetcher::{DedupKeyMode, LedgerPolicy};
use crate::retrieval::RetryPolicy;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// What to do with a matched record whose `Date Recommended` is unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedDatePolicy {
    /// Stop the run with an error.
    Abort,
    /// Log a warning and keep the record as of interest.
    #[default]
    Include,
    /// Log a warning and treat the record as not of interest.
    Skip,
}

impl FromStr for MalformedDatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(MalformedDatePolicy::Abort),
            "include" => Ok(MalformedDatePolicy::Include),
            "skip" => Ok(MalformedDatePolicy::Skip),
            _ => Err(ConfigError::InvalidValue {
                field: "malformed_date",
                value: s.to_string(),
            }),
        }
    }
}

/// Where the guidance index lives and how its tables are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// The page carrying the "Content current as of" timestamp.
    pub content_current_url: String,
    /// Per-letter page address; must contain `{letter}`.
    pub letter_url_template: String,
    /// Letters searched, in order.
    pub letters: String,
    pub table_class: String,
    pub pdf_url_column: String,
    pub rld_column: String,
    pub date_column: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_current_url: PSG_GENERIC_DRUG_DEVELOPMENT_URL.to_string(),
            letter_url_template: PSG_WITH_LETTER_URL_TEMPLATE.to_string(),
            letters: DEFAULT_LETTERS.to_string(),
            table_class: DRUG_TABLE_CLASS.to_string(),
            pdf_url_column: PDF_URL_KEY.to_string(),
            rld_column: RLD_KEY.to_string(),
            date_column: DATE_RECOMMENDED_KEY.to_string(),
        }
    }
}

impl SiteConfig {
    pub fn letter_url(&self, letter: char) -> String {
        self.letter_url_template
            .replace(LETTER_PLACEHOLDER, &letter.to_string())
    }
}

/// Timeout and retry settings for every request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_factor_secs: f64,
    pub backoff_max_secs: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor_secs: DEFAULT_BACKOFF_FACTOR_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let seconds = |field: &'static str, value: f64| {
            Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidValue {
                field,
                value: value.to_string(),
            })
        };
        Ok(RetryPolicy {
            max_retries: self.max_retries,
            backoff_factor: seconds("retrieval.backoff_factor_secs", self.backoff_factor_secs)?,
            backoff_max: seconds("retrieval.backoff_max_secs", self.backoff_max_secs)?,
        })
    }
}

/// The root configuration structure, mapping directly to `rldwatch.yml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory under which the `YYYY-MM-DD-run-N` directory is created.
    pub output_root: PathBuf,
    pub site: SiteConfig,
    pub retrieval: RetrievalConfig,
    pub ledger_policy: LedgerPolicy,
    pub dedup_key: DedupKeyMode,
    pub malformed_date: MalformedDatePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            site: SiteConfig::default(),
            retrieval: RetrievalConfig::default(),
            ledger_policy: LedgerPolicy::default(),
            dedup_key: DedupKeyMode::default(),
            malformed_date: MalformedDatePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Rejects settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.site.letter_url_template.contains(LETTER_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                field: "site.letter_url_template",
                value: self.site.letter_url_template.clone(),
            });
        }
        if self.site.letters.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "site.letters",
                value: self.site.letters.clone(),
            });
        }
        if self.retrieval.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.timeout_secs",
                value: "0".to_string(),
            });
        }
        self.retrieval.retry_policy().map(|_| ())
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::General(format!(
            "Failed to read config file '{}': {e}",
            path.display()
        ))
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the run configuration from an optional YAML file and the environment.
///
/// An explicit `config_path_override` must exist. Without one,
/// `rldwatch.yml` in the working directory is used if present.
pub fn get_config(config_path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{}'.", path.display()))
            })?;
            info!("Loading configuration from '{}'.", path.display());
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if let Some(content) = read_and_substitute(default_path)? {
                info!("Loading configuration from '{}'.", default_path.display());
                builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
            }
        }
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_url_substitution() {
        let site = SiteConfig {
            letter_url_template: "http://localhost/psg?letter={letter}".to_string(),
            ..Default::default()
        };
        assert_eq!(site.letter_url('Q'), "http://localhost/psg?letter=Q");
    }

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        config.validate().unwrap();
        let policy = config.retrieval.retry_policy().unwrap();
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(config.retrieval.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_negative_backoff_is_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.backoff_factor_secs = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "retrieval.backoff_factor_secs", .. })
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<MalformedDatePolicy>().unwrap(), MalformedDatePolicy::Skip);
        assert!("maybe".parse::<MalformedDatePolicy>().is_err());
    }
}
