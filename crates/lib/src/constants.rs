//! # Shared Constants
//!
//! This module provides a centralized location for the site addresses and
//! column names used across the workspace. Configuration defaults are built
//! from these values, so no other module hard-codes them.

/// The product-specific guidance landing page that carries the
/// "Content current as of" timestamp.
pub const PSG_GENERIC_DRUG_DEVELOPMENT_URL: &str =
    "https://www.fda.gov/drugs/guidances-drugs/product-specific-guidances-generic-drug-development";

/// The per-letter search page. `{letter}` is replaced with an upper-case letter.
pub const PSG_WITH_LETTER_URL_TEMPLATE: &str =
    "https://www.accessdata.fda.gov/scripts/cder/psg/index.cfm?event=Home.Letter&searchLetter={letter}#letterSearchBar";

/// The placeholder substituted in [`PSG_WITH_LETTER_URL_TEMPLATE`].
pub const LETTER_PLACEHOLDER: &str = "{letter}";

/// The letters searched in order.
pub const DEFAULT_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The CSS class of the ingredient tables on a letter page.
pub const DRUG_TABLE_CLASS: &str = "drugTable";

/// Column holding the guidance PDF address.
pub const PDF_URL_KEY: &str = "URL";

/// Column holding the RLD or RS identifier(s).
pub const RLD_KEY: &str = "RLD or RS Number";

/// Column holding the `MM/YYYY` recommendation date.
pub const DATE_RECOMMENDED_KEY: &str = "Date Recommended";

/// The text that introduces the content-current timestamp.
pub const CONTENT_CURRENT_MARKER: &str = "Content current as of";

/// Default per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default exponential backoff factor, in seconds.
pub const DEFAULT_BACKOFF_FACTOR_SECS: f64 = 1.0;

/// Upper bound on any single retry delay, in seconds.
pub const DEFAULT_BACKOFF_MAX_SECS: f64 = 120.0;

/// Name of the optional configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rldwatch.yml";

/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "RLDWATCH";
