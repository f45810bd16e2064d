//! # RLD Guidance Watch
//!
//! This crate checks the regulator's product-specific guidance index for
//! active ingredients whose Reference Listed Drug identifiers an operator
//! tracks, and downloads each matching guidance PDF at most once per run into
//! a fresh, dated output directory.
//!
//! The entry points are [`run_update_check`] and [`run_download_all`]. Network
//! access goes through the [`Retriever`] trait so the whole run can be driven
//! against canned pages in tests.

pub mod classify;
pub mod config;
pub mod constants;
pub mod content_date;
pub mod errors;
pub mod fetcher;
pub mod freshness;
pub mod interest;
pub mod normalize;
pub mod output_dir;
pub mod pipeline;
pub mod retrieval;
pub mod scrape;
pub mod types;

pub use classify::{classify, CategoryTally, Classification, Freshness};
pub use config::{get_config, AppConfig, MalformedDatePolicy};
pub use errors::{
    ConfigError, ContentDateError, InterestSetError, MalformedDateError, RetrievalError, RunError,
};
pub use fetcher::{DedupFetcher, DedupKeyMode, DownloadLedger, FetchDecision, LedgerPolicy};
pub use interest::InterestSet;
pub use pipeline::{run_download_all, run_update_check, RunSummary};
pub use retrieval::{FetchOutcome, HttpRetriever, Retriever, RetryPolicy};
pub use types::{ContentCurrentDate, IngredientRecord, RldKind, RldValue, YearMonth};
