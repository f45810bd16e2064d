//! # Deduplicating Fetcher
//!
//! Makes sure each distinct RLD triggers at most one download per run. The
//! ledger lives only as long as the fetcher; nothing is persisted.

use crate::errors::{ConfigError, RetrievalError};
use crate::normalize::normalize;
use crate::retrieval::{FetchOutcome, Retriever};
use crate::types::{IngredientRecord, RldValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

// --- Policies ---

/// When a ledger key counts as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPolicy {
    /// Mark after any attempt, so a failed download is not retried for a
    /// later record with the same key.
    #[default]
    MarkOnAttempt,
    /// Mark only after the file was written.
    MarkOnSuccess,
}

impl FromStr for LedgerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mark_on_attempt" => Ok(LedgerPolicy::MarkOnAttempt),
            "mark_on_success" => Ok(LedgerPolicy::MarkOnSuccess),
            _ => Err(ConfigError::InvalidValue {
                field: "ledger_policy",
                value: s.to_string(),
            }),
        }
    }
}

/// What the ledger is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKeyMode {
    /// The raw identifier cell. `"123 456"` and `"456 123"` are distinct keys,
    /// as are the integer `123` and the string `"123"`.
    #[default]
    Raw,
    /// The normalized token set, so differently formatted cells naming the
    /// same RLDs share one key.
    Tokens,
}

impl FromStr for DedupKeyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(DedupKeyMode::Raw),
            "tokens" => Ok(DedupKeyMode::Tokens),
            _ => Err(ConfigError::InvalidValue {
                field: "dedup_key",
                value: s.to_string(),
            }),
        }
    }
}

// --- Ledger ---

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    Raw(RldValue),
    Tokens(BTreeSet<String>),
}

impl LedgerKey {
    pub fn for_record(record: &IngredientRecord, mode: DedupKeyMode) -> Self {
        match mode {
            DedupKeyMode::Raw => LedgerKey::Raw(record.rld_identifier.clone()),
            DedupKeyMode::Tokens => LedgerKey::Tokens(normalize(&record.rld_identifier).tokens),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadLedger {
    entries: HashMap<LedgerKey, bool>,
}

impl DownloadLedger {
    pub fn is_marked(&self, key: &LedgerKey) -> bool {
        self.entries.get(key).copied().unwrap_or(false)
    }

    /// Convenience lookup for the default raw keying.
    pub fn is_marked_raw(&self, raw: &RldValue) -> bool {
        self.is_marked(&LedgerKey::Raw(raw.clone()))
    }

    fn mark(&mut self, key: LedgerKey) {
        self.entries.insert(key, true);
    }

    pub fn len(&self) -> usize {
        self.entries.values().filter(|done| **done).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// --- Fetcher ---

#[derive(Debug)]
pub enum FetchDecision {
    /// The key was already in the ledger; nothing was fetched.
    Skipped,
    Attempted(FetchOutcome),
}

pub struct DedupFetcher<'a> {
    retriever: &'a dyn Retriever,
    ledger: DownloadLedger,
    policy: LedgerPolicy,
    key_mode: DedupKeyMode,
}

impl<'a> DedupFetcher<'a> {
    pub fn new(retriever: &'a dyn Retriever, policy: LedgerPolicy, key_mode: DedupKeyMode) -> Self {
        Self {
            retriever,
            ledger: DownloadLedger::default(),
            policy,
            key_mode,
        }
    }

    pub fn ledger(&self) -> &DownloadLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> DownloadLedger {
        self.ledger
    }

    /// Downloads the record's PDF unless its key is already in the ledger.
    ///
    /// A record without a PDF URL counts as an attempt that failed with
    /// [`RetrievalError::MissingUrl`]; no request is made.
    pub async fn maybe_fetch(
        &mut self,
        record: &IngredientRecord,
        write_directory: &Path,
    ) -> FetchDecision {
        let key = LedgerKey::for_record(record, self.key_mode);
        if self.ledger.is_marked(&key) {
            debug!(
                "PDF for RLD '{}' already downloaded this run, skipping.",
                record.rld_identifier
            );
            return FetchDecision::Skipped;
        }

        let outcome = match record.pdf_url.as_deref() {
            Some(url) => self.retriever.fetch_and_write(url, write_directory).await,
            None => FetchOutcome::Failed {
                url: String::new(),
                error: RetrievalError::MissingUrl,
            },
        };

        if let FetchOutcome::Saved { path, .. } = &outcome {
            info!("Created {} PDF file", path.display());
        }
        if outcome.is_saved() || self.policy == LedgerPolicy::MarkOnAttempt {
            self.ledger.mark(key);
        }
        FetchDecision::Attempted(outcome)
    }
}
