//! # Run Orchestration
//!
//! The two batch modes. Both are strictly sequential: each record is
//! classified and, if needed, downloaded before the next one is looked at.

use crate::classify::{classify, CategoryTally};
use crate::config::{AppConfig, MalformedDatePolicy};
use crate::content_date::fetch_content_current_date;
use crate::errors::RunError;
use crate::fetcher::{DedupFetcher, DownloadLedger, FetchDecision};
use crate::interest::InterestSet;
use crate::output_dir::create_output_directory;
use crate::retrieval::{FetchOutcome, Retriever};
use crate::scrape::{scrape_letters, TableSelection};
use crate::types::ContentCurrentDate;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub url: String,
    pub kind: &'static str,
    pub message: String,
}

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    /// `None` in download-all mode, which does not read the baseline.
    pub content_current: Option<ContentCurrentDate>,
    pub records_seen: usize,
    pub of_interest: usize,
    pub malformed_dates: usize,
    pub attempted: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failures: Vec<FailedDownload>,
    pub tally: CategoryTally,
    #[serde(skip)]
    pub ledger: DownloadLedger,
}

impl RunSummary {
    fn new(output_dir: PathBuf, content_current: Option<ContentCurrentDate>) -> Self {
        Self {
            output_dir,
            content_current,
            records_seen: 0,
            of_interest: 0,
            malformed_dates: 0,
            attempted: 0,
            saved: 0,
            skipped: 0,
            failures: Vec::new(),
            tally: CategoryTally::new(),
            ledger: DownloadLedger::default(),
        }
    }

    fn record_outcome(&mut self, outcome: &FetchOutcome) {
        self.attempted += 1;
        match outcome {
            FetchOutcome::Saved { .. } => self.saved += 1,
            FetchOutcome::Failed { url, error } => self.failures.push(FailedDownload {
                url: url.clone(),
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Downloads the guidance PDFs of every record that matches `interest`, at
/// most once per RLD key.
///
/// The output directory is created first; the content-current baseline is
/// then fetched and a failure there stops the run.
#[instrument(skip_all, fields(interest = interest.len()))]
pub async fn run_update_check(
    config: &AppConfig,
    interest: &InterestSet,
    retriever: &dyn Retriever,
    today: NaiveDate,
) -> Result<RunSummary, RunError> {
    let output_dir =
        create_output_directory(&config.output_root, today).map_err(RunError::OutputDirectory)?;
    let baseline = fetch_content_current_date(retriever, &config.site.content_current_url).await?;
    let records = scrape_letters(retriever, &config.site, TableSelection::All).await?;

    let mut summary = RunSummary::new(output_dir, Some(baseline));
    let mut fetcher = DedupFetcher::new(retriever, config.ledger_policy, config.dedup_key);

    for record in &records {
        summary.records_seen += 1;
        let (kind, is_of_interest) = match classify(record, baseline, interest) {
            Ok(classification) => (classification.kind, classification.is_of_interest),
            Err(source) => {
                let keep = match config.malformed_date {
                    MalformedDatePolicy::Abort => {
                        return Err(RunError::MalformedDate {
                            rld: record.rld_identifier.to_string(),
                            source,
                        })
                    }
                    MalformedDatePolicy::Include => true,
                    MalformedDatePolicy::Skip => false,
                };
                warn!(
                    "RLD '{}' matched but {}; {} it.",
                    record.rld_identifier,
                    source,
                    if keep { "keeping" } else { "skipping" }
                );
                summary.malformed_dates += 1;
                (record.rld_identifier.kind(), keep)
            }
        };
        summary.tally.record(kind, &record.rld_identifier);

        if !is_of_interest {
            continue;
        }
        summary.of_interest += 1;
        let decision = fetcher.maybe_fetch(record, &summary.output_dir).await;
        match decision {
            FetchDecision::Skipped => summary.skipped += 1,
            FetchDecision::Attempted(outcome) => summary.record_outcome(&outcome),
        }
    }

    summary.ledger = fetcher.into_ledger();
    summary.tally.log_summary();
    info!(
        "Run finished: {} of interest, {} saved, {} failed, {} skipped as duplicates.",
        summary.of_interest,
        summary.saved,
        summary.failed(),
        summary.skipped
    );
    Ok(summary)
}

/// Downloads the PDF of every row in the first ingredient table of each
/// letter page, with no interest filtering and no deduplication.
#[instrument(skip_all)]
pub async fn run_download_all(
    config: &AppConfig,
    retriever: &dyn Retriever,
    today: NaiveDate,
) -> Result<RunSummary, RunError> {
    let output_dir =
        create_output_directory(&config.output_root, today).map_err(RunError::OutputDirectory)?;
    let records = scrape_letters(retriever, &config.site, TableSelection::First).await?;

    let mut summary = RunSummary::new(output_dir, None);
    for record in &records {
        summary.records_seen += 1;
        summary
            .tally
            .record(record.rld_identifier.kind(), &record.rld_identifier);
        let Some(url) = record.pdf_url.as_deref() else {
            warn!("No PDF URL for RLD '{}', skipping.", record.rld_identifier);
            continue;
        };
        info!("Downloading from {url}");
        let outcome = retriever.fetch_and_write(url, &summary.output_dir).await;
        summary.record_outcome(&outcome);
    }

    info!(
        "Run finished: {} saved, {} failed.",
        summary.saved,
        summary.failed()
    );
    Ok(summary)
}
