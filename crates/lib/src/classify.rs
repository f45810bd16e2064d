//! # Interest Classification
//!
//! Decides whether an ingredient record should be retrieved, and keeps the
//! per-kind tally reported at the end of a run.

use crate::errors::MalformedDateError;
use crate::freshness::is_fresh_or_later;
use crate::interest::InterestSet;
use crate::normalize::normalize;
use crate::types::{ContentCurrentDate, IngredientRecord, RldKind, RldValue};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How a matched record's recommendation date compares to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Same month as the content-current date, or later.
    Fresh,
    /// Older than the content-current date.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_of_interest: bool,
    pub kind: RldKind,
    /// `None` when the record did not match, since freshness is only
    /// evaluated for matches.
    pub freshness: Option<Freshness>,
}

/// Classifies one record against the interest set.
///
/// A token match alone makes a record of interest. The freshness gate is then
/// evaluated for matched records only, and a stale date does NOT revoke the
/// match: it is reported in [`Classification::freshness`] but never turns
/// `is_of_interest` back to false. Records that do not match return before
/// the date is looked at, so their dates may be malformed without error.
///
/// A matched record whose date cannot be parsed returns the
/// [`MalformedDateError`]; the caller decides what to do with it.
pub fn classify(
    record: &IngredientRecord,
    reference: ContentCurrentDate,
    interest: &InterestSet,
) -> Result<Classification, MalformedDateError> {
    let normalized = normalize(&record.rld_identifier);
    let is_of_interest = interest.matches_any(&normalized.tokens);

    if !is_of_interest {
        return Ok(Classification {
            is_of_interest,
            kind: normalized.kind,
            freshness: None,
        });
    }

    let fresh = is_fresh_or_later(record.date_recommended.as_deref(), reference)?;
    let freshness = if fresh {
        Freshness::Fresh
    } else {
        debug!(
            "RLD '{}' matched but its date {:?} is older than {}.",
            record.rld_identifier, record.date_recommended, reference
        );
        Freshness::Stale
    };

    Ok(Classification {
        is_of_interest,
        kind: normalized.kind,
        freshness: Some(freshness),
    })
}

// --- Tally ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TallyBucket {
    pub count: usize,
    pub values: Vec<RldValue>,
}

/// Counts and raw values seen per identifier kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    buckets: BTreeMap<RldKind, TallyBucket>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: RldKind, raw: &RldValue) {
        let bucket = self.buckets.entry(kind).or_default();
        bucket.count += 1;
        bucket.values.push(raw.clone());
    }

    pub fn count(&self, kind: RldKind) -> usize {
        self.buckets.get(&kind).map_or(0, |b| b.count)
    }

    pub fn values(&self, kind: RldKind) -> &[RldValue] {
        self.buckets
            .get(&kind)
            .map(|b| b.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }

    /// Logs the counts, then the raw values, for every kind.
    pub fn log_summary(&self) {
        for kind in RldKind::ALL {
            info!("RLD {} count: {}", kind, self.count(kind));
        }
        for kind in RldKind::ALL {
            let values: Vec<String> = self.values(kind).iter().map(ToString::to_string).collect();
            info!("RLD {} list: {:?}", kind, values);
        }
    }
}
