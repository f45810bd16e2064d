//! # Content-Current Baseline
//!
//! Reads the "Content current as of" timestamp from the guidance landing page.
//! This relies on the page keeping a specific structure: the marker text,
//! then (before the next `</time>`) an attribute whose value is an ISO-8601
//! datetime. If that structure changes the run cannot classify anything and
//! must stop.

use crate::constants::CONTENT_CURRENT_MARKER;
use crate::errors::ContentDateError;
use crate::retrieval::Retriever;
use crate::types::{ContentCurrentDate, YearMonth};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::info;

/// Extracts the `(year, month)` baseline from the landing page HTML.
pub fn parse_content_current_date(page: &str) -> Result<ContentCurrentDate, ContentDateError> {
    let fence = Regex::new(&format!(
        r"(?s){}(.*?)</time>",
        regex::escape(CONTENT_CURRENT_MARKER)
    ))?;
    let attribute = Regex::new(r#"="(\d[^"]*)""#)?;

    let region = fence
        .captures(page)
        .and_then(|caps| caps.get(1))
        .ok_or(ContentDateError::MarkerNotFound)?;
    let iso_datetime = attribute
        .captures(region.as_str())
        .and_then(|caps| caps.get(1))
        .ok_or(ContentDateError::MarkerNotFound)?
        .as_str();

    let date_part = iso_datetime.split('T').next().unwrap_or_default();
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ContentDateError::InvalidTimestamp(iso_datetime.to_string()))?;
    YearMonth::new(date.year(), date.month())
        .ok_or_else(|| ContentDateError::InvalidTimestamp(iso_datetime.to_string()))
}

/// Fetches the landing page and parses its baseline.
pub async fn fetch_content_current_date(
    retriever: &dyn Retriever,
    url: &str,
) -> Result<ContentCurrentDate, ContentDateError> {
    let page = retriever.fetch_text(url).await?;
    let date = parse_content_current_date(&page)?;
    info!("Content current year: {}", date.year);
    info!("Content current month: {}", date.month);
    Ok(date)
}
