//! # Letter Page Scraping
//!
//! Walks the per-letter index pages and maps every ingredient table row onto
//! an [`IngredientRecord`] using the configured column names.

use crate::config::SiteConfig;
use crate::errors::RunError;
use crate::retrieval::Retriever;
use crate::types::{IngredientRecord, RldValue};
use rldwatch_html::{extract_tables, resolve_href, HtmlError, TableRow};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Which ingredient tables of a letter page to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSelection {
    /// Every matching table, in document order.
    All,
    /// Only the first matching table.
    First,
}

fn pdf_url_from_row(row: &TableRow<'_>, page_url: &str, site: &SiteConfig) -> Option<String> {
    let cell = row.get(&site.pdf_url_column)?;
    if cell.text.starts_with("http://") || cell.text.starts_with("https://") {
        return Some(cell.text.clone());
    }
    if let Some(href) = cell.href.as_deref() {
        return resolve_href(page_url, href).or_else(|| Some(href.to_string()));
    }
    (!cell.text.is_empty()).then(|| cell.text.clone())
}

fn record_from_row(row: &TableRow<'_>, page_url: &str, site: &SiteConfig) -> IngredientRecord {
    let rld_identifier = row
        .get(&site.rld_column)
        .map(|cell| RldValue::from_cell_text(&cell.text))
        .unwrap_or(RldValue::Null);
    let date_recommended = row
        .get(&site.date_column)
        .map(|cell| cell.text.clone())
        .filter(|text| !text.is_empty());
    let extra: BTreeMap<String, String> = row
        .columns()
        .filter(|(header, _)| {
            *header != site.pdf_url_column
                && *header != site.rld_column
                && *header != site.date_column
        })
        .map(|(header, cell)| (header.to_string(), cell.text.clone()))
        .collect();

    IngredientRecord {
        pdf_url: pdf_url_from_row(row, page_url, site),
        rld_identifier,
        date_recommended,
        extra,
    }
}

/// Parses one letter page into records.
pub fn records_from_page(
    html: &str,
    page_url: &str,
    site: &SiteConfig,
    selection: TableSelection,
) -> Result<Vec<IngredientRecord>, HtmlError> {
    let tables = extract_tables(html, &site.table_class)?;
    let take = match selection {
        TableSelection::All => tables.len(),
        TableSelection::First => 1,
    };
    Ok(tables
        .iter()
        .take(take)
        .flat_map(|table| table.records())
        .map(|row| record_from_row(&row, page_url, site))
        .collect())
}

/// Fetches every configured letter page in order and collects their records.
///
/// A page that cannot be fetched stops the run. A page without any ingredient
/// table is logged and skipped.
pub async fn scrape_letters(
    retriever: &dyn Retriever,
    site: &SiteConfig,
    selection: TableSelection,
) -> Result<Vec<IngredientRecord>, RunError> {
    let mut records = Vec::new();
    for letter in site.letters.chars().filter(|c| !c.is_whitespace()) {
        info!("Looking at active ingredients beginning with {letter}");
        let url = site.letter_url(letter);
        let html = retriever
            .fetch_text(&url)
            .await
            .map_err(|source| RunError::LetterPage {
                url: url.clone(),
                source,
            })?;
        let page_records = records_from_page(&html, &url, site, selection).map_err(|source| {
            RunError::Html {
                url: url.clone(),
                source,
            }
        })?;
        if page_records.is_empty() {
            warn!("No '{}' rows found for letter {letter}.", site.table_class);
        }
        debug!("Letter {letter}: {} records.", page_records.len());
        records.extend(page_records);
    }
    info!("Collected {} active ingredient records.", records.len());
    Ok(records)
}
