//! # rldwatch-html: Table Extraction
//!
//! Turns a fetched HTML page into header-keyed rows for every `<table>` that
//! carries a given CSS class. The crate knows nothing about drugs or guidance
//! documents; mapping columns onto records is left to the caller.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum HtmlError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

// --- Data Structures ---

/// A single table cell: its visible text and the first link it contains.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub text: String,
    pub href: Option<String>,
}

/// A table with its header row split off from the data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A borrowed view of one data row, addressable by column header.
#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    headers: &'a [String],
    cells: &'a [Cell],
}

impl<'a> TableRow<'a> {
    /// Returns the cell under `column`, or `None` if the table has no such
    /// column or the row is short.
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let index = self.headers.iter().position(|h| h == column)?;
        self.cells.get(index)
    }

    /// Iterates `(header, cell)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&'a str, &'a Cell)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

impl HtmlTable {
    /// Iterates the data rows in document order.
    pub fn records(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(|cells| TableRow {
            headers: &self.headers,
            cells,
        })
    }
}

// --- Extraction ---

fn selector(css: &str) -> Result<Selector, HtmlError> {
    Selector::parse(css).map_err(|e| HtmlError::Selector {
        selector: css.to_string(),
        message: format!("{e:?}"),
    })
}

/// Extracts every `<table>` with the CSS class `class`, in document order.
///
/// The header row is taken from `<thead>` when present, otherwise from the
/// first row made only of `<th>` cells. Every other row with at least one
/// cell becomes a data row.
pub fn extract_tables(html: &str, class: &str) -> Result<Vec<HtmlTable>, HtmlError> {
    let document = Html::parse_document(html);
    let table_selector = selector(&format!("table.{class}"))?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;
    let head_row_selector = selector("thead tr")?;
    let link_selector = selector("a[href]")?;
    let whitespace = Regex::new(r"\s+")?;

    let read_cell = |cell: ElementRef<'_>| -> Cell {
        let raw: String = cell.text().collect();
        let text = whitespace.replace_all(&raw, " ").trim().to_string();
        let href = cell
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|h| h.trim().to_string());
        Cell { text, href }
    };

    let mut tables = Vec::new();
    for table in document.select(&table_selector) {
        let head_row = table.select(&head_row_selector).next();
        let mut headers: Option<Vec<String>> =
            head_row.map(|row| row.select(&cell_selector).map(|c| read_cell(c).text).collect());

        let mut rows = Vec::new();
        for row in table.select(&row_selector) {
            if head_row.is_some_and(|h| h.id() == row.id()) {
                continue;
            }
            let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
            if cells.is_empty() {
                continue;
            }
            let all_th = cells.iter().all(|c| c.value().name() == "th");
            if headers.is_none() && all_th {
                headers = Some(cells.into_iter().map(|c| read_cell(c).text).collect());
                continue;
            }
            rows.push(cells.into_iter().map(read_cell).collect());
        }

        tables.push(HtmlTable {
            headers: headers.unwrap_or_default(),
            rows,
        });
    }
    Ok(tables)
}

/// Resolves a possibly relative `href` against the page it was found on.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}
