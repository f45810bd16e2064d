//! # Shared Test Utilities
//!
//! A canned [`Retriever`] and small HTML page builders, so runs can be driven
//! end to end without touching the network.

use async_trait::async_trait;
use rldwatch::errors::RetrievalError;
use rldwatch::retrieval::{filename_from_url, FetchOutcome, Retriever};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

// --- Tracing ---

static INIT: Once = Once::new();

/// Installs a test subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// --- Mock Retriever ---

#[derive(Clone, Debug, Default)]
pub struct MockRetriever {
    pages: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    text_calls: Arc<Mutex<Vec<String>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MockRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` for `fetch_text(url)`.
    pub fn add_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    /// Makes every download of `url` fail with HTTP 500.
    pub fn fail_download(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// URLs passed to `fetch_text`, in call order.
    pub fn text_calls(&self) -> Vec<String> {
        self.text_calls.lock().unwrap().clone()
    }

    /// URLs passed to `fetch_and_write`, in call order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn fetch_text(&self, url: &str) -> Result<String, RetrievalError> {
        self.text_calls.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(RetrievalError::Status { status: 404 })
    }

    async fn fetch_and_write(&self, url: &str, write_directory: &Path) -> FetchOutcome {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url) {
            return FetchOutcome::Failed {
                url: url.to_string(),
                error: RetrievalError::Status { status: 500 },
            };
        }
        let filename = match filename_from_url(url) {
            Ok(name) => name,
            Err(error) => {
                return FetchOutcome::Failed {
                    url: url.to_string(),
                    error,
                }
            }
        };
        let path = write_directory.join(filename);
        let body = format!("%PDF-1.4 mock body for {url}");
        match std::fs::write(&path, body.as_bytes()) {
            Ok(()) => FetchOutcome::Saved {
                url: url.to_string(),
                path,
                bytes: body.len(),
            },
            Err(source) => FetchOutcome::Failed {
                url: url.to_string(),
                error: RetrievalError::Write { path, source },
            },
        }
    }
}

// --- Page Builders ---

/// A landing page carrying the "Content current as of" timestamp.
pub fn content_current_page(iso_datetime: &str) -> String {
    format!(
        r#"<html><body>
<dl>
  <div class="lcds-description-list__item-heading">Content current as of:</div>
  <div class="lcds-description-list__item-text">
    <p><time datetime="{iso_datetime}">as of</time></p>
  </div>
</dl>
</body></html>"#
    )
}

/// One ingredient table row: `(ingredient, rld, date recommended, pdf url)`.
pub type DrugRow<'a> = (&'a str, &'a str, &'a str, &'a str);

fn drug_table(rows: &[DrugRow<'_>]) -> String {
    let body: String = rows
        .iter()
        .map(|(ingredient, rld, date, url)| {
            format!("<tr><td>{ingredient}</td><td>{rld}</td><td>{date}</td><td>{url}</td></tr>\n")
        })
        .collect();
    format!(
        r#"<table class="drugTable">
<thead><tr><th>Active Ingredient</th><th>RLD or RS Number</th><th>Date Recommended</th><th>URL</th></tr></thead>
<tbody>
{body}</tbody>
</table>"#
    )
}

/// A letter page holding one ingredient table.
pub fn drug_table_page(rows: &[DrugRow<'_>]) -> String {
    drug_tables_page(&[rows])
}

/// A letter page holding several ingredient tables, in order.
pub fn drug_tables_page(tables: &[&[DrugRow<'_>]]) -> String {
    let tables: String = tables.iter().map(|rows| drug_table(rows)).collect();
    format!("<html><body>\n{tables}\n</body></html>")
}
