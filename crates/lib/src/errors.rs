use rldwatch_html::HtmlError;
use std::path::PathBuf;
use thiserror::Error;

/// A `Date Recommended` value that cannot be read as `MM/YYYY`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedDateError {
    #[error("date recommended is missing")]
    Missing,
    #[error("date recommended '{0}' is not in MM/YYYY form")]
    Shape(String),
    #[error("date recommended '{0}' has a non-numeric month or year")]
    NotNumeric(String),
    #[error("date recommended '{0}' is not a calendar month")]
    OutOfRange(String),
}

/// The content-current baseline could not be determined. Always fatal.
#[derive(Error, Debug)]
pub enum ContentDateError {
    #[error("'Content current as of' timestamp not found on the guidance page")]
    MarkerNotFound,
    #[error("Invalid content current timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("Failed to fetch the guidance page: {0}")]
    Fetch(#[from] RetrievalError),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Why a single retrieval did not produce a file.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Record has no PDF URL")]
    MissingUrl,
    #[error("Cannot derive a file name from URL '{0}'")]
    NoFileName(String),
    #[error("Request returned HTTP status {status}")]
    Status { status: u16 },
    #[error("Connection failed: {0}")]
    Connect(reqwest::Error),
    #[error("Request timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("Request failed: {0}")]
    Request(reqwest::Error),
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetrievalError::Timeout(err)
        } else if err.is_connect() {
            RetrievalError::Connect(err)
        } else if let Some(status) = err.status() {
            RetrievalError::Status {
                status: status.as_u16(),
            }
        } else {
            RetrievalError::Request(err)
        }
    }
}

impl RetrievalError {
    /// A short, stable label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::MissingUrl => "missing_url",
            RetrievalError::NoFileName(_) => "no_file_name",
            RetrievalError::Status { .. } => "http_status",
            RetrievalError::Connect(_) => "connection",
            RetrievalError::Timeout(_) => "timeout",
            RetrievalError::Request(_) => "request",
            RetrievalError::Write { .. } => "write",
        }
    }
}

#[derive(Error, Debug)]
pub enum InterestSetError {
    #[error("Failed to read RLD identifiers file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    General(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// Errors that stop a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    ContentDate(#[from] ContentDateError),
    #[error("Failed to create output directory: {0}")]
    OutputDirectory(#[source] std::io::Error),
    #[error("Failed to fetch letter page '{url}': {source}")]
    LetterPage {
        url: String,
        #[source]
        source: RetrievalError,
    },
    #[error("Failed to parse letter page '{url}': {source}")]
    Html {
        url: String,
        #[source]
        source: HtmlError,
    },
    #[error("Malformed date recommended for RLD '{rld}': {source}")]
    MalformedDate {
        rld: String,
        #[source]
        source: MalformedDateError,
    },
}
