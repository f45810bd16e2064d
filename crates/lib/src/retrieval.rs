//! # Resilient Retrieval
//!
//! The network seam of the crate. [`Retriever`] is implemented by
//! [`HttpRetriever`] for real runs and by mocks in tests. Document downloads
//! never return an error: every failure is logged and reported through
//! [`FetchOutcome::Failed`] so one bad document cannot abort a batch.

use crate::constants::{
    DEFAULT_BACKOFF_FACTOR_SECS, DEFAULT_BACKOFF_MAX_SECS, DEFAULT_MAX_RETRIES,
};
use crate::errors::RetrievalError;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Statuses retried only when the server sends a `Retry-After` header.
const RETRY_AFTER_STATUSES: [StatusCode; 3] = [
    StatusCode::PAYLOAD_TOO_LARGE,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::SERVICE_UNAVAILABLE,
];

// --- Retry Policy ---

/// Bounded retries with exponential backoff, shared by every request a
/// retriever makes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: Duration::from_secs_f64(DEFAULT_BACKOFF_FACTOR_SECS),
            backoff_max: Duration::from_secs_f64(DEFAULT_BACKOFF_MAX_SECS),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based): `factor * 2^(retry - 1)`,
    /// capped at `backoff_max`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let multiplier = 2u32.saturating_pow(retry - 1);
        self.backoff_factor
            .saturating_mul(multiplier)
            .min(self.backoff_max)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

// --- Outcomes ---

/// The result of one document retrieval.
#[derive(Debug)]
pub enum FetchOutcome {
    Saved {
        url: String,
        path: PathBuf,
        bytes: usize,
    },
    Failed {
        url: String,
        error: RetrievalError,
    },
}

impl FetchOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FetchOutcome::Saved { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Saved { path, .. } => Some(path),
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RetrievalError> {
        match self {
            FetchOutcome::Saved { .. } => None,
            FetchOutcome::Failed { error, .. } => Some(error),
        }
    }
}

/// The final `/`-separated segment of `url`, used as the saved file name.
pub fn filename_from_url(url: &str) -> Result<&str, RetrievalError> {
    match url.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(RetrievalError::NoFileName(url.to_string())),
    }
}

// --- Retriever Seam ---

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetches a page body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, RetrievalError>;

    /// Downloads `url` into `write_directory`, named after the URL's last
    /// path segment. Never fails: errors come back as [`FetchOutcome::Failed`].
    async fn fetch_and_write(&self, url: &str, write_directory: &Path) -> FetchOutcome;
}

// --- HTTP Implementation ---

#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    policy: RetryPolicy,
}

impl HttpRetriever {
    /// Builds the client once; its timeout and retry policy apply to every call.
    ///
    /// `timeout` bounds the connect and each socket read separately, so a
    /// large document that keeps streaming is never cut off.
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(RetrievalError::Request)?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GETs `url` and reads the whole body, retrying connection failures,
    /// timeouts (while connecting or while reading the body) and throttling
    /// responses. Any final non-2xx status is an error.
    async fn get_with_retries(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        let mut retries = 0;
        loop {
            let can_retry = retries < self.policy.max_retries;
            let retry_after = match self.client.get(url).send().await {
                Ok(response) => {
                    let throttled = RETRY_AFTER_STATUSES.contains(&response.status())
                        && response.headers().contains_key(RETRY_AFTER);
                    if throttled && can_retry {
                        retry_after_delay(&response)
                    } else {
                        match response.error_for_status()?.bytes().await {
                            Ok(body) => return Ok(body.to_vec()),
                            Err(err) if is_transient(&err) && can_retry => {
                                debug!("Reading '{}' failed: {}", url, err);
                                None
                            }
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
                Err(err) if is_transient(&err) && can_retry => {
                    debug!("Attempt {} for '{}' failed: {}", retries + 1, url, err);
                    None
                }
                Err(err) => return Err(err.into()),
            };

            retries += 1;
            let delay = retry_after
                .map(|d| d.min(self.policy.backoff_max))
                .unwrap_or_else(|| self.policy.backoff(retries));
            warn!(
                "Retrying '{}' in {:?} (retry {} of {}).",
                url, delay, retries, self.policy.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn download(
        &self,
        url: &str,
        write_directory: &Path,
    ) -> Result<(PathBuf, usize), RetrievalError> {
        let filename = filename_from_url(url)?;
        let body = self.get_with_retries(url).await?;
        let path = write_directory.join(filename);
        info!("Writing to file: {}", path.display());
        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| RetrievalError::Write {
                path: path.clone(),
                source,
            })?;
        Ok((path, body.len()))
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

fn retry_after_delay(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn fetch_text(&self, url: &str) -> Result<String, RetrievalError> {
        let body = self.get_with_retries(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_and_write(&self, url: &str, write_directory: &Path) -> FetchOutcome {
        match self.download(url, write_directory).await {
            Ok((path, bytes)) => FetchOutcome::Saved {
                url: url.to_string(),
                path,
                bytes,
            },
            Err(error) => {
                warn!("Failed to download '{}' ({}): {}", url, error.kind(), error);
                FetchOutcome::Failed {
                    url: url.to_string(),
                    error,
                }
            }
        }
    }
}
