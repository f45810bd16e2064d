//! # `rldwatch` Library Crate
//!
//! Argument parsing and dispatch for the `rldwatch` binary. Configuration is
//! loaded through [`rldwatch::get_config`] and command-line flags are applied
//! on top of it.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rldwatch::{
    get_config, run_download_all, run_update_check, AppConfig, DedupKeyMode, HttpRetriever,
    InterestSet, LedgerPolicy, MalformedDatePolicy, RldKind, RunSummary,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const MISSING_RLD_FILE_MESSAGE: &str =
    "An input RLD identifiers file is required to use this script.";

/// Log directives used when `RUST_LOG` is unset, empty or invalid.
pub const DEFAULT_LOG_FILTER: &str = "rldwatch=info,rldwatch_cli=info";

/// Builds the log filter from the `RUST_LOG` value. A usable value replaces
/// the defaults entirely.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Newline-delimited file of RLD identifiers to watch.
    pub rld_file: Option<PathBuf>,

    /// Download every listed guidance PDF instead of checking for updates.
    #[arg(long)]
    pub all: bool,

    /// YAML configuration file. Defaults to `./rldwatch.yml` when present.
    #[arg(long, env = "RLDWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory under which the dated run directory is created.
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// `mark_on_attempt` or `mark_on_success`.
    #[arg(long)]
    pub ledger_policy: Option<LedgerPolicy>,

    /// `raw` or `tokens`.
    #[arg(long)]
    pub dedup_key: Option<DedupKeyMode>,

    /// `abort`, `include` or `skip`.
    #[arg(long)]
    pub malformed_date: Option<MalformedDatePolicy>,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(policy) = self.ledger_policy {
            config.ledger_policy = policy;
        }
        if let Some(mode) = self.dedup_key {
            config.dedup_key = mode;
        }
        if let Some(policy) = self.malformed_date {
            config.malformed_date = policy;
        }
    }
}

// --- Main Logic ---

pub async fn run(cli: Cli) -> Result<()> {
    let interest = if cli.all {
        None
    } else {
        let Some(path) = cli.rld_file.as_deref() else {
            println!("{MISSING_RLD_FILE_MESSAGE}");
            return Ok(());
        };
        Some(InterestSet::load(path)?)
    };

    let mut config = get_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    info!("Writing run output under '{}'.", config.output_root.display());

    let retriever = HttpRetriever::new(
        config.retrieval.timeout(),
        config.retrieval.retry_policy()?,
    )
    .context("Failed to build HTTP client")?;
    let today = Local::now().date_naive();

    let summary = match interest {
        Some(interest) => run_update_check(&config, &interest, &retriever, today).await?,
        None => run_download_all(&config, &retriever, today).await?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Output directory: {}", summary.output_dir.display());
    if let Some(date) = summary.content_current {
        println!("Content current as of: {date}");
    }
    println!("Records seen: {}", summary.records_seen);
    println!("Of interest: {}", summary.of_interest);
    println!(
        "Downloads: {} saved, {} failed, {} skipped",
        summary.saved,
        summary.failed(),
        summary.skipped
    );
    for kind in RldKind::ALL {
        println!("RLD {} count: {}", kind, summary.tally.count(kind));
    }
    for failure in &summary.failures {
        println!("  failed [{}] {}: {}", failure.kind, failure.url, failure.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "rldwatch",
            "rlds.txt",
            "--ledger-policy",
            "mark_on_success",
            "--dedup-key",
            "tokens",
            "--malformed-date",
            "abort",
            "--json",
        ]);
        assert_eq!(cli.rld_file, Some(PathBuf::from("rlds.txt")));
        assert_eq!(cli.ledger_policy, Some(LedgerPolicy::MarkOnSuccess));
        assert_eq!(cli.dedup_key, Some(DedupKeyMode::Tokens));
        assert_eq!(cli.malformed_date, Some(MalformedDatePolicy::Abort));
        assert!(cli.json);
        assert!(!cli.all);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::parse_from(["rldwatch", "--all", "--output-root", "/tmp/runs"]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.output_root, PathBuf::from("/tmp/runs"));
        assert_eq!(config.ledger_policy, LedgerPolicy::MarkOnAttempt);
    }

    #[test]
    fn test_rust_log_replaces_default_filter() {
        let filter = log_filter(Some("rldwatch=debug")).to_string();
        assert!(filter.contains("rldwatch=debug"), "{filter}");
        assert!(!filter.contains("rldwatch=info"), "{filter}");
    }

    #[test]
    fn test_default_filter_without_rust_log() {
        for rust_log in [None, Some(""), Some("  ")] {
            let filter = log_filter(rust_log).to_string();
            assert!(filter.contains("rldwatch=info"), "{filter}");
            assert!(filter.contains("rldwatch_cli=info"), "{filter}");
        }
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(Cli::try_parse_from(["rldwatch", "--malformed-date", "ignore"]).is_err());
    }
}
