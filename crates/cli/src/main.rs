//! # rldwatch
//!
//! Thin entrypoint for the `rldwatch` binary. All logic lives in the
//! `rldwatch_cli` library crate.

use anyhow::Result;
use clap::Parser;
use rldwatch_cli::{log_filter, run, Cli};
use tracing_subscriber::fmt;

// --- Main Application Entry ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Setup logging
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Run and report
    if let Err(e) = run(cli).await {
        eprintln!("[rldwatch error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
