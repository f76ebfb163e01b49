//! # news_fetch
//!
//! Fetches recent articles from a mixed set of news sites and blogs, extracts
//! readable body text, and prints one JSON document for downstream tools (PDF
//! rendering, Slack and email delivery) to consume.
//!
//! ## Features
//!
//! - Per-site discovery rules for Gigazine, Publickey, ASCII.jp, ITmedia,
//!   Buttondown, Hugging Face papers, The Batch, Deeplearn and the AWS blog
//! - RSS/Atom discovery with a generic link-scan fallback for everything else
//! - Body extraction with boilerplate stripping and a character budget
//! - Retries with a fixed delay on network failure
//!
//! ## Usage
//!
//! ```sh
//! news_fetch -s templates/news_sources.csv > news.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: load enabled sources from CSV
//! 2. **Discovery**: pick a strategy chain per source and find up to 5 articles
//! 3. **Back-fill**: fetch each article page that has no summary yet
//! 4. **Output**: one JSON document on stdout; logs on stderr

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod content;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod sources;
mod utils;

use cli::Cli;
use fetch::{HttpFetcher, RetryFetch};
use pipeline::PipelineOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Stdout is reserved for the JSON document.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let sources = match sources::load_sources(&args.sources) {
        Ok(sources) => sources,
        Err(e) => {
            error!(error = %e, "Cannot load source list");
            return Err(e.into());
        }
    };

    let http = HttpFetcher::new(args.timeout())?;
    let fetcher = RetryFetch::new(http, args.retries, args.retry_delay());
    let options = PipelineOptions {
        with_content: !args.no_content,
        max_content_chars: args.max_content_chars,
    };
    let date = Local::now().date_naive().format("%Y-%m-%d").to_string();

    let result = pipeline::run(&fetcher, &sources, &options, &date).await;
    outputs::json::write_result_set(&result, args.output.as_deref()).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        sources = result.sources.len(),
        articles = result.articles.len(),
        "Execution complete"
    );
    Ok(())
}
