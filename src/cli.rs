//! Command-line interface definitions for news_fetch.
//!
//! Every option has a default, so a bare
//! `news_fetch` reads `templates/news_sources.csv` and prints JSON to stdout.

use crate::content::DEFAULT_MAX_CHARS;
use crate::fetch::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the news_fetch application.
///
/// # Examples
///
/// ```sh
/// # Default source list, JSON on stdout
/// news_fetch > news.json
///
/// # Different source list, longer bodies, written to a file
/// news_fetch -s jp_it_sources.csv --max-content-chars 5000 -o out/news.json
///
/// # Listings and feed summaries only
/// news_fetch --no-content
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV file listing the sources to poll
    #[arg(short, long, env = "NEWS_SOURCES", default_value = "templates/news_sources.csv")]
    pub sources: PathBuf,

    /// Write the JSON document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Character budget for each article body
    #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
    pub max_content_chars: usize,

    /// Skip fetching article pages for body text
    #[arg(long)]
    pub no_content: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Attempts per page before giving up
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    pub retries: usize,

    /// Delay between attempts in seconds
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay_secs: u64,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
