//! Error taxonomy for the fetch-and-extract pipeline.
//!
//! Only [`ConfigError`] is allowed to end a run. [`FetchError`] is retried by
//! the fetcher and then absorbed per source or per article, and
//! [`ExtractionError`] is always absorbed into an empty result.

use std::path::PathBuf;
use thiserror::Error;

/// The source list could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is missing or unreadable.
    #[error("cannot read source list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A row or the header could not be parsed.
    #[error("malformed source list {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A network-level failure while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Connection errors, timeouts and non-2xx statuses are transient. A URL
    /// that does not parse will never get better.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl { .. })
    }
}

/// A listing, feed or article page did not have the expected shape.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("not a feed: {0}")]
    Feed(#[from] quick_xml::DeError),
}
