//! HTTP page fetching with a fixed-delay retry policy.
//!
//! The module uses a trait-based design so the pipeline never talks to
//! `reqwest` directly:
//! - [`PageFetch`]: core trait returning a page body for a URL
//! - [`HttpFetcher`]: real client with a browser user-agent and a timeout
//! - [`RetryFetch`]: decorator that retries any [`PageFetch`] on transient failure
//!
//! # Retry Strategy
//!
//! - 3 attempts in total
//! - Fixed 2 second delay between attempts
//! - The last error is returned once attempts run out; callers never retry again
//!
//! Call volume is small (a handful of sources, five articles each), so a fixed
//! delay is enough and keeps a bad source's worst case easy to reason about:
//! `timeout * attempts + delay * (attempts - 1)`.

use crate::error::FetchError;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use scraper::Html;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Desktop Chrome identity; several listing pages serve bots a stripped page.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// How far into the body a `<meta charset>` declaration is looked for.
const CHARSET_SNIFF_BYTES: usize = 1024;

static CHARSET_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).unwrap());
static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<meta\s[^>]*>").unwrap());

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ATTEMPTS: usize = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Something that can turn a URL into a page body.
pub trait PageFetch {
    /// Fetch `url`, applying whatever resilience policy the implementor has.
    async fn get(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch `url` with a single attempt.
    ///
    /// Used for speculative requests such as feed path probes, where a miss is
    /// the expected outcome and retrying it only adds latency.
    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        self.get(url).await
    }
}

/// Plain `reqwest` client. One attempt per call.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the browser user-agent and the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let t0 = Instant::now();
        let res = self.client.get(parsed).send().await.map_err(request_error)?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = res.bytes().await.map_err(request_error)?;
        let body = decode_body(&bytes, content_type.as_deref());
        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

fn charset_label(haystack: &[u8]) -> Option<&'static Encoding> {
    CHARSET_PARAM
        .captures(haystack)
        .and_then(|caps| Encoding::for_label(&caps[1]))
}

/// Decode a response body to text.
///
/// A byte order mark wins, then the `Content-Type` charset, then a
/// `<meta charset>` or `http-equiv` declaration near the top of the page.
/// Anything else is read as UTF-8. Invalid sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let head = &bytes[..bytes.len().min(CHARSET_SNIFF_BYTES)];
    let encoding = content_type
        .and_then(|ct| charset_label(ct.as_bytes()))
        .or_else(|| {
            META_TAG
                .find_iter(head)
                .find_map(|tag| charset_label(tag.as_bytes()))
        })
        .unwrap_or(UTF_8);
    let (text, used, _) = encoding.decode(bytes);
    if used != UTF_8 {
        debug!(encoding = used.name(), "Decoded non-UTF-8 page");
    }
    text.into_owned()
}

/// Wrapper that adds fixed-delay retries to any [`PageFetch`] implementation.
///
/// ```ignore
/// let http = HttpFetcher::new(DEFAULT_TIMEOUT)?;
/// let fetcher = RetryFetch::new(http, DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY);
/// let html = fetcher.get("https://gigazine.net/").await?;
/// ```
pub struct RetryFetch<T> {
    inner: T,
    /// Total attempts, including the first one. Never less than one.
    attempts: usize,
    delay: Duration,
}

impl<T: PageFetch> RetryFetch<T> {
    pub fn new(inner: T, attempts: usize, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }
}

#[cfg(test)]
impl<T> RetryFetch<T> {
    pub(crate) fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<T: PageFetch> PageFetch for RetryFetch<T> {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.inner.get(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() || attempt >= self.attempts => {
                    error!(attempt, max = self.attempts, error = %e, "Fetch failed");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.attempts,
                        delay = ?self.delay,
                        error = %e,
                        "Retry {}/{}",
                        attempt,
                        self.attempts - 1
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        self.inner.get(url).await
    }
}

/// Fetch `url` and parse it as an HTML document.
pub async fn fetch_document<F: PageFetch>(fetcher: &F, url: &str) -> Result<Html, FetchError> {
    let body = fetcher.get(url).await?;
    Ok(Html::parse_document(&body))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixture-backed fetcher for tests. Never touches the network.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    pub struct FixtureFetcher {
        pages: HashMap<String, String>,
        failing: Vec<String>,
        calls: RefCell<Vec<String>>,
    }

    impl FixtureFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        /// Every request to a URL starting with `prefix` fails with a 503.
        pub fn failing(mut self, prefix: &str) -> Self {
            self.failing.push(prefix.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls.borrow().iter().filter(|u| *u == url).count()
        }
    }

    impl PageFetch for FixtureFetcher {
        async fn get(&self, url: &str) -> Result<String, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            if self.failing.iter().any(|p| url.starts_with(p.as_str())) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                });
            }
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
