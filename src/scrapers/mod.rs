//! Article discovery for each configured source.
//!
//! This module contains the source dispatcher and the extractors it drives.
//! Every source goes through the same two steps:
//!
//! 1. **Selection**: [`Site::select`] matches the source against a fixed host table
//! 2. **Discovery**: the site's [`Strategy`] chain runs until one strategy returns articles
//!
//! # Strategies
//!
//! | Strategy | Module | Method |
//! |----------|--------|--------|
//! | [`Strategy::Selectors`] | [`listing`] | Site-specific CSS selectors on the listing page |
//! | [`Strategy::Pattern`] | [`listing`] | Every anchor whose href matches a predicate |
//! | [`Strategy::Containers`] | [`listing`] | First link in each post-like container |
//! | [`Strategy::KnownFeed`] | [`feed`] | The source URL parsed directly as a feed |
//! | [`Strategy::FeedProbe`] | [`feed`] | Feed discovery under the source URL |
//!
//! A strategy that fails (network error after retries, bad markup) is logged
//! and counts as an empty result, so the next strategy in the chain still
//! runs. A source whose whole chain comes up empty contributes no articles.

pub mod feed;
pub mod listing;
pub mod sites;

pub use sites::Site;

use crate::error::{ExtractionError, FetchError};
use crate::fetch::{PageFetch, fetch_document};
use crate::models::{Article, Source};
use listing::LinkPredicate;
use scraper::Html;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// One way of finding articles for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Anchors matched by `css`, optionally filtered by resolved URL and
    /// resolved against a fixed `base` instead of the listing URL.
    Selectors {
        css: &'static str,
        url_filter: Option<LinkPredicate>,
        base: Option<&'static str>,
    },
    /// Every anchor whose raw href passes `predicate`.
    Pattern {
        predicate: LinkPredicate,
        title_min_len: usize,
    },
    /// First link inside containers whose class contains one of `class_tokens`.
    Containers {
        class_tokens: &'static [&'static str],
        title_min_len: usize,
    },
    /// The source URL is itself a feed.
    KnownFeed,
    /// Look for a feed next to the source URL.
    FeedProbe,
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// The listing page of one source, fetched on first use.
///
/// Every listing strategy in a chain reads the same page, so it is requested
/// once per source. A failed fetch is reported to the first strategy that
/// asked for it; later strategies see no page and come up empty.
#[derive(Debug)]
pub struct ListingPage<'s> {
    url: &'s str,
    state: ListingState,
}

#[derive(Debug)]
enum ListingState {
    Unfetched,
    Ready(Html),
    Failed,
}

impl<'s> ListingPage<'s> {
    pub fn new(url: &'s str) -> Self {
        Self {
            url,
            state: ListingState::Unfetched,
        }
    }

    async fn document<F: PageFetch>(&mut self, fetcher: &F) -> Result<Option<&Html>, FetchError> {
        if matches!(self.state, ListingState::Unfetched) {
            match fetch_document(fetcher, self.url).await {
                Ok(document) => self.state = ListingState::Ready(document),
                Err(e) => {
                    self.state = ListingState::Failed;
                    return Err(e);
                }
            }
        }
        match &self.state {
            ListingState::Ready(document) => Ok(Some(document)),
            _ => Ok(None),
        }
    }
}

impl Strategy {
    /// Run this strategy against `source`.
    ///
    /// Listing strategies read `listing`, which fetches the source URL at most
    /// once across the whole chain.
    ///
    /// # Errors
    ///
    /// Fetch failures and invalid selectors are returned so the caller can log
    /// them. Feed strategies never fail; a missing feed is just empty.
    pub async fn run<F: PageFetch>(
        &self,
        fetcher: &F,
        source: &Source,
        listing: &mut ListingPage<'_>,
    ) -> Result<Vec<Article>, ExtractionError> {
        let articles = match *self {
            Strategy::Selectors {
                css,
                url_filter,
                base,
            } => {
                let page_url = parse_url(&source.url)?;
                let base = base.map(parse_url).transpose()?.unwrap_or(page_url);
                let Some(document) = listing.document(fetcher).await? else {
                    return Ok(Vec::new());
                };
                listing::scan_selectors(document, &base, &source.name, css, url_filter)?
            }
            Strategy::Pattern {
                predicate,
                title_min_len,
            } => {
                let base = parse_url(&source.url)?;
                let Some(document) = listing.document(fetcher).await? else {
                    return Ok(Vec::new());
                };
                listing::scan_anchors(document, &base, &source.name, predicate, title_min_len)
            }
            Strategy::Containers {
                class_tokens,
                title_min_len,
            } => {
                let base = parse_url(&source.url)?;
                let Some(document) = listing.document(fetcher).await? else {
                    return Ok(Vec::new());
                };
                listing::scan_containers(document, &base, &source.name, class_tokens, title_min_len)
            }
            Strategy::KnownFeed => feed::extract_feed(fetcher, &source.url, source).await,
            Strategy::FeedProbe => feed::probe(fetcher, source).await,
        };
        Ok(articles)
    }
}

/// Discover articles for `source`.
///
/// Runs the chain of the [`Site`] the source maps to and returns the first
/// non-empty result. Never fails: errors are logged and the chain moves on.
///
/// # Returns
///
/// Up to [`listing::MAX_ARTICLES`] articles in discovery order, possibly none.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_source<F: PageFetch>(fetcher: &F, source: &Source) -> Vec<Article> {
    let site = Site::select(source);
    debug!(?site, url = %source.url, "Selected site");

    let mut listing = ListingPage::new(&source.url);
    for strategy in site.chain() {
        match strategy.run(fetcher, source, &mut listing).await {
            Ok(articles) if !articles.is_empty() => {
                info!(?strategy, count = articles.len(), "Strategy found articles");
                return articles;
            }
            Ok(_) => debug!(?strategy, "Strategy found nothing"),
            Err(e) => warn!(?strategy, error = %e, "Strategy failed"),
        }
    }
    warn!(?site, "No articles found");
    Vec::new()
}
