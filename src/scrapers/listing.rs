//! Article link discovery on HTML listing pages.
//!
//! Three scans are available, all working on an already parsed document:
//!
//! | Scan | Finds | Used by |
//! |------|-------|---------|
//! | [`scan_anchors`] | every `a[href]` whose href passes a [`LinkPredicate`] | all sites, generic fallback |
//! | [`scan_selectors`] | anchors matched by a site-specific CSS selector list | Gigazine, Publickey, ASCII, ITmedia |
//! | [`scan_containers`] | first link inside each post-like container | Deeplearn |
//!
//! Every scan resolves hrefs against a base URL, drops non-HTTP results,
//! deduplicates by exact resolved URL and stops at [`MAX_ARTICLES`].

use crate::error::ExtractionError;
use crate::models::Article;
use crate::utils::inline_text;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Upper bound on articles returned per source.
pub const MAX_ARTICLES: usize = 5;

/// Minimum title length, in characters, for selector-matched links.
pub const SELECTOR_TITLE_MIN_CHARS: usize = 10;

/// Containers inspected by [`scan_containers`] before giving up.
pub const MAX_CONTAINERS: usize = 10;

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+/").unwrap());
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static CLASSED_CONTAINERS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article[class], div[class]").unwrap());

/// Classifies an href (or resolved URL) as a likely article link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPredicate {
    /// Any non-empty href.
    NonEmpty,
    /// Absolute `http`/`https` links only.
    Absolute,
    Contains(&'static str),
    ContainsAny(&'static [&'static str]),
    /// Contains `needle` but none of `except`.
    ContainsExcept {
        needle: &'static str,
        except: &'static [&'static str],
    },
    /// Contains `needle` and ends with `suffix`.
    ContainsWithSuffix {
        needle: &'static str,
        suffix: &'static str,
    },
    /// Has a purely numeric path segment, e.g. `/elem/000/004/123/4123456/`.
    NumericSegment,
}

impl LinkPredicate {
    pub fn matches(&self, href: &str) -> bool {
        match *self {
            LinkPredicate::NonEmpty => !href.is_empty(),
            LinkPredicate::Absolute => href.starts_with("http"),
            LinkPredicate::Contains(needle) => href.contains(needle),
            LinkPredicate::ContainsAny(needles) => needles.iter().any(|n| href.contains(n)),
            LinkPredicate::ContainsExcept { needle, except } => {
                href.contains(needle) && !except.iter().any(|e| href.contains(e))
            }
            LinkPredicate::ContainsWithSuffix { needle, suffix } => {
                href.contains(needle) && href.ends_with(suffix)
            }
            LinkPredicate::NumericSegment => NUMERIC_SEGMENT.is_match(href),
        }
    }
}

/// Resolve `href` against `base`, keeping only fetchable web URLs.
/// Resolve `href` against `base`, keeping only http(s) results.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => None,
        Err(e) => {
            debug!(%base, href, error = %e, "Unresolvable href");
            None
        }
    }
}

/// Resolve, filter, deduplicate and cap a stream of `(title, href)` candidates.
fn collect_links<'a>(
    candidates: impl Iterator<Item = (String, &'a str)>,
    base: &Url,
    source: &str,
    keep: impl Fn(&Url) -> bool,
) -> Vec<Article> {
    candidates
        .filter_map(|(title, href)| resolve(base, href).map(|url| (title, url)))
        .filter(|(_, url)| keep(url))
        .unique_by(|(_, url)| url.to_string())
        .take(MAX_ARTICLES)
        .map(|(title, url)| Article::stub(title, url, source))
        .collect()
}

fn anchor_candidate(anchor: ElementRef<'_>) -> Option<(String, &str)> {
    let href = anchor.value().attr("href")?;
    Some((inline_text(anchor), href))
}

/// Generic pattern scan over every anchor in the document.
///
/// Keeps anchors whose title is longer than `title_min_len` characters and
/// whose raw href satisfies `predicate`.
///
/// # Arguments
///
/// * `document` - Parsed listing page
/// * `base` - URL the page was fetched from, used to resolve relative hrefs
/// * `source` - Source name copied into each article
/// * `predicate` - Per-site href classifier
/// * `title_min_len` - Titles must be strictly longer than this
pub fn scan_anchors(
    document: &Html,
    base: &Url,
    source: &str,
    predicate: LinkPredicate,
    title_min_len: usize,
) -> Vec<Article> {
    let candidates = document
        .select(&ANCHORS)
        .filter_map(anchor_candidate)
        .filter(|(title, href)| title.chars().count() > title_min_len && predicate.matches(href));
    collect_links(candidates, base, source, |_| true)
}

/// Site-specific structural scan.
///
/// `css` is a selector list pointing at anchors (e.g. `article h2 a`). Titles
/// need at least [`SELECTOR_TITLE_MIN_CHARS`] characters; when `url_filter` is
/// set it is applied to the resolved URL, not the raw href.
///
/// # Errors
///
/// Returns [`ExtractionError::Selector`] if `css` does not parse.
pub fn scan_selectors(
    document: &Html,
    base: &Url,
    source: &str,
    css: &str,
    url_filter: Option<LinkPredicate>,
) -> Result<Vec<Article>, ExtractionError> {
    let selector = parse_selector(css)?;
    let candidates = document
        .select(&selector)
        .filter_map(anchor_candidate)
        .filter(|(title, _)| title.chars().count() >= SELECTOR_TITLE_MIN_CHARS);
    Ok(collect_links(candidates, base, source, |url| {
        url_filter.is_none_or(|p| p.matches(url.as_str()))
    }))
}

/// Container scan for sites without a stable heading shape.
///
/// Looks at up to [`MAX_CONTAINERS`] `article`/`div` elements whose class
/// contains one of `class_tokens` (case-insensitive) and takes the first link
/// of each, provided its title is longer than `title_min_len`.
pub fn scan_containers(
    document: &Html,
    base: &Url,
    source: &str,
    class_tokens: &[&str],
    title_min_len: usize,
) -> Vec<Article> {
    let candidates = document
        .select(&CLASSED_CONTAINERS)
        .filter(|el| {
            let class = el.value().attr("class").unwrap_or_default().to_lowercase();
            class_tokens.iter().any(|t| class.contains(t))
        })
        .take(MAX_CONTAINERS)
        .filter_map(|container| container.select(&ANCHORS).next())
        .filter_map(anchor_candidate)
        .filter(|(title, _)| title.chars().count() > title_min_len);
    collect_links(candidates, base, source, |_| true)
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}
