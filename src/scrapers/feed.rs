//! RSS and Atom feed extraction.
//!
//! Feeds are deserialized with `quick-xml`'s serde support into one permissive
//! document shape that covers the three formats seen in the wild:
//!
//! - RSS 2.0: `<rss><channel><item>…`
//! - RSS 1.0: `<rdf:RDF><item>…` (items are siblings of `channel`)
//! - Atom: `<feed><entry>…`
//!
//! Each entry becomes an [`Article`] whose `content` is the entry summary with
//! markup removed, clipped to [`SUMMARY_MAX_CHARS`].
//!
//! # Discovery
//!
//! [`probe`] looks for a feed belonging to a site, trying in order:
//!
//! 1. the source URL itself
//! 2. `<link rel="alternate">` feeds advertised by that page
//! 3. conventional paths: `/feed`, `/rss`, `/index.xml`
//!
//! Probes are single-shot requests. A missing feed is normal, so failures are
//! logged at debug level and never surface as errors.

use crate::error::ExtractionError;
use crate::fetch::PageFetch;
use crate::models::{Article, Source};
use crate::scrapers::listing::{MAX_ARTICLES, resolve};
use crate::utils::{clip_chars, strip_markup};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum characters kept from an entry summary.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Paths appended to the source URL when looking for a feed.
pub const FEED_PATHS: [&str; 3] = ["/feed", "/rss", "/index.xml"];

static ALTERNATE_FEEDS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"link[rel~="alternate"][type="application/rss+xml"], link[rel~="alternate"][type="application/atom+xml"]"#,
    )
    .unwrap()
});

#[derive(Debug, Default, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

/// Element text, ignoring any attributes such as Atom's `type="html"`.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<Text>,
    description: Option<Text>,
    #[serde(rename = "content:encoded", alias = "encoded")]
    encoded: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<Text>,
    content: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Format-independent view of one entry before validation.
struct RawEntry {
    title: String,
    link: String,
    summary: String,
}

fn text(node: Option<Text>) -> String {
    node.map(|t| t.value.trim().to_string()).unwrap_or_default()
}

fn first_non_empty(candidates: [Option<Text>; 2]) -> String {
    candidates
        .into_iter()
        .map(text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

impl From<RssItem> for RawEntry {
    fn from(item: RssItem) -> Self {
        RawEntry {
            title: text(item.title),
            link: text(item.link),
            summary: first_non_empty([item.description, item.encoded]),
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(entry: AtomEntry) -> Self {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();
        RawEntry {
            title: text(entry.title),
            link,
            summary: first_non_empty([entry.summary, entry.content]),
        }
    }
}

/// Parse feed XML into at most [`MAX_ARTICLES`] articles.
///
/// Entries without a title or a resolvable link are skipped. Summaries are
/// stripped of markup and clipped to [`SUMMARY_MAX_CHARS`] characters.
///
/// # Errors
///
/// Returns [`ExtractionError::Feed`] when `xml` is not well-formed XML. A
/// well-formed document with no entries (an HTML page, say) is `Ok(vec![])`.
pub fn parse_feed(xml: &str, feed_url: &Url, source: &str) -> Result<Vec<Article>, ExtractionError> {
    let doc: FeedDocument = quick_xml::de::from_str(xml)?;

    let channel_items = doc.channel.map(|c| c.items).unwrap_or_default();
    let entries = channel_items
        .into_iter()
        .chain(doc.items)
        .map(RawEntry::from)
        .chain(doc.entries.into_iter().map(RawEntry::from));

    let articles = entries
        .filter(|e| !e.title.is_empty())
        .filter_map(|e| {
            if e.link.is_empty() {
                return None;
            }
            let url = resolve(feed_url, &e.link)?;
            let mut article = Article::stub(e.title, url, source);
            article.content = clip_chars(&strip_markup(&e.summary), SUMMARY_MAX_CHARS);
            Some(article)
        })
        .unique_by(|a| a.url.clone())
        .take(MAX_ARTICLES)
        .collect();
    Ok(articles)
}

/// Fetch `feed_url` once and parse it. Any failure yields an empty list.
#[instrument(level = "debug", skip(fetcher, source), fields(source = %source.name))]
pub async fn extract_feed<F: PageFetch>(fetcher: &F, feed_url: &str, source: &Source) -> Vec<Article> {
    let Ok(url) = Url::parse(feed_url) else {
        debug!("Not a valid feed URL");
        return Vec::new();
    };
    match fetcher.get_once(feed_url).await {
        Ok(body) => parse_feed(&body, &url, &source.name).unwrap_or_else(|e| {
            debug!(error = %e, "Not a feed");
            Vec::new()
        }),
        Err(e) => {
            debug!(error = %e, "Feed request failed");
            Vec::new()
        }
    }
}

/// Feed links advertised in an HTML page's `<head>`.
pub fn alternate_feeds(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ALTERNATE_FEEDS)
        .filter_map(|l| l.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .map(String::from)
        .unique()
        .collect()
}

/// Conventional feed locations under `site_url`.
pub fn conventional_feeds(site_url: &str) -> Vec<String> {
    let root = site_url.trim_end_matches('/');
    FEED_PATHS.iter().map(|p| format!("{root}{p}")).collect()
}

/// Find a feed for `source` and return its entries.
///
/// The first candidate that yields at least one entry wins. Returns an empty
/// list when no candidate does.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn probe<F: PageFetch>(fetcher: &F, source: &Source) -> Vec<Article> {
    let mut candidates = Vec::new();

    if let Ok(site_url) = Url::parse(&source.url) {
        match fetcher.get_once(&source.url).await {
            Ok(body) => {
                if let Ok(articles) = parse_feed(&body, &site_url, &source.name) {
                    if !articles.is_empty() {
                        info!(feed = %source.url, count = articles.len(), "Source URL is a feed");
                        return articles;
                    }
                }
                candidates.extend(alternate_feeds(&body, &site_url));
            }
            Err(e) => debug!(error = %e, "Source page unavailable for feed discovery"),
        }
    }

    for feed_url in conventional_feeds(&source.url) {
        if !candidates.contains(&feed_url) {
            candidates.push(feed_url);
        }
    }

    for feed_url in &candidates {
        let articles = extract_feed(fetcher, feed_url, source).await;
        if !articles.is_empty() {
            info!(feed = %feed_url, count = articles.len(), "Found feed");
            return articles;
        }
    }
    debug!(tried = candidates.len(), "No feed found");
    Vec::new()
}
