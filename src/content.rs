//! Readable body text extraction for article pages.
//!
//! Non-content elements are detached from the tree before anything else,
//! since every later step reads raw visible text and would otherwise pick up
//! menus, cookie banners and inline scripts. The body is then taken from the
//! first strategy in [`BODY_CHAIN`] that produces text.

use crate::fetch::{PageFetch, fetch_document};
use crate::utils::{
    block_text, inline_text, normalize_whitespace, truncate_for_log, truncate_with_ellipsis,
};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

/// Default body budget in characters.
pub const DEFAULT_MAX_CHARS: usize = 3000;

/// Paragraphs must be longer than this to survive the fallback.
pub const MIN_PARAGRAPH_CHARS: usize = 50;

/// Class tokens that mark a content container, tried in this order.
pub const CONTENT_CLASS_TOKENS: [&str; 4] =
    ["content", "post-content", "article-content", "entry-content"];

static NON_CONTENT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, header, footer, aside, iframe, noscript").unwrap()
});
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static CLASSED_DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div[class]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// One way of locating the body of an article page.
#[derive(Debug, Clone, Copy)]
pub enum BodyStrategy {
    /// Text of the first `<article>` with any text.
    Article,
    /// Text of the first `<main>` with any text.
    Main,
    /// Text of the first `div` whose class contains a token, tokens tried in order.
    ContentClass(&'static [&'static str]),
    /// Every paragraph longer than the given number of characters, one per line.
    LongParagraphs(usize),
}

/// Strategies tried in order until one returns non-empty text.
pub const BODY_CHAIN: [BodyStrategy; 4] = [
    BodyStrategy::Article,
    BodyStrategy::Main,
    BodyStrategy::ContentClass(&CONTENT_CLASS_TOKENS),
    BodyStrategy::LongParagraphs(MIN_PARAGRAPH_CHARS),
];

fn first_text<'a>(mut elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    elements.find_map(|el| Some(block_text(el)).filter(|t| !t.is_empty()))
}

impl BodyStrategy {
    /// Run against the attached tree only; detached chrome is never matched.
    pub fn extract(&self, document: &Html) -> Option<String> {
        let root = document.root_element();
        match *self {
            BodyStrategy::Article => first_text(root.select(&ARTICLE)),
            BodyStrategy::Main => first_text(root.select(&MAIN)),
            BodyStrategy::ContentClass(tokens) => tokens.iter().find_map(|token| {
                first_text(root.select(&CLASSED_DIV).filter(|div| {
                    div.value()
                        .attr("class")
                        .is_some_and(|c| c.to_lowercase().contains(token))
                }))
            }),
            BodyStrategy::LongParagraphs(min_chars) => {
                let text = root
                    .select(&PARAGRAPH)
                    .map(inline_text)
                    .filter(|p| p.chars().count() > min_chars)
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(text).filter(|t| !t.is_empty())
            }
        }
    }
}

/// Detach script, style, navigation and other chrome from the tree.
pub fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Extract raw body text from a parsed article page.
///
/// The document is modified: non-content elements are removed first. Returns
/// an empty string when no strategy finds any text.
pub fn extract_body(document: &mut Html) -> String {
    strip_non_content(document);
    for strategy in BODY_CHAIN {
        if let Some(text) = strategy.extract(document) {
            debug!(?strategy, chars = text.chars().count(), "Body extracted");
            return text;
        }
    }
    String::new()
}

/// Normalize whitespace and apply the character budget.
pub fn finish_body(raw: &str, max_chars: usize) -> String {
    truncate_with_ellipsis(&normalize_whitespace(raw), max_chars)
}

/// Fetch an article page and return its cleaned, truncated body text.
///
/// # Arguments
///
/// * `fetcher` - Page fetcher (retries are its concern)
/// * `url` - Article URL
/// * `max_chars` - Character budget; longer bodies get a `...` suffix
///
/// # Returns
///
/// The body text, or an empty string if the page could not be fetched or had
/// no recognizable content. Failures are logged, never returned.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_content<F: PageFetch>(fetcher: &F, url: &str, max_chars: usize) -> String {
    let mut document = match fetch_document(fetcher, url).await {
        Ok(document) => document,
        Err(e) => {
            warn!(error = %e, "Article fetch failed");
            return String::new();
        }
    };
    let raw = extract_body(&mut document);
    if raw.is_empty() {
        warn!("No body text found");
        return String::new();
    }
    let body = finish_body(&raw, max_chars);
    debug!(
        chars = body.chars().count(),
        preview = %truncate_for_log(&body, 80),
        "Article body ready"
    );
    body
}
