//! Text helpers shared by the extractors.
//!
//! - Visible-text collection from `scraper` elements
//! - Whitespace normalization for extracted bodies
//! - Character-based truncation (never splits a UTF-8 sequence)

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

/// Suffix appended when [`truncate_with_ellipsis`] cuts a body short.
pub const ELLIPSIS: &str = "...";

/// Visible text of an element on a single line.
///
/// Text nodes are trimmed and joined with a single space; runs of whitespace
/// inside a node collapse too. Used for link titles and paragraphs.
pub fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of an element, one trimmed text node per line.
///
/// Empty nodes are dropped, so markup-only whitespace never produces blank lines.
pub fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop markup from an HTML fragment such as a feed summary.
pub fn strip_markup(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    inline_text(html.root_element())
}

/// Collapse 3+ consecutive newlines to 2 and repeated spaces to 1, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = BLANK_LINES.replace_all(text, "\n\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

/// First `max` characters of `s`, with no marker.
pub fn clip_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate `s` to `max` characters and append [`ELLIPSIS`] if anything was cut.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
/// assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
/// ```
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}{}", &s[..idx], ELLIPSIS),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_truncate_long_body() {
        let body = "a".repeat(6000);
        let out = truncate_with_ellipsis(&body, 3000);
        assert_eq!(out.chars().count(), 3000 + ELLIPSIS.len());
        assert!(out.ends_with("..."));
        assert!(out.starts_with(&"a".repeat(3000)));
    }

    #[test]
    fn test_truncate_short_body_unchanged() {
        let body = "b".repeat(2000);
        assert_eq!(truncate_with_ellipsis(&body, 3000), body);
    }

    #[test]
    fn test_truncate_exact_budget_unchanged() {
        let body = "c".repeat(3000);
        assert_eq!(truncate_with_ellipsis(&body, 3000), body);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let body = "日本語のニュース".repeat(10);
        let out = truncate_with_ellipsis(&body, 5);
        assert_eq!(out, "日本語のニ...");
        assert_eq!(clip_chars(&body, 3), "日本語");
    }

    #[test]
    fn test_normalize_whitespace() {
        let text = "  First line\n\n\n\nSecond    line  \n\n\nThird ";
        assert_eq!(
            normalize_whitespace(text),
            "First line\n\nSecond line \n\nThird"
        );
    }

    #[test]
    fn test_strip_markup() {
        let summary = "<p>Hello <b>world</b>,</p>\n<p>second&nbsp;paragraph</p>";
        assert_eq!(strip_markup(summary), "Hello world , second paragraph");
    }

    #[test]
    fn test_inline_and_block_text() {
        let html = Html::parse_fragment("<div>\n  <h1> Title </h1>\n  <p>Some <em>body</em> text</p>\n</div>");
        let div = html.select(&Selector::parse("div").unwrap()).next().unwrap();
        assert_eq!(inline_text(div), "Title Some body text");
        assert_eq!(block_text(div), "Title\nSome\nbody\ntext");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 100), "short");
        let long = "a".repeat(500);
        let out = truncate_for_log(&long, 100);
        assert!(out.starts_with(&"a".repeat(100)));
        assert!(out.contains("…(+400 bytes)"));
    }
}
