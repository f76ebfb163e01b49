//! Data models shared by the registry, the extractors and the JSON output.
//!
//! - [`Source`]: one enabled row of the source list
//! - [`Article`]: a normalized article record, regardless of how it was found
//! - [`ResultSet`]: everything a single run produces
//!
//! The serialized shape of [`ResultSet`] is the only contract with downstream
//! consumers (PDF rendering, Slack and email delivery), so field names must not
//! change.

use serde::{Deserialize, Serialize};

/// A news site or blog to poll.
///
/// Loaded once per run from the source list and never mutated. Two sources
/// are the same source when their `url` matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Display name, copied into every [`Article::source`].
    pub name: String,
    /// Listing page or feed URL.
    pub url: String,
    /// Optional host hint used by the dispatcher in addition to `url`.
    pub domain: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// A single article as emitted in the output document.
///
/// `content` is empty when the article came from a listing page and holds a
/// short summary when it came from a feed. The pipeline fills it in at most
/// once afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Link text or feed entry title.
    pub title: String,
    /// Absolute, resolved article URL.
    pub url: String,
    /// Name of the [`Source`] this article was found on.
    pub source: String,
    /// Body text or summary; may be empty.
    pub content: String,
}

impl Article {
    /// Create an article with no content yet.
    pub fn stub(title: impl Into<String>, url: impl Into<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.to_string(),
            content: String::new(),
        }
    }

    /// Whether the pipeline should fetch the article page for body text.
    pub fn needs_content(&self) -> bool {
        self.content.is_empty() && !self.url.is_empty()
    }
}

/// The document written to stdout at the end of a run.
///
/// Articles keep source iteration order and, within a source, discovery
/// order. No sorting happens anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResultSet {
    /// Run date in `YYYY-MM-DD` format.
    pub date: String,
    /// Names of every enabled source, in registry order.
    pub sources: Vec<String>,
    pub articles: Vec<Article>,
}

impl ResultSet {
    pub fn new(date: impl Into<String>, sources: &[Source]) -> Self {
        Self {
            date: date.into(),
            sources: sources.iter().map(|s| s.name.clone()).collect(),
            articles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_stub_needs_content() {
        let article = Article::stub("A headline", "https://example.com/a", "Example");
        assert!(article.content.is_empty());
        assert!(article.needs_content());
    }

    #[test]
    fn test_article_with_summary_skips_backfill() {
        let mut article = Article::stub("A headline", "https://example.com/a", "Example");
        article.content = "Summary from the feed".to_string();
        assert!(!article.needs_content());
    }

    #[test]
    fn test_article_without_url_skips_backfill() {
        let article = Article::stub("A headline", "", "Example");
        assert!(!article.needs_content());
    }

    #[test]
    fn test_result_set_serialization_shape() {
        let sources = vec![
            Source::new("Example", "https://example.com"),
            Source::new("Other", "https://other.example").with_domain("other.example"),
        ];
        let mut result = ResultSet::new("2025-05-06", &sources);
        result
            .articles
            .push(Article::stub("Title here", "https://example.com/1", "Example"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["date"], "2025-05-06");
        assert_eq!(value["sources"], serde_json::json!(["Example", "Other"]));
        assert_eq!(value["articles"][0]["title"], "Title here");
        assert_eq!(value["articles"][0]["url"], "https://example.com/1");
        assert_eq!(value["articles"][0]["source"], "Example");
        assert_eq!(value["articles"][0]["content"], "");
    }

    #[test]
    fn test_result_set_deserialization() {
        let json = r#"{
            "date": "2025-05-06",
            "sources": ["Example"],
            "articles": [
                {"title": "T", "url": "https://example.com/t", "source": "Example", "content": "Body"}
            ]
        }"#;

        let result: ResultSet = serde_json::from_str(json).unwrap();
        assert_eq!(result.sources, vec!["Example".to_string()]);
        assert_eq!(result.articles[0].content, "Body");
    }
}
