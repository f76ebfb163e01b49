//! Pipeline driver: sources in, one [`ResultSet`] out.
//!
//! ```text
//! for each source:
//!     dispatch -> extract listing/feed -> back-fill missing bodies -> append
//! ```
//!
//! Sources are processed one at a time and article bodies within a source are
//! fetched one at a time, so output order is fully determined by source order
//! and discovery order. Nothing is kept between runs.

use crate::content::{DEFAULT_MAX_CHARS, fetch_content};
use crate::fetch::PageFetch;
use crate::models::{Article, ResultSet, Source};
use crate::scrapers;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Fetch each article page for body text when the extractor left it empty.
    pub with_content: bool,
    /// Character budget for back-filled bodies.
    pub max_content_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            with_content: true,
            max_content_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Fill in `content` for every article that has none, sequentially.
///
/// Articles that already carry a feed summary are left alone.
pub async fn backfill_content<F: PageFetch>(
    fetcher: &F,
    articles: Vec<Article>,
    max_chars: usize,
) -> Vec<Article> {
    let total = articles.len();
    stream::iter(articles.into_iter().enumerate())
        .then(|(i, mut article)| async move {
            if article.needs_content() {
                info!("Fetching {}/{}...", i + 1, total);
                article.content = fetch_content(fetcher, &article.url, max_chars).await;
            }
            article
        })
        .collect()
        .await
}

/// Run the whole pipeline over `sources`.
///
/// Always returns a complete [`ResultSet`]: a source that fails entirely just
/// contributes no articles.
///
/// # Arguments
///
/// * `fetcher` - Page fetcher, normally a retrying HTTP client
/// * `sources` - Enabled sources in registry order
/// * `options` - Back-fill switch and body budget
/// * `date` - Run date stamped on the result, `YYYY-MM-DD`
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn run<F: PageFetch>(
    fetcher: &F,
    sources: &[Source],
    options: &PipelineOptions,
    date: &str,
) -> ResultSet {
    let mut result = ResultSet::new(date, sources);

    for source in sources {
        info!("Fetching from {}...", source.name);
        let mut articles = scrapers::fetch_source(fetcher, source).await;
        if options.with_content {
            articles = backfill_content(fetcher, articles, options.max_content_chars).await;
        }
        info!(source = %source.name, "Found {} articles", articles.len());
        result.articles.extend(articles);
    }

    info!(total = result.articles.len(), "Pipeline finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryFetch;
    use crate::fetch::testing::FixtureFetcher;
    use crate::outputs::json::render;
    use std::time::Duration;

    const LISTING: &str = r#"<html><body>
        <a href="/ainews/archive/first-issue/">First issue of the newsletter</a>
        <a href="/ainews/archive/second-issue/">Second issue of the newsletter</a>
    </body></html>"#;

    fn article_page(text: &str) -> String {
        format!("<html><body><nav>Menu</nav><article><p>{text}</p></article></body></html>")
    }

    fn fixtures() -> FixtureFetcher {
        FixtureFetcher::new()
            .page("https://buttondown.com/ainews/archive/", LISTING)
            .page(
                "https://buttondown.com/ainews/archive/first-issue/",
                &article_page("Body of the first issue."),
            )
            .page(
                "https://buttondown.com/ainews/archive/second-issue/",
                &article_page("Body of the second issue."),
            )
            .page(
                "https://blog.example.com/feed",
                r#"<rss><channel>
                    <item><title>Feed post</title><link>https://blog.example.com/p/1</link><description>Inline summary</description></item>
                </channel></rss>"#,
            )
    }

    fn sources() -> Vec<Source> {
        vec![
            Source::new("AI News", "https://buttondown.com/ainews/archive/"),
            Source::new("Down", "https://down.example/"),
            Source::new("Blog", "https://blog.example.com/"),
        ]
    }

    #[tokio::test]
    async fn test_run_aggregates_in_source_order() {
        let fetcher = fixtures();
        let result = run(&fetcher, &sources(), &PipelineOptions::default(), "2025-05-06").await;

        assert_eq!(result.date, "2025-05-06");
        assert_eq!(result.sources, vec!["AI News", "Down", "Blog"]);
        let titles: Vec<_> = result.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "First issue of the newsletter",
                "Second issue of the newsletter",
                "Feed post"
            ]
        );
        assert_eq!(result.articles[0].content, "Body of the first issue.");
        assert_eq!(result.articles[1].content, "Body of the second issue.");
        assert_eq!(result.articles[2].content, "Inline summary");
    }

    #[tokio::test]
    async fn test_feed_summaries_are_not_backfilled() {
        let fetcher = fixtures();
        run(&fetcher, &sources(), &PipelineOptions::default(), "2025-05-06").await;
        assert_eq!(fetcher.calls_to("https://blog.example.com/p/1"), 0);
    }

    #[tokio::test]
    async fn test_without_content_skips_article_pages() {
        let fetcher = fixtures();
        let options = PipelineOptions {
            with_content: false,
            ..PipelineOptions::default()
        };
        let result = run(&fetcher, &sources(), &options, "2025-05-06").await;
        assert!(result.articles[0].content.is_empty());
        assert_eq!(
            fetcher.calls_to("https://buttondown.com/ainews/archive/first-issue/"),
            0
        );
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let fixtures = fixtures().failing("https://down.example");
        let fetcher = RetryFetch::new(fixtures, 3, Duration::ZERO);
        let result = run(&fetcher, &sources(), &PipelineOptions::default(), "2025-05-06").await;

        assert!(result.articles.iter().all(|a| a.source != "Down"));
        assert_eq!(result.articles.len(), 3);
        assert!(result.sources.contains(&"Down".to_string()));
        let json: serde_json::Value = serde_json::from_str(&render(&result).unwrap()).unwrap();
        assert_eq!(json["articles"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_every_source_failing_still_yields_document() {
        let fetcher = FixtureFetcher::new().failing("https://");
        let result = run(&fetcher, &sources(), &PipelineOptions::default(), "2025-05-06").await;
        assert!(result.articles.is_empty());
        assert_eq!(result.sources.len(), 3);
        assert!(render(&result).unwrap().contains("\"articles\": []"));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let first = run(&fixtures(), &sources(), &PipelineOptions::default(), "2025-05-06").await;
        let second = run(&fixtures(), &sources(), &PipelineOptions::default(), "2025-05-07").await;
        assert_ne!(first.date, second.date);

        let strip_date = |mut r: ResultSet| {
            r.date = String::new();
            render(&r).unwrap()
        };
        assert_eq!(strip_date(first), strip_date(second));
    }

    #[tokio::test]
    async fn test_failed_article_page_leaves_content_empty() {
        let fetcher = FixtureFetcher::new()
            .page("https://buttondown.com/ainews/archive/", LISTING)
            .failing("https://buttondown.com/ainews/archive/second-issue/")
            .page(
                "https://buttondown.com/ainews/archive/first-issue/",
                &article_page("Body of the first issue."),
            );
        let sources = vec![Source::new("AI News", "https://buttondown.com/ainews/archive/")];
        let result = run(&fetcher, &sources, &PipelineOptions::default(), "2025-05-06").await;
        assert_eq!(result.articles.len(), 2);
        assert_eq!(result.articles[0].content, "Body of the first issue.");
        assert!(result.articles[1].content.is_empty());
    }
}
