//! JSON output for downstream consumers.
//!
//! The document is pretty-printed with two-space indentation and non-ASCII
//! text kept as-is, which is what the PDF, Slack and email collaborators read:
//!
//! ```text
//! {
//!   "date": "2025-05-06",
//!   "sources": ["Gigazine", "Publickey"],
//!   "articles": [
//!     {"title": "...", "url": "...", "source": "Gigazine", "content": "..."}
//!   ]
//! }
//! ```

use crate::models::ResultSet;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use tracing::{info, instrument};

/// Serialize `result` the way it is emitted.
pub fn render(result: &ResultSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Write `result` to `output`, or to stdout when no path is given.
///
/// Stdout carries nothing but this document; all logging goes to stderr.
///
/// # Errors
///
/// Returns an error if serialization fails or the file/stream cannot be written.
#[instrument(level = "info", skip_all, fields(articles = result.articles.len()))]
pub async fn write_result_set(result: &ResultSet, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut json = render(result)?;
    json.push('\n');

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, json).await?;
            info!(path = %path.display(), "Wrote JSON");
        }
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Source};

    fn sample() -> ResultSet {
        let sources = vec![Source::new("ギガジン", "https://gigazine.net/")];
        let mut result = ResultSet::new("2025-05-06", &sources);
        let mut article = Article::stub("ロボットが洗濯物をたたむ", "https://gigazine.net/news/1/", "ギガジン");
        article.content = "本文".to_string();
        result.articles.push(article);
        result
    }

    #[test]
    fn test_render_keeps_non_ascii() {
        let json = render(&sample()).unwrap();
        assert!(json.contains("ロボットが洗濯物をたたむ"));
        assert!(!json.contains("\\u"));
        assert!(json.contains("\n  \"date\": \"2025-05-06\""));
    }

    #[test]
    fn test_render_field_order() {
        let json = render(&sample()).unwrap();
        let date = json.find("\"date\"").unwrap();
        let sources = json.find("\"sources\"").unwrap();
        let articles = json.find("\"articles\"").unwrap();
        assert!(date < sources && sources < articles);
    }

    #[tokio::test]
    async fn test_write_to_file() {
        let dir = std::env::temp_dir().join(format!("news_fetch_json_{}", std::process::id()));
        let path = dir.join("out").join("news.json");
        write_result_set(&sample(), Some(&path)).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: ResultSet = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
