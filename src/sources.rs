//! Source registry: reads the CSV list of sites to poll.
//!
//! The file has one row per site. Both the English headers
//! (`name,url,enabled,domain`) and the Japanese headers used by the existing
//! skill templates (`サイト名,URL,有効,ドメイン名`) are accepted. The `domain`
//! column is optional.
//!
//! ```text
//! name,url,enabled,domain
//! Gigazine,https://gigazine.net/,true,gigazine.net
//! Publickey,https://www.publickey1.jp/,FALSE,publickey1.jp
//! ```

use crate::error::ConfigError;
use crate::models::Source;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(alias = "サイト名")]
    name: String,
    #[serde(alias = "URL")]
    url: String,
    #[serde(alias = "有効", default)]
    enabled: String,
    #[serde(alias = "ドメイン名", default)]
    domain: Option<String>,
}

impl SourceRow {
    fn is_enabled(&self) -> bool {
        self.enabled.eq_ignore_ascii_case("true")
    }

    fn into_source(self) -> Source {
        let source = Source::new(self.name, self.url);
        match self.domain.filter(|d| !d.is_empty()) {
            Some(domain) => source.with_domain(domain),
            None => source,
        }
    }
}

/// Load every enabled source from the CSV file at `path`.
///
/// A row is enabled only when its flag is `true` in any letter case; `1`,
/// `yes` and empty cells are all disabled.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be opened or any row fails to
/// parse. Configuration errors are never retried.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_sources(path: &Path) -> Result<Vec<Source>, ConfigError> {
    let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let sources = parse_sources(file).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    info!(count = sources.len(), "Loaded enabled sources");
    Ok(sources)
}

fn parse_sources<R: Read>(reader: R) -> Result<Vec<Source>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut sources = Vec::new();
    for row in rdr.deserialize::<SourceRow>() {
        let row = row?;
        if !row.is_enabled() {
            debug!(name = %row.name, enabled = %row.enabled, "Skipping disabled source");
            continue;
        }
        sources.push(row.into_source());
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_true_rows_are_loaded() {
        let csv = "name,url,enabled\n\
                   A,https://a.example,true\n\
                   B,https://b.example,TRUE\n\
                   C,https://c.example,True\n\
                   D,https://d.example,false\n\
                   E,https://e.example,1\n\
                   F,https://f.example,\n\
                   G,https://g.example,yes\n";
        let sources = parse_sources(csv.as_bytes()).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_japanese_headers_and_domain() {
        let csv = "サイト名,URL,有効,ドメイン名\n\
                   Gigazine,https://gigazine.net/,true,gigazine.net\n\
                   ITmedia,https://www.itmedia.co.jp/news/,true,\n";
        let sources = parse_sources(csv.as_bytes()).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].domain.as_deref(), Some("gigazine.net"));
        assert_eq!(sources[1].domain, None);
        assert_eq!(sources[1].url, "https://www.itmedia.co.jp/news/");
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let csv = "name,enabled\nA,true\n";
        assert!(parse_sources(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let csv = "name,url,enabled\nA,https://a.example,true,extra\n";
        assert!(parse_sources(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_sources(Path::new("/nonexistent/news_sources.csv")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
