//! Film metadata scraped from the catalog's OpenGraph tags.
//!
//! One GET per call, no retries and no caching. Every failure comes back as a
//! [`MetadataError`] so callers can fall back to what the host typed in.

use std::{collections::HashMap, sync::LazyLock};

use derive_more::{Display, Error};
use log::{info, warn};
use regex::Regex;
use reqwest::{Client, Url};

use crate::config::Config;

static OG_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+property="og:(?P<name>[^"]+)"\s+content="(?P<content>[^"]*)""#)
        .expect("og tag pattern is valid")
});

#[derive(Debug, Display, Error, PartialEq)]
pub enum MetadataError {
    #[display(fmt = "catalog URL is required")]
    MissingUrl,

    #[display(fmt = "invalid catalog URL: {}", _0)]
    InvalidUrl(#[error(not(source))] String),

    #[display(fmt = "URL must be from {}", _0)]
    ForeignHost(#[error(not(source))] String),

    #[display(fmt = "unable to reach the catalog: {}", _0)]
    Unreachable(#[error(not(source))] String),

    #[display(fmt = "failed to fetch catalog page (status {})", _0)]
    Status(#[error(not(source))] u16),

    #[display(fmt = "catalog page carries no film metadata")]
    NoMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CatalogMetadata {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub canonical_url: String,
}

#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    client: Client,
    allowed_host: String,
}

impl MetadataFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.catalog_timeout)
            .user_agent(config.catalog_user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            allowed_host: config.catalog_host.to_ascii_lowercase(),
        })
    }

    /// Adds a scheme when missing, checks the host, and strips query, fragment
    /// and trailing slash.
    pub fn normalize_url(&self, raw: &str) -> Result<String, MetadataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MetadataError::MissingUrl);
        }
        let with_scheme = if raw.starts_with("http") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };
        let mut url =
            Url::parse(&with_scheme).map_err(|e| MetadataError::InvalidUrl(e.to_string()))?;

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let allowed = &self.allowed_host;
        if host != *allowed && !host.ends_with(&format!(".{allowed}")) {
            return Err(MetadataError::ForeignHost(allowed.clone()));
        }

        url.set_query(None);
        url.set_fragment(None);
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<CatalogMetadata, MetadataError> {
        let normalized = self.normalize_url(raw_url)?;
        info!("fetching catalog metadata from {}", normalized);

        let response = self
            .client
            .get(&normalized)
            .send()
            .await
            .map_err(|e| {
                warn!("catalog request to {} failed: {}", normalized, e);
                MetadataError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(MetadataError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| MetadataError::Unreachable(e.to_string()))?;
        let mut tags = parse_og_tags(&html);

        let metadata = CatalogMetadata {
            title: tags.remove("title"),
            synopsis: tags.remove("description"),
            poster_url: tags.remove("image"),
            canonical_url: normalized,
        };
        if metadata.title.is_none() && metadata.synopsis.is_none() && metadata.poster_url.is_none()
        {
            return Err(MetadataError::NoMetadata);
        }
        Ok(metadata)
    }
}

/// `og:*` meta tags keyed by lower-cased name. Later duplicates win.
pub fn parse_og_tags(html: &str) -> HashMap<String, String> {
    OG_TAG_PATTERN
        .captures_iter(html)
        .map(|caps| {
            (
                caps["name"].to_ascii_lowercase(),
                decode_entities(&caps["content"]),
            )
        })
        .filter(|(_, content)| !content.is_empty())
        .collect()
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn fetcher_for(host: &str) -> MetadataFetcher {
        let config = Config {
            catalog_host: host.to_string(),
            catalog_timeout: Duration::from_secs(2),
            ..Config::default()
        };
        MetadataFetcher::new(&config).unwrap()
    }

    const FILM_PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Stalker (1979)" />
        <meta property="og:description" content="A guide leads two men through an area known as the Zone &amp; beyond." />
        <meta property="og:image" content="https://a.ltrbxd.com/poster.jpg" />
        <meta property="og:type" content="video.movie" />
        </head></html>"#;

    #[test]
    fn normalizes_catalog_urls() {
        let fetcher = fetcher_for("letterboxd.com");
        assert_eq!(
            fetcher.normalize_url("letterboxd.com/film/stalker/?utm=x#top"),
            Ok("https://letterboxd.com/film/stalker".to_string())
        );
        assert_eq!(
            fetcher.normalize_url(" https://www.letterboxd.com/film/stalker/ "),
            Ok("https://www.letterboxd.com/film/stalker".to_string())
        );
    }

    #[test]
    fn rejects_missing_and_foreign_urls() {
        let fetcher = fetcher_for("letterboxd.com");
        assert_eq!(fetcher.normalize_url("   "), Err(MetadataError::MissingUrl));
        assert_eq!(
            fetcher.normalize_url("https://imdb.com/title/tt0079944"),
            Err(MetadataError::ForeignHost("letterboxd.com".to_string()))
        );
        assert_eq!(
            fetcher.normalize_url("https://notletterboxd.com/film/stalker"),
            Err(MetadataError::ForeignHost("letterboxd.com".to_string()))
        );
    }

    #[test]
    fn parses_og_tags() {
        let tags = parse_og_tags(FILM_PAGE);
        assert_eq!(tags["title"], "Stalker (1979)");
        assert_eq!(
            tags["description"],
            "A guide leads two men through an area known as the Zone & beyond."
        );
        assert_eq!(tags["image"], "https://a.ltrbxd.com/poster.jpg");
        assert_eq!(tags["type"], "video.movie");
    }

    #[test]
    fn page_without_tags_yields_nothing() {
        assert!(parse_og_tags("<html><title>nope</title></html>").is_empty());
    }

    #[actix_rt::test]
    async fn unreachable_catalog_is_an_error() {
        let fetcher = fetcher_for("localhost");
        let res = fetcher.fetch("http://localhost:9/film/stalker").await;
        assert!(matches!(res, Err(MetadataError::Unreachable(_))), "{res:?}");
    }

    async fn serve_once(status_line: &'static str, body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        port
    }

    #[actix_rt::test]
    async fn fetches_metadata_from_film_page() {
        let port = serve_once("HTTP/1.1 200 OK", FILM_PAGE).await;
        let fetcher = fetcher_for("127.0.0.1");
        let metadata = fetcher
            .fetch(&format!("http://127.0.0.1:{port}/film/stalker/"))
            .await
            .unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Stalker (1979)"));
        assert_eq!(metadata.poster_url.as_deref(), Some("https://a.ltrbxd.com/poster.jpg"));
        assert_eq!(metadata.canonical_url, format!("http://127.0.0.1:{port}/film/stalker"));
    }

    #[actix_rt::test]
    async fn error_status_is_reported() {
        let port = serve_once("HTTP/1.1 404 Not Found", "gone").await;
        let fetcher = fetcher_for("127.0.0.1");
        let res = fetcher.fetch(&format!("http://127.0.0.1:{port}/film/missing")).await;
        assert_eq!(res, Err(MetadataError::Status(404)));
    }
}
