use std::sync::Arc;

use reqwest::StatusCode;
use url::Url;

use crate::config::AppConfig;
use crate::feed::{write_rss, Feed, FeedParser};
use crate::fetch::{EnrichSummary, Enricher, HttpPageFetcher};
use crate::{Error, Result};

/// Download, parse, truncate and enrich one source feed
pub struct FullFeedService {
    http: Arc<HttpPageFetcher>,
    parser: FeedParser,
    enricher: Enricher,
    max_items: usize,
}

impl FullFeedService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = Arc::new(HttpPageFetcher::new(&config.fetch)?);
        let enricher = Enricher::from_config(http.clone(), &config.fetch);
        Ok(Self {
            http,
            parser: FeedParser::new(),
            enricher,
            max_items: config.feed.max_items,
        })
    }

    /// Use a custom parser, e.g. one with extra extension modules registered
    pub fn with_parser(mut self, parser: FeedParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Fetch `source` and return the feed with full-text item content
    pub async fn fetch_feed(&self, source: &str) -> Result<Feed> {
        let (feed, _) = self.fetch_feed_with_summary(source).await?;
        Ok(feed)
    }

    pub async fn fetch_feed_with_summary(&self, source: &str) -> Result<(Feed, EnrichSummary)> {
        let url = validate_source(source)?;
        tracing::info!("Fetching source feed {}", url);

        let download = self.http.download(url.as_str()).await?;
        if download.status != StatusCode::OK {
            return Err(Error::upstream(
                url.as_str(),
                format!("HTTP {}", download.status),
            ));
        }

        let mut feed = self
            .parser
            .parse_with_media_type(download.content_type(), &download.body)?;
        if self.max_items > 0 && feed.items.len() > self.max_items {
            tracing::debug!(
                "Truncating {} items to {}",
                feed.items.len(),
                self.max_items
            );
            feed.items.truncate(self.max_items);
        }

        let summary = self.enricher.enrich(&mut feed).await;
        Ok((feed, summary))
    }

    /// Fetch `source` and serialize the enriched feed as RSS 2.0
    pub async fn render_rss(&self, source: &str) -> Result<String> {
        let feed = self.fetch_feed(source).await?;
        Ok(write_rss(&feed))
    }
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_source(source: &str) -> Result<Url> {
    let url = Url::parse(source.trim())
        .map_err(|e| Error::InvalidSource(format!("{}: {}", source, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(Error::InvalidSource(source.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = "<html><head><title>Full story</title></head><body>\
        <article><p>The full text of the story, long enough to be scored, with commas, \
        clauses, and a proper ending.</p></article></body></html>";

    fn rss(base: &str, count: usize) -> String {
        let items: String = (1..=count)
            .map(|i| {
                format!(
                    "<item><title>Story {i}</title><link>{base}/article/{i}</link>\
                     <description>summary {i}</description></item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Source</title>\
             <link>{base}</link><description>d</description>{items}</channel></rss>"
        )
    }

    async fn mount_article(server: &MockServer, i: usize) {
        Mock::given(method("GET"))
            .and(path(format!("/article/{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/html; charset=utf-8")
                    .set_body_string(ARTICLE),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_validate_source() {
        assert!(validate_source("https://example.com/feed.xml").is_ok());
        assert!(validate_source("http://example.com").is_ok());
        assert!(matches!(
            validate_source("ftp://example.com/feed"),
            Err(Error::InvalidSource(_))
        ));
        assert!(matches!(
            validate_source("example.com/feed"),
            Err(Error::InvalidSource(_))
        ));
        assert!(matches!(validate_source(""), Err(Error::InvalidSource(_))));
    }

    #[tokio::test]
    async fn test_fetch_feed_enriches_and_truncates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(rss(&server.uri(), 3), "application/rss+xml; charset=utf-8"),
            )
            .mount(&server)
            .await;
        mount_article(&server, 1).await;
        mount_article(&server, 2).await;

        let mut config = AppConfig::default();
        config.feed.max_items = 2;
        let service = FullFeedService::new(&config).unwrap();

        let (feed, summary) = service
            .fetch_feed_with_summary(&format!("{}/feed.xml", server.uri()))
            .await
            .unwrap();

        assert_eq!(feed.title, "Source");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(summary.enriched, 2);
        for item in &feed.items {
            assert!(item.content.contains("The full text of the story"));
            assert!(item.summary.starts_with("summary"));
        }
    }

    #[tokio::test]
    async fn test_wrong_media_type_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let service = FullFeedService::new(&AppConfig::default()).unwrap();
        let result = service.fetch_feed(&server.uri()).await;
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
    }

    #[tokio::test]
    async fn test_non_200_source_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = FullFeedService::new(&AppConfig::default()).unwrap();
        let err = service.fetch_feed(&server.uri()).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_invalid_source_never_fetched() {
        let service = FullFeedService::new(&AppConfig::default()).unwrap();
        let result = service.render_rss("not a url").await;
        assert!(matches!(result, Err(Error::InvalidSource(_))));
    }
}
