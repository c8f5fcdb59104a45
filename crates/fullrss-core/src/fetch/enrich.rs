use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::page::PageFetcher;
use crate::config::FetchConfig;
use crate::feed::Feed;
use crate::readability::{Readability, ReadabilityDocument};
use crate::{Error, Result};

const DEFAULT_WORKERS: usize = 2;
const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(45);

/// Outcome counts of one enrichment pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichSummary {
    /// Items that had a link and were attempted
    pub dispatched: usize,
    /// Items whose content was replaced
    pub enriched: usize,
    /// Pages that were fetched but yielded no content
    pub empty: usize,
    /// Fetch, timeout or parse failures
    pub failed: usize,
    /// Items without a link
    pub skipped: usize,
}

type TaskOutput = (usize, String, Result<ReadabilityDocument>);

/// Fills `Item::content` from each item's linked page with a bounded number
/// of concurrent fetches
#[derive(Clone)]
pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    workers: usize,
    page_timeout: Duration,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            workers: DEFAULT_WORKERS,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
        }
    }

    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &FetchConfig) -> Self {
        Self::new(fetcher)
            .with_workers(config.workers)
            .with_page_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn spawn_task(&self, join_set: &mut JoinSet<TaskOutput>, index: usize, url: String) {
        let fetcher = Arc::clone(&self.fetcher);
        let timeout = self.page_timeout;
        join_set.spawn(async move {
            tracing::debug!("Fetching article {} from {}", index, url);
            let result = extract_page(fetcher.as_ref(), &url, timeout).await;
            (index, url, result)
        });
    }

    /// Attempt every linked item exactly once and write the extracted body
    /// into its content. Per-item failures are logged and counted, never
    /// returned.
    pub async fn enrich(&self, feed: &mut Feed) -> EnrichSummary {
        let mut summary = EnrichSummary::default();
        let mut pending = Vec::new();
        for (index, item) in feed.items.iter().enumerate() {
            match item.link() {
                Some(url) => pending.push((index, url.to_string())),
                None => summary.skipped += 1,
            }
        }
        summary.dispatched = pending.len();

        let mut join_set: JoinSet<TaskOutput> = JoinSet::new();
        let mut pending = pending.into_iter();

        for _ in 0..self.workers {
            if let Some((index, url)) = pending.next() {
                self.spawn_task(&mut join_set, index, url);
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, _, Ok(document))) if !document.is_empty() => {
                    if let Some(item) = feed.items.get_mut(index) {
                        item.content = document.body;
                        summary.enriched += 1;
                    }
                }
                Ok((_, url, Ok(_))) => {
                    tracing::debug!("No readable content found at {}", url);
                    summary.empty += 1;
                }
                Ok((_, url, Err(e))) => {
                    tracing::warn!("Failed to extract '{}': {}", url, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Article task join error: {}", e);
                    summary.failed += 1;
                }
            }

            if let Some((index, url)) = pending.next() {
                self.spawn_task(&mut join_set, index, url);
            }
        }

        tracing::info!(
            "Enriched {}/{} items ({} empty, {} failed, {} without link)",
            summary.enriched,
            summary.dispatched,
            summary.empty,
            summary.failed,
            summary.skipped
        );
        summary
    }
}

/// Fetch one page under `timeout` and run the extractor on it. Extraction is
/// CPU-bound and runs on the blocking pool.
async fn extract_page(
    fetcher: &dyn PageFetcher,
    url: &str,
    timeout: Duration,
) -> Result<ReadabilityDocument> {
    let page = tokio::time::timeout(timeout, fetcher.fetch(url))
        .await
        .map_err(|_| Error::upstream(url, format!("timed out after {}s", timeout.as_secs())))??
        .ensure_success()?;

    tokio::task::spawn_blocking(move || Readability::parse(&page.body).extract(&page.url))
        .await
        .map_err(|e| Error::Other(format!("extraction task for {} failed: {}", url, e)))?
}

/// Enrich `feed` in place with `workers` concurrent fetches
pub async fn enrich(feed: &mut Feed, fetcher: Arc<dyn PageFetcher>, workers: usize) -> EnrichSummary {
    Enricher::new(fetcher).with_workers(workers).enrich(feed).await
}
