pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod readability;
pub mod service;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use feed::{parse_feed, parse_with_media_type, write_rss, Feed, FeedParser, Item};
pub use fetch::{enrich, EnrichSummary, Enricher, HttpPageFetcher, PageFetcher};
pub use readability::{Readability, ReadabilityDocument};
pub use service::FullFeedService;
