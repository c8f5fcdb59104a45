mod enrich;
mod page;

pub use enrich::{enrich, EnrichSummary, Enricher};
pub use page::{Download, HttpPageFetcher, Page, PageFetcher};
