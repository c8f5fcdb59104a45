use anyhow::{Context, Result};

use fullrss_core::{write_rss, AppConfig, FullFeedService};

pub async fn run(config: &AppConfig, url: &str, json: bool) -> Result<()> {
    let service = FullFeedService::new(config)?;
    let (feed, summary) = service
        .fetch_feed_with_summary(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&feed)?);
    } else {
        println!("{}", write_rss(&feed));
    }

    eprintln!(
        "{} of {} items enriched ({} failed)",
        summary.enriched,
        feed.items.len(),
        summary.failed
    );
    Ok(())
}
