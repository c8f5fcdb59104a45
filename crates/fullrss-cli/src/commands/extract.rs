use anyhow::{Context, Result};

use fullrss_core::{AppConfig, HttpPageFetcher, PageFetcher, Readability};

pub async fn run(config: &AppConfig, url: &str) -> Result<()> {
    let fetcher = HttpPageFetcher::new(&config.fetch)?;
    let page = fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .ensure_success()?;

    let document = Readability::parse(&page.body).extract(&page.url)?;
    if document.is_empty() {
        eprintln!("No readable content found at {}", page.url);
    }

    println!("{}\n", document.title);
    println!("{}", document.body);
    Ok(())
}
