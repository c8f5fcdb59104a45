use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fullrss_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "fullrss")]
#[command(author, version, about = "Turns summary-only RSS/Atom feeds into full-text RSS feeds")]
struct Cli {
    /// Path to the config file (defaults to ~/.config/fullrss/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve full-text feeds over HTTP
    Serve {
        /// Address to bind
        #[arg(short = 'a', long)]
        addr: Option<String>,
        /// Port to listen on
        #[arg(short = 'p', long)]
        port: Option<u16>,
        /// Parallel article fetches per feed
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Fetch a feed once and print the full-text RSS
    Fetch {
        /// Source feed URL
        url: String,
        /// Print the parsed feed as JSON instead of RSS
        #[arg(long)]
        json: bool,
    },
    /// Extract the readable content of one article page
    Extract {
        /// Article URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load config")?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Some(Commands::Serve {
            addr,
            port,
            workers,
        }) => commands::serve::run(config, addr, port, workers).await,
        None => commands::serve::run(config, None, None, None).await,
        Some(Commands::Fetch { url, json }) => commands::fetch::run(&config, &url, json).await,
        Some(Commands::Extract { url }) => commands::extract::run(&config, &url).await,
    }
}
