//! medium-sync command line.
//!
//! Thin wiring over the library: load configuration, set up logging, then
//! run one command against the scraper and the file-backed cache.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use medium_sync::bulk::{self, EnrichOptions};
use medium_sync::cache::{CacheManager, FileStore};
use medium_sync::{Config, Scraper};

#[derive(Debug, Parser)]
#[command(name = "medium-sync", version, about = "Mirror Medium posts into a local cache")]
struct Cli {
    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Acquire posts and merge new ones into the cache
    Fetch {
        /// Medium handle, overriding the configured one
        identity: Option<String>,
        /// Cap on acquired posts (0 = unlimited)
        #[arg(long)]
        max_posts: Option<usize>,
    },
    /// Fill in full content for cached posts
    Enrich,
    /// Print one story as Markdown
    Article { url: String },
    /// Show cache status
    Status,
    /// Write the cache to a JSON file
    Export { path: PathBuf },
    /// Replace the cache with a previously exported file
    Import { path: PathBuf },
    /// Delete the cache
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    match cli.command {
        Command::Fetch { identity, max_posts } => {
            if identity.is_some() {
                config.identity = identity;
            }
            if let Some(max) = max_posts {
                config.max_posts = max;
            }
            fetch(&config).await
        }
        Command::Enrich => enrich(&config).await,
        Command::Article { url } => {
            let mut scraper = Scraper::new(&config)?;
            let Some(article) = scraper.extract(&url).await else {
                bail!("content unavailable for {url}");
            };
            println!("{}", article.content);
            Ok(())
        }
        Command::Status => {
            let info = cache(&config)?.info()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Command::Export { path } => {
            let bytes = cache(&config)?.export()?;
            std::fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "cache exported");
            Ok(())
        }
        Command::Import { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let count = cache(&config)?.import(&bytes)?;
            println!("Imported {count} posts");
            Ok(())
        }
        Command::Clear => {
            cache(&config)?.clear()?;
            println!("Cache cleared");
            Ok(())
        }
    }
}

fn cache(config: &Config) -> Result<CacheManager<FileStore>> {
    let store = FileStore::new(&config.cache_dir);
    Ok(CacheManager::from_config(config, store)?)
}

async fn fetch(config: &Config) -> Result<()> {
    let manager = cache(config)?;
    let mut scraper = Scraper::new(config)?;

    let cached = manager.cached_posts()?;
    let fresh = scraper
        .acquire_new(manager.identity(), &cached)
        .await
        .with_context(|| format!("failed to acquire posts for @{}", manager.identity()))?;

    let merged = manager.merge_and_save(&fresh)?;
    println!("{} new posts, {} total", fresh.len(), merged.len());
    Ok(())
}

async fn enrich(config: &Config) -> Result<()> {
    let manager = cache(config)?;
    let mut scraper = Scraper::new(config)?;

    let mut posts = manager.cached_posts()?;
    let enriched = bulk::enrich(&mut scraper, &mut posts, &EnrichOptions::from_config(config)).await;
    if enriched > 0 {
        manager.save(&posts)?;
    }
    println!("Enriched {enriched} posts");
    Ok(())
}
