//! Acquisition orchestration.
//!
//! Strategies run strictly one after another, never concurrently: Medium
//! throttles aggressively and the relay cursor is shared.  A failing strategy
//! is logged and contributes nothing; only when every path comes back empty
//! does the caller see an error.
//!
//! ```text
//! acquire ──► deep_acquire ──► feed ──(< 15 posts)──► archive
//!    │ empty / error
//!    ├──────► feed alone
//!    │ empty / error
//!    ├──────► archive alone
//!    │ empty / error
//!    └──────► AcquisitionExhausted
//! ```

use std::collections::HashSet;

use tracing::{info, warn};

use crate::config::{normalize_identity, Config};
use crate::error::{Error, Result};
use crate::extract::{Article, ContentExtractor};
use crate::relay::{Fetcher, RelayPool};
use crate::source::{sort_newest_first, ArchiveSource, DataSource, FeedSource, Post, StrategyOptions};

/// Below this many feed posts the archive page is consulted as well.
pub const DEEP_SCRAPE_THRESHOLD: usize = 15;

/// Owns the strategies and the relay pool they share.
pub struct Scraper {
    feed: FeedSource,
    archive: ArchiveSource,
    extractor: ContentExtractor,
    relays: RelayPool,
    options: StrategyOptions,
    enable_deep_scraping: bool,
}

impl Scraper {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(config.scraping_timeout())?;
        let options = StrategyOptions::from_config(config);

        Ok(Self {
            feed: FeedSource::new(fetcher.clone(), options.clone()),
            archive: ArchiveSource::new(fetcher.clone(), options.clone()),
            extractor: ContentExtractor::new(fetcher),
            relays: RelayPool::new(config.relays.clone())?,
            options,
            enable_deep_scraping: config.enable_deep_scraping,
        })
    }

    pub fn relays(&self) -> &RelayPool {
        &self.relays
    }

    pub fn platforms(&self) -> &[String] {
        &self.options.platforms
    }

    /// Feed first, topped up from the archive when the feed is thin.
    ///
    /// Strategy failures are absorbed; an empty result is not an error here.
    pub async fn deep_acquire(&mut self, identity: &str) -> Result<Vec<Post>> {
        let identity = normalize_identity(identity)?;
        info!(identity = %identity, "starting deep acquisition");

        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for post in run(&self.feed, &identity, &mut self.relays).await {
            if seen.insert(post.id.clone()) {
                posts.push(post);
            }
        }

        if !self.enable_deep_scraping {
            info!("deep scraping disabled, using feed only");
        } else if posts.len() < DEEP_SCRAPE_THRESHOLD {
            info!(found = posts.len(), "few posts from feed, consulting archive");
            let archived = run(&self.archive, &identity, &mut self.relays).await;
            let total = archived.len();
            let mut added = 0;
            for post in archived {
                // First-seen id wins: the feed copy carries date, tags and summary.
                if seen.insert(post.id.clone()) {
                    posts.push(post);
                    added += 1;
                }
            }
            info!(total, added, "merged archive posts");
        }

        sort_newest_first(&mut posts);
        self.options.cap(&mut posts);
        info!(count = posts.len(), "deep acquisition finished");
        Ok(posts)
    }

    /// Public entry point: deep acquisition, then feed alone, then archive
    /// alone, stopping at the first stage that yields any posts.
    pub async fn acquire(&mut self, identity: &str) -> Result<Vec<Post>> {
        let identity = normalize_identity(identity)?;

        match self.deep_acquire(&identity).await {
            Ok(posts) if !posts.is_empty() => return Ok(posts),
            Ok(_) => warn!("deep acquisition found nothing, trying feed alone"),
            Err(e) => warn!(error = %e, "deep acquisition failed, trying feed alone"),
        }

        match self.feed.fetch(&identity, &mut self.relays).await {
            Ok(posts) if !posts.is_empty() => return Ok(posts),
            Ok(_) => warn!("feed is empty, trying archive alone"),
            Err(e) => warn!(error = %e, "feed failed, trying archive alone"),
        }

        match self.archive.fetch(&identity, &mut self.relays).await {
            Ok(mut posts) if !posts.is_empty() => {
                self.options.cap(&mut posts);
                return Ok(posts);
            }
            Ok(_) => warn!("archive is empty"),
            Err(e) => warn!(error = %e, "archive failed"),
        }

        Err(Error::AcquisitionExhausted(identity))
    }

    /// Acquire and keep only posts whose id is not already cached.
    pub async fn acquire_new(&mut self, identity: &str, cached: &[Post]) -> Result<Vec<Post>> {
        let current = self.acquire(identity).await?;
        let fresh = posts_to_fetch(&current, cached);
        info!(
            new = fresh.len(),
            total = current.len(),
            cached = cached.len(),
            "checked for new posts"
        );
        Ok(fresh)
    }

    /// Full Markdown body for one post, or `None` when unavailable.
    pub async fn extract(&mut self, post_url: &str) -> Option<Article> {
        self.extractor.extract(&mut self.relays, post_url).await
    }
}

/// Posts in `scraped` whose id is absent from `cached`.
pub fn posts_to_fetch(scraped: &[Post], cached: &[Post]) -> Vec<Post> {
    let cached_ids: HashSet<&str> = cached.iter().map(|p| p.id.as_str()).collect();
    scraped
        .iter()
        .filter(|p| !cached_ids.contains(p.id.as_str()))
        .cloned()
        .collect()
}

/// Run one strategy, turning failure into an empty contribution.
async fn run(source: &dyn DataSource, identity: &str, relays: &mut RelayPool) -> Vec<Post> {
    match source.fetch(identity, relays).await {
        Ok(posts) => {
            info!(source = source.name(), count = posts.len(), "strategy finished");
            posts
        }
        Err(e) => {
            warn!(source = source.name(), error = %e, "strategy failed");
            Vec::new()
        }
    }
}
