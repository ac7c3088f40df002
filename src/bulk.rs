//! Rate-limited bulk operations.
//!
//! Both loops visit records one at a time and sleep a fixed interval
//! between records to stay under Medium's (and the target platforms')
//! informal rate limits.  A failure on one record is logged and counted;
//! the loop carries on with the next.

use std::time::Duration;

use tracing::{info, warn};

use crate::acquire::Scraper;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::publish::Publisher;
use crate::source::{reading_time, Post};

/// Pause between successive publishes in [`sync_all`].
pub const SYNC_DELAY: Duration = Duration::from_millis(500);

/// Result of syncing one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Published { url: String },
    /// The platform already has the article; nothing was published.
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub published: usize,
    pub already_present: usize,
    pub failed: usize,
}

/// Publish one post and record the result on it.
///
/// On success `synced[platform]` becomes true and the returned URL is kept
/// in `platform_urls`.
pub async fn sync_post(publisher: &dyn Publisher, post: &mut Post) -> Result<SyncOutcome> {
    let platform = publisher.platform().to_string();

    if !publisher.is_configured() {
        return Err(Error::Configuration(format!(
            "{platform} API key is not configured"
        )));
    }

    if publisher.article_exists(post).await? {
        info!(platform = %platform, title = %post.title, "article already exists");
        return Ok(SyncOutcome::AlreadyExists);
    }

    let result = publisher.publish_article(post).await?;
    if !result.success {
        return Err(Error::Publish {
            platform,
            reason: "no success response".into(),
        });
    }

    info!(platform = %platform, title = %post.title, url = %result.url, "published article");
    post.synced.insert(platform.clone(), true);
    post.platform_urls.insert(platform, result.url.clone());
    Ok(SyncOutcome::Published { url: result.url })
}

/// Sync every post not yet synced to the publisher's platform.
pub async fn sync_all(publisher: &dyn Publisher, posts: &mut [Post]) -> SyncReport {
    let platform = publisher.platform().to_string();
    let mut report = SyncReport::default();
    let mut first = true;

    for post in posts.iter_mut().filter(|p| !p.is_synced_to(&platform)) {
        if !first {
            tokio::time::sleep(SYNC_DELAY).await;
        }
        first = false;

        match sync_post(publisher, post).await {
            Ok(SyncOutcome::Published { .. }) => report.published += 1,
            Ok(SyncOutcome::AlreadyExists) => report.already_present += 1,
            Err(e) => {
                warn!(platform = %platform, title = %post.title, error = %e, "sync failed");
                report.failed += 1;
            }
        }
    }

    info!(
        platform = %platform,
        published = report.published,
        already_present = report.already_present,
        failed = report.failed,
        "bulk sync finished"
    );
    report
}

/// Limits for [`enrich`].
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub enabled: bool,
    pub max_posts: usize,
    pub delay: Duration,
}

impl EnrichOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enable_data_enrichment,
            max_posts: config.max_enrichment_posts,
            delay: config.scraping_delay(),
        }
    }
}

/// Fill in the Markdown body of posts that have none.
///
/// Visits at most `max_posts` posts lacking content and returns how many
/// were enriched.  Posts whose page cannot be fetched, or whose page has
/// no words in it, are left as they are.
pub async fn enrich(scraper: &mut Scraper, posts: &mut [Post], options: &EnrichOptions) -> usize {
    if !options.enabled {
        info!("data enrichment disabled");
        return 0;
    }

    let mut enriched = 0;
    let candidates = posts
        .iter_mut()
        .filter(|p| p.content.is_none() && !p.url.is_empty())
        .take(options.max_posts);

    for (index, post) in candidates.enumerate() {
        if index > 0 {
            tokio::time::sleep(options.delay).await;
        }

        match scraper.extract(&post.url).await {
            // A challenge or block page still renders the footer; only real
            // words count as content.
            Some(article) if article.word_count > 0 => {
                post.reading_time = reading_time(article.word_count);
                post.content = Some(article.content);
                enriched += 1;
            }
            _ => warn!(title = %post.title, "keeping post without full content"),
        }
    }

    info!(enriched, "enrichment finished");
    enriched
}
