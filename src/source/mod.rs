//! Acquisition strategies.
//!
//! Each strategy pulls an author's posts from one kind of Medium page and
//! converts them into [`Post`] values, so the orchestrator can merge the
//! results without knowing their origin.  There are two today:
//!
//! * [`FeedSource`] reads the RSS feed, which carries dates, tags and a
//!   summary but only the most recent entries.
//! * [`ArchiveSource`] reads the profile's archive listing, which reaches
//!   further back but yields little more than title and link.
//!
//! Both go through the shared [`RelayPool`], one request at a time.

mod archive;
mod post;
mod rss;

pub use archive::ArchiveSource;
pub use post::{reading_time, sort_newest_first, Post};
pub use rss::FeedSource;

use async_trait::async_trait;
use scraper::Html;

use crate::config::Config;
use crate::error::Result;
use crate::relay::RelayPool;

pub const MEDIUM_BASE: &str = "https://medium.com";

/// Trait every acquisition strategy implements.
///
/// `identity` is already normalised (no leading `@`).  Implementations
/// must route every request through `relays` and leave the cursor wherever
/// their last failure put it.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self, identity: &str, relays: &mut RelayPool) -> Result<Vec<Post>>;
}

/// Shaping limits applied to strategy output.
#[derive(Debug, Clone)]
pub struct StrategyOptions {
    /// `0` means unlimited.
    pub max_posts: usize,
    pub max_tags: usize,
    /// Platforms whose flags are initialised on every new post.
    pub platforms: Vec<String>,
}

impl StrategyOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_posts: config.max_posts,
            max_tags: config.max_tags,
            platforms: config.platforms.clone(),
        }
    }

    /// Truncate to `max_posts` when a limit is set.
    pub fn cap(&self, posts: &mut Vec<Post>) {
        if self.max_posts > 0 && posts.len() > self.max_posts {
            tracing::info!(limit = self.max_posts, found = posts.len(), "limiting posts");
            posts.truncate(self.max_posts);
        }
    }
}

pub fn feed_url(identity: &str) -> String {
    format!("{MEDIUM_BASE}/feed/@{identity}")
}

pub fn profile_url(identity: &str) -> String {
    format!("{MEDIUM_BASE}/@{identity}")
}

pub fn archive_url(identity: &str) -> String {
    format!("{}/archive", profile_url(identity))
}

/// Text content of an HTML fragment, entities decoded.
pub(crate) fn strip_markup(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.to_string();
    }
    Html::parse_fragment(html).root_element().text().collect()
}
