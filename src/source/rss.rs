//! Feed strategy: the author's RSS feed.
//!
//! Medium publishes `/feed/@identity` as RSS 2.0 with the full body in
//! `content:encoded`.  The feed is the most reliable source but only lists
//! the latest entries, which is why the orchestrator may top it up from the
//! archive page.

use chrono::{DateTime, NaiveDate};
use tracing::{info, warn};

use async_trait::async_trait;

use super::{feed_url, reading_time, sort_newest_first, strip_markup, DataSource, Post, StrategyOptions};
use crate::error::Result;
use crate::fingerprint::generate_id;
use crate::relay::{Fetcher, RelayPool};

/// Characters of summary kept before the ellipsis.
const DESCRIPTION_LEN: usize = 200;

pub struct FeedSource {
    fetcher: Fetcher,
    options: StrategyOptions,
}

impl FeedSource {
    pub fn new(fetcher: Fetcher, options: StrategyOptions) -> Self {
        Self { fetcher, options }
    }

    /// Parse an already-fetched [`rss::Channel`] into [`Post`]s.
    ///
    /// Pure (no I/O) so that tests can exercise it without a network.  The
    /// result is newest first and capped at `max_posts`.
    pub fn parse_channel(channel: &rss::Channel, options: &StrategyOptions) -> Vec<Post> {
        let mut posts: Vec<Post> = channel
            .items()
            .iter()
            .filter_map(|item| {
                let title = strip_markup(item.title().unwrap_or_default()).trim().to_string();
                let link = item.link().unwrap_or_default().trim().to_string();

                let Some(id) = generate_id(&link, &title) else {
                    warn!("skipping feed entry with neither title nor usable link");
                    return None;
                };

                // Prefer the full body; the summary is often a single teaser line.
                let body = item.content().or(item.description()).unwrap_or_default();
                let text = strip_markup(body);
                let words = text.split_whitespace().count();

                let tags = item
                    .categories()
                    .iter()
                    .map(|c| tag_slug(c.name()))
                    .filter(|t| !t.is_empty())
                    .take(options.max_tags)
                    .collect();

                let mut post = Post::new(id, title, link, &options.platforms);
                post.description = summarize(&text);
                post.published_at = item.pub_date().and_then(parse_pub_date);
                post.tags = tags;
                post.reading_time = reading_time(words);
                Some(post)
            })
            .collect();

        info!(count = posts.len(), "parsed posts from feed");
        sort_newest_first(&mut posts);
        options.cap(&mut posts);
        posts
    }

    /// Parse raw feed bytes.
    pub fn parse_feed(body: &[u8], options: &StrategyOptions) -> Result<Vec<Post>> {
        let channel = rss::Channel::read_from(body)?;
        Ok(Self::parse_channel(&channel, options))
    }
}

#[async_trait]
impl DataSource for FeedSource {
    fn name(&self) -> &str {
        "feed"
    }

    async fn fetch(&self, identity: &str, relays: &mut RelayPool) -> Result<Vec<Post>> {
        let options = &self.options;
        self.fetcher
            .fetch_parsed(relays, &feed_url(identity), identity, |body| {
                Self::parse_feed(body.as_bytes(), options)
            })
            .await
    }
}

/// `"Machine Learning"` becomes `"machine-learning"`.
fn tag_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// First 200 characters of the stripped text, as is, plus `...`.
fn summarize(text: &str) -> String {
    let head: String = text.chars().take(DESCRIPTION_LEN).collect();
    format!("{head}...")
}

/// RFC 2822 is what RSS specifies; some relays rewrite to RFC 3339.
fn parse_pub_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(raw.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .ok()
        .map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
