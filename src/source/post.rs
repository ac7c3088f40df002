//! The canonical post record shared by every strategy and the cache.
//!
//! Feed entries, archive links and cached JSON all end up as [`Post`]s, so
//! the orchestrator and the cache never need to know where a record came
//! from.  Only the platform flags are mutated after creation; the id is
//! fixed at construction.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Words per minute used for reading time estimates.
const WORDS_PER_MINUTE: usize = 200;

/// A single article, normalised from any source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Fingerprint from [`crate::fingerprint::generate_id`]; unique within a cache.
    pub id: String,

    pub title: String,

    /// Plain-text summary, already truncated.
    #[serde(default)]
    pub description: String,

    /// Publication date, when the source supplied a readable one.
    #[serde(default, deserialize_with = "lenient_date")]
    pub published_at: Option<NaiveDate>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Display estimate such as `"4 min read"`.
    #[serde(default)]
    pub reading_time: String,

    /// Canonical Medium permalink.
    #[serde(default)]
    pub url: String,

    /// Full Markdown body, filled in by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Platform name to "a sync was attempted and succeeded".
    #[serde(default)]
    pub synced: BTreeMap<String, bool>,

    /// Platform name to "the user confirmed it is live".
    #[serde(default)]
    pub published: BTreeMap<String, bool>,

    /// Platform name to the URL the platform reported after publishing.
    #[serde(default, alias = "urls")]
    pub platform_urls: BTreeMap<String, String>,
}

impl Post {
    /// A post with empty optional fields and every platform flag cleared.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        platforms: &[String],
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            published_at: None,
            tags: Vec::new(),
            reading_time: reading_time(0),
            url: url.into(),
            content: None,
            synced: all_false(platforms),
            published: all_false(platforms),
            platform_urls: BTreeMap::new(),
        }
    }

    /// Older caches predate the `published` map; treat absence as all-false.
    /// `synced` is left alone.
    pub fn normalized(mut self, platforms: &[String]) -> Self {
        if self.published.is_empty() {
            self.published = all_false(platforms);
        }
        self
    }

    pub fn is_synced_to(&self, platform: &str) -> bool {
        self.synced.get(platform).copied().unwrap_or(false)
    }

    /// Date used for ordering; undated posts count as published today.
    pub fn sort_date(&self, today: NaiveDate) -> NaiveDate {
        self.published_at.unwrap_or(today)
    }
}

/// `"N min read"` for a word count, never less than one minute.
pub fn reading_time(words: usize) -> String {
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Stable sort, newest first, undated posts treated as today.
pub fn sort_newest_first(posts: &mut [Post]) {
    let today = Utc::now().date_naive();
    posts.sort_by(|a, b| newest_first(a, b, today));
}

fn newest_first(a: &Post, b: &Post, today: NaiveDate) -> Ordering {
    // `b` first so that the later date compares as smaller.
    b.sort_date(today).cmp(&a.sort_date(today))
}

fn all_false(platforms: &[String]) -> BTreeMap<String, bool> {
    platforms.iter().map(|p| (p.clone(), false)).collect()
}

/// Accepts `"2024-01-10"`, a full timestamp, `null` or garbage (as `None`).
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let head = s.get(..10).unwrap_or(&s);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }))
}
