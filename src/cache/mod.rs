//! Local post cache for one identity.
//!
//! The cache is a single JSON document per identity (posts plus metadata)
//! kept in a [`KvStore`].  Every write replaces the whole document, so there
//! is never a partially updated cache, and the only writer is the process
//! holding the [`CacheManager`].

mod merge;
mod store;

pub use merge::{is_valid, is_valid_at, merge};
pub use store::{FileStore, KvStore, MemoryStore};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::source::Post;

pub const SCHEMA_VERSION: &str = "1.0";
const KEY_PREFIX: &str = "blog-sync-cache-";

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(rename = "version", alias = "schemaVersion", default = "schema_version")]
    pub schema_version: String,
    pub posts: Vec<Post>,
    #[serde(default)]
    pub metadata: CacheMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// `None` until the first save.
    pub last_updated: Option<DateTime<Utc>>,
    /// Always the length of `posts` as of the last save.
    pub post_count: usize,
    #[serde(rename = "username", alias = "ownerIdentity")]
    pub owner_identity: Option<String>,
}

/// Summary for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub exists: bool,
    pub post_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub size_kb: usize,
    pub identity: Option<String>,
    pub is_valid: bool,
}

fn schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn decode(bytes: &[u8]) -> Result<Cache> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::Validation(format!("stored cache is unreadable: {e}")))
}

impl Cache {
    pub fn empty(identity: &str) -> Self {
        Self {
            schema_version: schema_version(),
            posts: Vec::new(),
            metadata: CacheMetadata {
                last_updated: None,
                post_count: 0,
                owner_identity: Some(identity.to_string()),
            },
        }
    }
}

pub struct CacheManager<S: KvStore> {
    store: S,
    identity: String,
    platforms: Vec<String>,
    max_age_hours: f64,
}

impl<S: KvStore> CacheManager<S> {
    pub fn new(store: S, identity: impl Into<String>, platforms: Vec<String>, max_age_hours: f64) -> Self {
        Self {
            store,
            identity: identity.into(),
            platforms,
            max_age_hours,
        }
    }

    pub fn from_config(config: &Config, store: S) -> Result<Self> {
        Ok(Self::new(
            store,
            config.resolved_identity()?,
            config.platforms.clone(),
            config.cache_max_age_hours,
        ))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.identity)
    }

    /// The stored document, or an empty one if nothing was saved yet.
    pub fn load(&self) -> Result<Cache> {
        match self.store.get(&self.key())? {
            Some(bytes) => decode(&bytes),
            None => Ok(Cache::empty(&self.identity)),
        }
    }

    /// Cached posts, upgraded to the current record shape.
    pub fn cached_posts(&self) -> Result<Vec<Post>> {
        Ok(self
            .load()?
            .posts
            .into_iter()
            .map(|p| p.normalized(&self.platforms))
            .collect())
    }

    /// Metadata of the stored cache; `None` when nothing is stored.
    pub fn metadata(&self) -> Result<Option<CacheMetadata>> {
        match self.store.get(&self.key())? {
            Some(bytes) => Ok(Some(decode(&bytes)?.metadata)),
            None => Ok(None),
        }
    }

    pub fn is_valid(&self) -> Result<bool> {
        Ok(is_valid(
            self.metadata()?.as_ref(),
            &self.identity,
            self.max_age_hours,
        ))
    }

    /// Replace the stored posts, stamping fresh metadata.
    pub fn save(&self, posts: &[Post]) -> Result<Cache> {
        let cache = Cache {
            schema_version: schema_version(),
            posts: posts.to_vec(),
            metadata: CacheMetadata {
                last_updated: Some(Utc::now()),
                post_count: posts.len(),
                owner_identity: Some(self.identity.clone()),
            },
        };
        let bytes = serde_json::to_vec_pretty(&cache)
            .map_err(|e| Error::Storage(format!("cannot serialize cache: {e}")))?;
        self.store.put(&self.key(), &bytes)?;
        info!(count = posts.len(), identity = %self.identity, "saved posts to cache");
        Ok(cache)
    }

    /// Merge `new` into the cached posts and save the result.
    pub fn merge_and_save(&self, new: &[Post]) -> Result<Vec<Post>> {
        let merged = merge(&self.cached_posts()?, new, &self.platforms);
        self.save(&merged)?;
        Ok(merged)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key())?;
        info!(identity = %self.identity, "cache cleared");
        Ok(())
    }

    pub fn info(&self) -> Result<CacheInfo> {
        let Some(bytes) = self.store.get(&self.key())? else {
            return Ok(CacheInfo {
                exists: false,
                post_count: 0,
                last_updated: None,
                size_kb: 0,
                identity: None,
                is_valid: false,
            });
        };
        let cache = decode(&bytes)?;
        Ok(CacheInfo {
            exists: cache.metadata.last_updated.is_some(),
            post_count: cache.posts.len(),
            last_updated: cache.metadata.last_updated,
            size_kb: (bytes.len() + 512) / 1024,
            is_valid: is_valid(Some(&cache.metadata), &self.identity, self.max_age_hours),
            identity: cache.metadata.owner_identity,
        })
    }

    /// Set `synced[platform]` on one post.  Returns the updated post, or
    /// `None` if no cached post has that id.
    pub fn update_sync_status(&self, id: &str, platform: &str, synced: bool) -> Result<Option<Post>> {
        self.update_post(id, |post| {
            post.synced.insert(platform.to_string(), synced);
        })
    }

    /// Set the user-confirmed `published[platform]` flag on one post.
    pub fn set_published(&self, id: &str, platform: &str, published: bool) -> Result<Option<Post>> {
        self.update_post(id, |post| {
            post.published.insert(platform.to_string(), published);
        })
    }

    fn update_post(&self, id: &str, change: impl FnOnce(&mut Post)) -> Result<Option<Post>> {
        let mut posts = self.cached_posts()?;
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        change(post);
        let updated = post.clone();
        self.save(&posts)?;
        Ok(Some(updated))
    }

    /// The stored document as pretty JSON with an `exportedAt` timestamp.
    ///
    /// The stored JSON is passed through as is, so fields this crate does
    /// not model survive the round trip.
    pub fn export(&self) -> Result<Vec<u8>> {
        let mut document = match self.store.get(&self.key())? {
            Some(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes)
                .map_err(|e| Error::Validation(format!("stored cache is unreadable: {e}")))?,
            None => serde_json::to_value(Cache::empty(&self.identity))
                .map_err(|e| Error::Storage(format!("cannot serialize cache: {e}")))?,
        };

        let Some(object) = document.as_object_mut() else {
            return Err(Error::Validation("stored cache is not a JSON object".into()));
        };
        object.insert(
            "exportedAt".into(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );

        serde_json::to_vec_pretty(&document)
            .map_err(|e| Error::Storage(format!("cannot serialize export: {e}")))
    }

    /// Replace the cache with the posts of an exported document.
    ///
    /// The blob must be JSON with a top-level `posts` array of valid
    /// records; otherwise nothing is written.  A repeated id keeps its
    /// first record.
    pub fn import(&self, bytes: &[u8]) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::Validation(format!("not valid JSON: {e}")))?;

        let Some(posts) = value.get("posts").filter(|p| p.is_array()) else {
            return Err(Error::Validation("missing posts array".into()));
        };

        let posts: Vec<Post> = serde_json::from_value(posts.clone())
            .map_err(|e| Error::Validation(format!("invalid post record: {e}")))?;
        let total = posts.len();
        let mut seen = HashSet::new();
        let posts: Vec<Post> = posts
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .map(|p| p.normalized(&self.platforms))
            .collect();
        if posts.len() < total {
            info!(dropped = total - posts.len(), "dropped repeated ids from import");
        }

        self.save(&posts)?;
        info!(count = posts.len(), "imported posts");
        Ok(posts.len())
    }
}
