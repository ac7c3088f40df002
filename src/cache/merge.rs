//! Reconciliation rules: merging fresh posts into cached ones and deciding
//! whether a cache may be trusted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::CacheMetadata;
use crate::source::{sort_newest_first, Post};

/// Cached posts plus the new posts whose id is not cached yet, newest first.
///
/// Cached posts always win, which is what keeps their sync and publish flags
/// across re-scrapes.  A repeated id within either list keeps its first copy.
/// Every post comes out with a `published` map, so caches written before
/// that field existed are upgraded on the way through.
pub fn merge(cached: &[Post], new: &[Post], platforms: &[String]) -> Vec<Post> {
    let mut seen: HashSet<&str> = HashSet::new();
    let kept_cached: Vec<&Post> = cached
        .iter()
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();
    let unique_new: Vec<&Post> = new
        .iter()
        .filter(|p| seen.insert(p.id.as_str()))
        .collect();

    info!(
        cached = kept_cached.len(),
        new = unique_new.len(),
        total = kept_cached.len() + unique_new.len(),
        "merging posts"
    );

    let mut merged: Vec<Post> = kept_cached
        .into_iter()
        .chain(unique_new)
        .map(|p| p.clone().normalized(platforms))
        .collect();
    sort_newest_first(&mut merged);
    merged
}

/// Whether a cache belongs to `identity` and is younger than `max_age_hours`.
///
/// Staleness is advisory; nothing is deleted here.
pub fn is_valid(metadata: Option<&CacheMetadata>, identity: &str, max_age_hours: f64) -> bool {
    is_valid_at(metadata, identity, max_age_hours, Utc::now())
}

pub fn is_valid_at(
    metadata: Option<&CacheMetadata>,
    identity: &str,
    max_age_hours: f64,
    now: DateTime<Utc>,
) -> bool {
    let Some(metadata) = metadata else {
        return false;
    };

    if metadata.owner_identity.as_deref() != Some(identity) {
        debug!(
            cached = metadata.owner_identity.as_deref().unwrap_or_default(),
            identity, "cache invalid: different identity"
        );
        return false;
    }

    let Some(last_updated) = metadata.last_updated else {
        return false;
    };

    let age_hours = (now - last_updated).num_seconds() as f64 / 3600.0;
    if age_hours > max_age_hours {
        debug!(age_hours, max_age_hours, "cache expired");
        return false;
    }

    true
}
