//! Resolved configuration.
//!
//! The engine never reads the environment itself: it is handed a [`Config`]
//! value, usually loaded from a YAML file.  Every field has a default, so an
//! empty file (or no file at all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Relay prefixes tried in order; the percent-encoded target URL is appended.
pub const DEFAULT_RELAYS: &[&str] = &[
    "https://api.allorigins.win/raw?url=",
    "https://api.codetabs.com/v1/proxy?quest=",
    "https://corsproxy.io/?",
];

/// Downstream platforms whose flags every record carries.
pub const DEFAULT_PLATFORMS: &[&str] = &["devto", "hashnode"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Medium handle to scrape, with or without the leading `@`.
    pub identity: Option<String>,
    /// Cap on returned posts; `0` means unlimited.
    pub max_posts: usize,
    /// Cap on tags kept per post.
    pub max_tags: usize,
    /// Run the archive strategy when the feed yields few posts.
    pub enable_deep_scraping: bool,
    /// Accepted for compatibility; the archive is read as a single page.
    pub max_scraping_pages: usize,
    /// Fixed pause between records in bulk operations.
    pub scraping_delay_ms: u64,
    /// Per-request timeout.
    pub scraping_timeout_ms: u64,
    /// Allow bulk enrichment of post bodies.
    pub enable_data_enrichment: bool,
    /// Upper bound on posts enriched in one pass.
    pub max_enrichment_posts: usize,
    pub relays: Vec<String>,
    pub platforms: Vec<String>,
    /// Cache age after which it is reported as stale.
    pub cache_max_age_hours: f64,
    /// Directory holding the file-backed cache store.
    pub cache_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: None,
            max_posts: 0,
            max_tags: 10,
            enable_deep_scraping: true,
            max_scraping_pages: 10,
            scraping_delay_ms: 1000,
            scraping_timeout_ms: 20_000,
            enable_data_enrichment: false,
            max_enrichment_posts: 20,
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            platforms: DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect(),
            cache_max_age_hours: 24.0,
            cache_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("medium-sync"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Typically `$XDG_CONFIG_HOME/medium-sync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("medium-sync")
            .join("config.yaml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.relays.is_empty() {
            return Err(Error::Configuration("at least one relay is required".into()));
        }
        if self.platforms.is_empty() {
            return Err(Error::Configuration(
                "at least one downstream platform is required".into(),
            ));
        }
        Ok(())
    }

    /// The configured identity without its leading `@`.
    pub fn resolved_identity(&self) -> Result<String> {
        match &self.identity {
            Some(id) => normalize_identity(id),
            None => Err(Error::Configuration("Medium username is not configured".into())),
        }
    }

    pub fn scraping_delay(&self) -> Duration {
        Duration::from_millis(self.scraping_delay_ms)
    }

    pub fn scraping_timeout(&self) -> Duration {
        Duration::from_millis(self.scraping_timeout_ms)
    }
}

/// Strip a leading `@` and surrounding whitespace; reject blank handles.
pub fn normalize_identity(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let clean = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if clean.is_empty() {
        return Err(Error::Configuration("Medium username is required".into()));
    }
    Ok(clean.to_string())
}
