//! Error taxonomy for acquisition and cache operations.
//!
//! Only a handful of these ever reach a caller.  A single failed relay is
//! retried on the next relay; a failed strategy becomes an empty contribution
//! in the orchestrator.  What surfaces is total exhaustion, configuration
//! mistakes, and a malformed import blob.

use thiserror::Error;

/// Errors produced by the acquisition engine and the cache.
#[derive(Debug, Error)]
pub enum Error {
    /// Identity or a required configuration value is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The source platform reports no such author (404-class response).
    #[error("Medium user @{0} not found; check the username and make sure the profile is public")]
    IdentityNotFound(String),

    /// The source platform rate-limited or blocked the relay (403-class response).
    #[error("Medium blocked access to @{0}; this is usually rate limiting, try again later")]
    AccessBlocked(String),

    /// Transport failure on every relay in the pool.
    #[error("relay error: {0}")]
    Relay(String),

    /// The fetched feed or page could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// An imported cache blob is structurally invalid.
    #[error("invalid cache data: {0}")]
    Validation(String),

    /// Every acquisition strategy came back empty or failed.
    #[error("unable to fetch posts for @{0} using any method; check the username and try again")]
    AcquisitionExhausted(String),

    /// The key-value store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A downstream platform did not confirm a publish.
    #[error("publish to {platform} failed: {reason}")]
    Publish { platform: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<rss::Error> for Error {
    fn from(e: rss::Error) -> Self {
        Error::Parse(format!("malformed feed: {e}"))
    }
}
