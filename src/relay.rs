//! Relay pool and the retry-by-rotation fetch every strategy shares.
//!
//! Medium refuses most direct scraping, so every request goes out through a
//! third-party relay: the relay prefix followed by the percent-encoded target
//! URL.  When a relay fails the pool advances to the next one and the request
//! is retried, at most once per relay.  The cursor is left wherever the last
//! failure put it, so a later request starts on the relay that worked last.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Ordered relay templates with a circular cursor.
#[derive(Debug, Clone)]
pub struct RelayPool {
    templates: Vec<String>,
    cursor: usize,
}

impl RelayPool {
    /// An empty pool has no valid cursor, so it is rejected.
    pub fn new(templates: Vec<String>) -> Result<Self> {
        if templates.is_empty() {
            return Err(Error::Configuration("relay pool cannot be empty".into()));
        }
        Ok(Self {
            templates,
            cursor: 0,
        })
    }

    pub fn current(&self) -> &str {
        &self.templates[self.cursor]
    }

    /// Move to the next relay, wrapping at the end, and return it.
    pub fn advance(&mut self) -> &str {
        self.cursor = (self.cursor + 1) % self.templates.len();
        self.current()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Full request URL for `target` through the current relay.
    pub fn relay_url(&self, target: &str) -> String {
        format!("{}{}", self.current(), urlencoding::encode(target))
    }
}

/// HTTP client used for every outbound request.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch `target` through the pool, rotating on failure.
    ///
    /// `subject` names what is being fetched (usually the identity) and ends
    /// up in classified errors.  Once every relay has failed, the error from
    /// the last attempt is returned.
    pub async fn fetch(&self, pool: &mut RelayPool, target: &str, subject: &str) -> Result<String> {
        self.fetch_parsed(pool, target, subject, |body| Ok(body.to_string()))
            .await
    }

    /// Like [`Fetcher::fetch`], but the body must also survive `parse`.
    ///
    /// Relays sometimes answer 200 with their own error page, so a body that
    /// fails to parse counts as a failed attempt and moves on to the next
    /// relay.
    pub async fn fetch_parsed<T, F>(
        &self,
        pool: &mut RelayPool,
        target: &str,
        subject: &str,
        parse: F,
    ) -> Result<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        let mut last_error = None;

        for attempt in 1..=pool.len() {
            let url = pool.relay_url(target);
            debug!(attempt, relay = pool.current(), target, "fetching through relay");

            match self.get(&url, subject).await.and_then(|body| parse(&body)) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    warn!(relay = pool.current(), error = %e, "relay failed");
                    last_error = Some(e);
                    pool.advance();
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Relay("relay pool is empty".into())))
    }

    async fn get(&self, url: &str, subject: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Relay(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, subject));
        }

        response.text().await.map_err(|e| Error::Relay(e.to_string()))
    }
}

fn classify_status(status: StatusCode, subject: &str) -> Error {
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Error::AccessBlocked(subject.to_string())
        }
        StatusCode::NOT_FOUND | StatusCode::GONE => Error::IdentityNotFound(subject.to_string()),
        other => Error::Relay(format!("unexpected status {other}")),
    }
}
