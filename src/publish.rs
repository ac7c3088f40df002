//! Capability contract for downstream publishing platforms.
//!
//! The crate never talks to Dev.to or Hashnode itself.  A binding implements
//! [`Publisher`] however it likes (REST, GraphQL, a test double), and the
//! bulk sync loop in [`crate::bulk`] drives it.

use async_trait::async_trait;

use crate::error::Result;
use crate::source::Post;

/// What a platform reported after a publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub success: bool,
    /// Public URL of the new article; may be empty on failure.
    pub url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Key used in a post's `synced`, `published` and `platform_urls` maps.
    fn platform(&self) -> &str;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool;

    async fn article_exists(&self, post: &Post) -> Result<bool>;

    async fn publish_article(&self, post: &Post) -> Result<PublishResult>;
}
