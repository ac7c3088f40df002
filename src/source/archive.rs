//! Archive strategy: the profile's `/archive` listing page.
//!
//! The listing is rendered HTML with no dates or summaries, so all this
//! strategy can recover is a title and a permalink per story.  That is still
//! enough to fingerprint the post and find the ones the feed no longer lists.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::info;

use super::{archive_url, DataSource, Post, StrategyOptions, MEDIUM_BASE};
use crate::error::Result;
use crate::fingerprint::generate_id;
use crate::relay::{Fetcher, RelayPool};

const PLACEHOLDER_TITLE: &str = "Untitled Post";
const ARCHIVE_DESCRIPTION: &str = "Post from Medium archive...";
const ARCHIVE_READING_TIME: &str = "5 min read";

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").expect("valid heading selector"));

pub struct ArchiveSource {
    fetcher: Fetcher,
    options: StrategyOptions,
}

impl ArchiveSource {
    pub fn new(fetcher: Fetcher, options: StrategyOptions) -> Self {
        Self { fetcher, options }
    }

    /// Extract minimal posts from an archive page.  Never fails; a page
    /// without recognisable story links yields an empty list.
    pub fn parse_archive(html: &str, identity: &str, options: &StrategyOptions) -> Vec<Post> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for link in document.select(&LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !is_story_link(href, identity) {
                continue;
            }

            let title = link_title(link);
            if title.is_empty() || title == PLACEHOLDER_TITLE {
                continue;
            }

            let url = canonical_url(href);
            let Some(id) = generate_id(&url, &title) else {
                continue;
            };
            if !seen.insert(id.clone()) {
                continue;
            }

            let mut post = Post::new(id, title, url, &options.platforms);
            post.description = ARCHIVE_DESCRIPTION.to_string();
            post.reading_time = ARCHIVE_READING_TIME.to_string();
            posts.push(post);
        }

        info!(count = posts.len(), "parsed posts from archive page");
        posts
    }
}

#[async_trait]
impl DataSource for ArchiveSource {
    fn name(&self) -> &str {
        "archive"
    }

    async fn fetch(&self, identity: &str, relays: &mut RelayPool) -> Result<Vec<Post>> {
        let options = &self.options;
        self.fetcher
            .fetch_parsed(relays, &archive_url(identity), identity, |body| {
                Ok(Self::parse_archive(body, identity, options))
            })
            .await
    }
}

/// True for links under `/@identity/<something>` other than the archive itself.
fn is_story_link(href: &str, identity: &str) -> bool {
    let lower = href.to_lowercase();
    let namespace = format!("/@{}", identity.to_lowercase());

    let rest = if let Some(rest) = lower.strip_prefix(&namespace) {
        rest
    } else if let Some(pos) = lower.find(&format!("medium.com{namespace}")) {
        &lower[pos + "medium.com".len() + namespace.len()..]
    } else {
        return false;
    };

    // `/@alice` must not match `/@alicex`, and the bare profile is not a story.
    let Some(path) = rest.strip_prefix('/') else {
        return false;
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    !path.is_empty() && !path.starts_with("archive")
}

/// Prefer a nested heading; fall back to the whole link text.
fn link_title(link: ElementRef<'_>) -> String {
    let heading = link
        .select(&HEADING)
        .map(|h| squash(h.text()))
        .find(|t| !t.is_empty());
    heading.unwrap_or_else(|| squash(link.text()))
}

fn squash<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Absolute URL without tracking query parameters.
fn canonical_url(href: &str) -> String {
    let path = href.split('?').next().unwrap_or(href);
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{MEDIUM_BASE}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> StrategyOptions {
        StrategyOptions {
            max_posts: 0,
            max_tags: 10,
            platforms: vec!["devto".into()],
        }
    }

    const PAGE: &str = r#"<html><body>
      <a href="https://medium.com/@alice/archive">Archive</a>
      <a href="https://medium.com/@alice">Alice</a>
      <a href="https://medium.com/@alice/first-story-abc?source=archive">
        <h2>First Story</h2><p>A subtitle</p>
      </a>
      <a href="/@alice/second-story-def">Second   Story</a>
      <a href="/@alice/second-story-def?source=dupe">Second Story</a>
      <a href="/@alice/untitled-1">Untitled Post</a>
      <a href="/@alice/empty-2"><img src="x.png"></a>
      <a href="https://medium.com/@alicex/other-ghi">Someone Else</a>
      <a href="/tag/rust">Rust</a>
    </body></html>"#;

    #[test]
    fn keeps_story_links_in_identity_namespace() {
        let posts = ArchiveSource::parse_archive(PAGE, "alice", &options());
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["First Story", "Second Story"]);
    }

    #[test]
    fn builds_minimal_records() {
        let posts = ArchiveSource::parse_archive(PAGE, "alice", &options());
        let first = &posts[0];
        assert_eq!(first.url, "https://medium.com/@alice/first-story-abc");
        assert_eq!(first.id, generate_id("", "First Story").unwrap());
        assert_eq!(first.description, ARCHIVE_DESCRIPTION);
        assert!(first.tags.is_empty());
        assert!(first.content.is_none());
        assert_eq!(posts[1].url, "https://medium.com/@alice/second-story-def");
    }

    #[test]
    fn page_without_candidates_is_empty() {
        let posts = ArchiveSource::parse_archive("<html><p>nothing</p></html>", "alice", &options());
        assert!(posts.is_empty());
    }

    #[test]
    fn story_link_detection() {
        assert!(is_story_link("https://medium.com/@Alice/post-1", "alice"));
        assert!(is_story_link("/@alice/post-1", "alice"));
        assert!(!is_story_link("/@alice/archive?page=2", "alice"));
        assert!(!is_story_link("/@alice/", "alice"));
        assert!(!is_story_link("/@alicex/post", "alice"));
    }
}
