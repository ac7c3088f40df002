//! Bulk enrichment against a mock relay.

use std::time::Duration;

use medium_sync::bulk::{enrich, EnrichOptions};
use medium_sync::{Post, Scraper};
use wiremock::MockServer;

use crate::common::*;

fn cached(slug: &str) -> Post {
    Post::new(slug, slug, story_url(slug), &["devto".to_string()])
}

fn options(max_posts: usize) -> EnrichOptions {
    EnrichOptions {
        enabled: true,
        max_posts,
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn fills_content_and_reading_time() {
    let server = MockServer::start().await;
    mount_target(&server, &story_url("one"), 200, STORY_HTML).await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let mut posts = vec![cached("one")];
    posts[0].reading_time = "9 min read".into();

    assert_eq!(enrich(&mut scraper, &mut posts, &options(10)).await, 1);
    let content = posts[0].content.as_deref().unwrap();
    assert!(content.contains("Each relay is attempted at most once per request."));
    assert_eq!(posts[0].reading_time, "1 min read");
}

#[tokio::test]
async fn failures_leave_posts_untouched() {
    let server = MockServer::start().await;
    mount_target(&server, &story_url("ok"), 200, STORY_HTML).await;
    mount_target(&server, &story_url("broken"), 404, "").await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let mut posts = vec![cached("broken"), cached("ok")];

    assert_eq!(enrich(&mut scraper, &mut posts, &options(10)).await, 1);
    assert!(posts[0].content.is_none());
    assert!(posts[1].content.is_some());
}

#[tokio::test]
async fn respects_limit_and_skips_posts_with_content() {
    let server = MockServer::start().await;
    for slug in ["a", "b", "c"] {
        mount_target(&server, &story_url(slug), 200, STORY_HTML).await;
    }

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let mut done = cached("a");
    done.content = Some("already here".into());
    let mut posts = vec![done, cached("b"), cached("c")];

    assert_eq!(enrich(&mut scraper, &mut posts, &options(1)).await, 1);
    assert_eq!(posts[0].content.as_deref(), Some("already here"));
    assert!(posts[1].content.is_some());
    assert!(posts[2].content.is_none());
}

#[tokio::test]
async fn wordless_page_is_not_stored() {
    let server = MockServer::start().await;
    mount_target(
        &server,
        &story_url("blocked"),
        200,
        "<html><body><div>Just a moment...</div></body></html>",
    )
    .await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let mut posts = vec![cached("blocked")];
    posts[0].reading_time = "7 min read".into();

    assert_eq!(enrich(&mut scraper, &mut posts, &options(10)).await, 0);
    assert!(posts[0].content.is_none());
    assert_eq!(posts[0].reading_time, "7 min read");
}
