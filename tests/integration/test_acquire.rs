//! Acquisition orchestrator against a mock relay:
//! - archive top-up when the feed is thin
//! - no archive request when the feed is enough or deep scraping is off
//! - fallback when the feed is missing
//! - exhaustion when every strategy comes back empty
//! - article extraction through the relay

use std::collections::HashSet;

use medium_sync::{Config, Error, Scraper};
use wiremock::MockServer;

use crate::common::*;

#[tokio::test]
async fn thin_feed_is_topped_up_from_archive() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(3)).await;
    mount_target(
        &server,
        ARCHIVE_URL,
        200,
        &archive_html(&["Feed story 1", "Only in archive", "Also archived"]),
    )
    .await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let posts = scraper.acquire(IDENTITY).await.unwrap();

    let titles: HashSet<_> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(posts.len(), 5, "duplicate title merged once: {titles:?}");
    assert!(titles.contains("Only in archive"));
    assert!(titles.contains("Also archived"));

    // The feed copy of the shared story wins over the bare archive copy.
    let shared = posts.iter().find(|p| p.title == "Feed story 1").unwrap();
    assert!(shared.published_at.is_some());
    assert_eq!(shared.tags, vec!["rust"]);

    let ids: HashSet<_> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), posts.len());
}

#[tokio::test]
async fn full_feed_skips_archive() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(15)).await;
    forbid_target(&server, ARCHIVE_URL).await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let posts = scraper.acquire(IDENTITY).await.unwrap();

    assert_eq!(posts.len(), 15);
    assert_eq!(posts[0].title, "Feed story 14", "newest first");
}

#[tokio::test]
async fn deep_scraping_disabled_uses_feed_only() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(2)).await;
    forbid_target(&server, ARCHIVE_URL).await;

    let config = Config {
        enable_deep_scraping: false,
        ..config_for(&server)
    };
    let mut scraper = Scraper::new(&config).unwrap();
    assert_eq!(scraper.acquire(IDENTITY).await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_feed_falls_back_to_archive() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 404, "").await;
    mount_target(&server, ARCHIVE_URL, 200, &archive_html(&["Rescued story"])).await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let posts = scraper.acquire("@alice").await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Rescued story");
    assert_eq!(posts[0].url, story_url("archived-0-f000"));
    assert_eq!(posts[0].reading_time, "5 min read");
}

#[tokio::test]
async fn max_posts_caps_the_merged_result() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(4)).await;
    mount_target(&server, ARCHIVE_URL, 200, &archive_html(&["Extra one", "Extra two"])).await;

    let config = Config {
        max_posts: 3,
        ..config_for(&server)
    };
    let mut scraper = Scraper::new(&config).unwrap();
    assert_eq!(scraper.acquire(IDENTITY).await.unwrap().len(), 3);
}

#[tokio::test]
async fn everything_empty_is_exhaustion() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(0)).await;
    mount_target(&server, ARCHIVE_URL, 200, "<html><body>nothing here</body></html>").await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let err = scraper.acquire(IDENTITY).await.unwrap_err();
    assert!(matches!(err, Error::AcquisitionExhausted(ref id) if id == IDENTITY));
}

#[tokio::test]
async fn blocked_relays_end_in_exhaustion() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 429, "").await;
    mount_target(&server, ARCHIVE_URL, 403, "").await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    assert!(matches!(
        scraper.acquire(IDENTITY).await,
        Err(Error::AcquisitionExhausted(_))
    ));
}

#[tokio::test]
async fn acquire_new_returns_only_uncached_posts() {
    let server = MockServer::start().await;
    mount_target(&server, FEED_URL, 200, &feed_xml(15)).await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let all = scraper.acquire(IDENTITY).await.unwrap();
    let fresh = scraper.acquire_new(IDENTITY, &all[..10]).await.unwrap();

    assert_eq!(fresh.len(), 5);
    assert_eq!(fresh, all[10..].to_vec());
}

#[tokio::test]
async fn extract_converts_story_page() {
    let server = MockServer::start().await;
    let url = story_url("working-with-relays-123");
    mount_target(&server, &url, 200, STORY_HTML).await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    let article = scraper.extract(&url).await.unwrap();

    assert_eq!(article.title, "Working with Relays");
    assert_eq!(article.subtitle, "Rotating until one answers");
    assert!(article.content.starts_with("Every request leaves through a public relay."));
    assert!(article.content.contains("- First relay\n- Second relay"));
    assert!(article.content.ends_with(&format!("*Originally published on [Medium]({url})*")));
}

#[tokio::test]
async fn extract_is_none_when_relays_fail() {
    let server = MockServer::start().await;
    let url = story_url("gone");
    mount_target(&server, &url, 500, "").await;

    let mut scraper = Scraper::new(&config_for(&server)).unwrap();
    assert!(scraper.extract(&url).await.is_none());
}
