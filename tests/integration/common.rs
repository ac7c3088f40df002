//! Shared helpers: a mock relay plus feed, archive and story fixtures.

use chrono::{Duration, TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medium_sync::Config;

pub const IDENTITY: &str = "alice";
pub const FEED_URL: &str = "https://medium.com/feed/@alice";
pub const ARCHIVE_URL: &str = "https://medium.com/@alice/archive";

/// Config whose only relay is the mock server.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        identity: Some(IDENTITY.into()),
        relays: vec![format!("{}/raw?url=", server.uri())],
        scraping_delay_ms: 0,
        scraping_timeout_ms: 5_000,
        ..Config::default()
    }
}

/// Mounts a relay response for one target URL.
pub async fn mount_target(server: &MockServer, target: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/raw"))
        .and(query_param("url", target))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a target that must never be requested.
pub async fn forbid_target(server: &MockServer, target: &str) {
    Mock::given(method("GET"))
        .and(path("/raw"))
        .and(query_param("url", target))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

pub fn story_url(slug: &str) -> String {
    format!("https://medium.com/@alice/{slug}")
}

/// RSS document with `count` dated entries, newest last.
pub fn feed_xml(count: usize) -> String {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let items: String = (0..count)
        .map(|i| {
            let date = (base + Duration::days(i as i64)).to_rfc2822();
            format!(
                "<item><title>Feed story {i}</title><link>{}</link>\
                 <description>Body of feed story number {i}.</description>\
                 <category>rust</category><pubDate>{date}</pubDate></item>",
                story_url(&format!("feed-story-{i}-a1b2c3"))
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Stories by Alice</title>
<link>https://medium.com/@alice</link><description>Alice</description>
{items}</channel></rss>"#
    )
}

/// Archive listing page linking each title as a story.
pub fn archive_html(titles: &[&str]) -> String {
    let links: String = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            format!(r#"<div><a href="/@alice/archived-{i}-f00{i}?source=archive"><h2>{title}</h2></a></div>"#)
        })
        .collect();
    format!(
        r#"<html><body><a href="/@alice/archive">Archive</a><a href="/@bob/other">Bob</a>{links}</body></html>"#
    )
}

pub const STORY_HTML: &str = r#"<html><body>
  <article>
    <h1>Working with Relays</h1>
    <h2>Rotating until one answers</h2>
    <section>
      <p>Every request leaves through a public relay.</p>
      <p>When one relay fails the next one is tried.</p>
      <h3>Limits</h3>
      <p>Each relay is attempted at most once per request.</p>
      <ul><li>First relay</li><li>Second relay</li></ul>
      <blockquote>Fail over, never loop.</blockquote>
    </section>
  </article>
</body></html>"#;
