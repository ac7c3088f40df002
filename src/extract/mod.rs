//! Full-article extraction.
//!
//! Fetches a rendered Medium story and rebuilds its body as Markdown.  Medium
//! has shipped several page layouts over the years, so the body container is
//! located by trying a list of selectors in order and accepting the first
//! one that holds a meaningful amount of content.
//!
//! Extraction is best-effort: when every relay fails the result is `None`,
//! and callers fall back to the post's short description.

mod markdown;

pub use markdown::{elements_to_markdown, inline_markdown};

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::relay::{Fetcher, RelayPool};

/// Body containers, most specific first.
const CONTAINER_SELECTORS: &[&str] = &[
    "article section",
    r#"article div[data-testid="storyBody"]"#,
    "article .postArticle-content",
    r#"[data-testid="storyBody"]"#,
    ".section-content",
];

const TITLE_SELECTORS: &[&str] = &["h1", r#"[data-testid="storyTitle"]"#, ".graf--title"];

const SUBTITLE_SELECTORS: &[&str] = &["h2", ".graf--subtitle", r#"[data-testid="storySubtitle"]"#];

/// A container needs more than this many content elements to be trusted.
const MIN_CONTAINER_ELEMENTS: usize = 5;

/// Cap on elements collected when no container qualifies.
const FALLBACK_ELEMENT_LIMIT: usize = 50;

static CONTENT_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, blockquote, pre, code, figure, img, ul, ol, li")
        .expect("valid content selector")
});

static FALLBACK_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h2, h3, h4, h5, h6, blockquote, pre, figure, img, ul, ol")
        .expect("valid fallback selector")
});

static STORY_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/@([^/?#]+)").expect("valid story author regex"));

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(CONTAINER_SELECTORS));
static TITLES: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(TITLE_SELECTORS));
static SUBTITLES: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(SUBTITLE_SELECTORS));

fn parse_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).expect("valid hardcoded selector"))
        .collect()
}

/// A story rebuilt from its rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub subtitle: String,
    /// Markdown body ending with an attribution footer.
    pub content: String,
    /// Words in the plain text of the collected elements.
    pub word_count: usize,
}

pub struct ContentExtractor {
    fetcher: Fetcher,
}

impl ContentExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch and convert one story.  `None` means the content is unavailable.
    pub async fn extract(&self, relays: &mut RelayPool, post_url: &str) -> Option<Article> {
        debug!(url = post_url, "fetching full content");
        match self.fetcher.fetch(relays, post_url, story_author(post_url)).await {
            Ok(html) => Some(extract_article(&html, post_url)),
            Err(e) => {
                warn!(url = post_url, error = %e, "full content unavailable");
                None
            }
        }
    }
}

/// Author handle in a story permalink, used to word fetch errors; the whole
/// URL when the permalink carries no `@handle`.
fn story_author(post_url: &str) -> &str {
    STORY_AUTHOR
        .captures(post_url)
        .and_then(|c| c.get(1))
        .map_or(post_url, |m| m.as_str())
}

/// Pure conversion of a rendered story page.
pub fn extract_article(html: &str, post_url: &str) -> Article {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLES);
    let subtitle = first_text(&document, &SUBTITLES);
    let elements = content_elements(&document);

    let word_count = elements
        .iter()
        .map(|el| el.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .count();

    Article {
        title,
        subtitle,
        content: elements_to_markdown(&elements, post_url),
        word_count,
    }
}

/// Text of the first element matched by the first selector that matches at all.
fn first_text(document: &Html, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn content_elements(document: &Html) -> Vec<ElementRef<'_>> {
    for selector in CONTAINERS.iter() {
        let Some(container) = document.select(selector).next() else {
            continue;
        };
        let elements: Vec<_> = container.select(&CONTENT_ELEMENTS).collect();
        if elements.len() > MIN_CONTAINER_ELEMENTS {
            return elements;
        }
    }

    debug!("no content container qualified, collecting loose elements");
    document
        .select(&FALLBACK_ELEMENTS)
        .take(FALLBACK_ELEMENT_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = r#"<html><body>
      <nav><p>Sign in to read more stories today</p></nav>
      <article>
        <h1>Ownership in Practice</h1>
        <h2>What the borrow checker is really asking</h2>
        <section>
          <p>Rust tracks who owns every value at compile time.</p>
          <h3>Moves</h3>
          <p>Assigning a <code>String</code> moves it to the new binding.</p>
          <blockquote>Borrow, don't clone.</blockquote>
          <pre><code>let s2 = s1;</code></pre>
          <ul><li>Shared borrows</li><li>Mutable borrows</li></ul>
          <figure><img src="https://miro.example/img.png?w=800" alt="Boxes"><figcaption>Stack and heap</figcaption></figure>
        </section>
      </article>
    </body></html>"#;

    #[test]
    fn extracts_title_and_subtitle() {
        let article = extract_article(STORY, "https://medium.com/@a/ownership");
        assert_eq!(article.title, "Ownership in Practice");
        assert_eq!(article.subtitle, "What the borrow checker is really asking");
    }

    #[test]
    fn uses_article_container_and_skips_chrome() {
        let article = extract_article(STORY, "https://medium.com/@a/ownership");
        let md = &article.content;

        assert!(!md.contains("Sign in"), "nav paragraph is outside the container");
        assert!(md.starts_with("Rust tracks who owns every value at compile time."));
        assert!(md.contains("### Moves"));
        assert!(md.contains("Assigning a `String` moves it to the new binding."));
        assert!(md.contains("> Borrow, don't clone."));
        assert!(md.contains("```\nlet s2 = s1;\n```"));
        assert!(md.contains("- Shared borrows\n- Mutable borrows"));
        assert!(md.contains("![Boxes](https://miro.example/img.png)\n*Stack and heap*"));
        assert!(md.ends_with("*Originally published on [Medium](https://medium.com/@a/ownership)*"));
    }

    #[test]
    fn word_count_covers_collected_elements() {
        let article = extract_article(STORY, "u");
        assert!(article.word_count >= 20, "got {}", article.word_count);
    }

    fn story_with_paragraphs(count: usize) -> String {
        let body: String = (0..count)
            .map(|i| format!("<p>Paragraph number {i} of the story body.</p>"))
            .collect();
        format!(
            "<html><body><aside><p>Related reading outside the story.</p></aside>\
             <article><section>{body}</section></article></body></html>"
        )
    }

    #[test]
    fn container_with_exactly_five_elements_is_not_trusted() {
        let article = extract_article(&story_with_paragraphs(5), "u");
        assert!(article.content.contains("Related reading outside the story."));
        assert!(article.content.contains("Paragraph number 4 of the story body."));
    }

    #[test]
    fn container_with_six_elements_is_used() {
        let article = extract_article(&story_with_paragraphs(6), "u");
        assert!(!article.content.contains("Related reading"));
        assert!(article.content.starts_with("Paragraph number 0 of the story body."));
        assert!(article.content.contains("Paragraph number 5 of the story body."));
    }

    #[test]
    fn fetch_errors_name_the_story_author() {
        assert_eq!(story_author("https://medium.com/@alice/ownership-1a2b?source=rss"), "alice");
        assert_eq!(story_author("https://medium.com/@bob"), "bob");
        assert_eq!(story_author("https://blog.example/post"), "https://blog.example/post");
    }

    #[test]
    fn falls_back_to_loose_elements() {
        let html = "<html><body><div><p>Only a loose paragraph of text.</p></div></body></html>";
        let article = extract_article(html, "u");
        assert!(article.content.starts_with("Only a loose paragraph of text."));
        assert_eq!(article.title, "");
        assert_eq!(article.word_count, 6);
    }
}
