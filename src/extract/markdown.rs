//! Element-by-element Markdown emission.
//!
//! The extractor hands over a flat, document-ordered list of content
//! elements.  Because that list is produced by a descendant selector, a `ul`
//! and its `li` children (or a `figure` and its `img`) both appear in it; an
//! element that is emitted as a whole consumes its descendants so nothing is
//! written twice.

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Node, Selector};

/// Anything shorter is noise (icons, separators, stray punctuation).
const MIN_ELEMENT_CHARS: usize = 3;
/// Paragraphs shorter than this are bylines, dates, clap counts.
const MIN_PARAGRAPH_CHARS: usize = 10;

static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid img selector"));
static FIGCAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("figcaption").expect("valid figcaption selector"));
static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+x\d+$").expect("valid size suffix regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

/// Render `elements` as Markdown followed by an attribution footer.
pub fn elements_to_markdown(elements: &[ElementRef<'_>], source_url: &str) -> String {
    let mut markdown = String::new();
    let mut consumed: HashSet<NodeId> = HashSet::new();

    for &element in elements {
        if consumed.contains(&element.id()) {
            continue;
        }

        let name = element.value().name();
        let text = plain_text(element);
        // Applies to every kind, so a figure needs a caption to survive.
        if text.chars().count() < MIN_ELEMENT_CHARS {
            continue;
        }

        let emitted = match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                markdown.push_str(&format!("\n{} {}\n\n", "#".repeat(level), text));
                true
            }
            "blockquote" => {
                markdown.push_str(&format!("\n> {}\n\n", inline_markdown(element)));
                true
            }
            "pre" => {
                markdown.push_str(&fenced(&text));
                true
            }
            "code" if parent_is_pre(element) => {
                markdown.push_str(&fenced(&text));
                true
            }
            "code" => {
                markdown.push_str(&format!("`{text}`"));
                true
            }
            "img" | "figure" => match image_markdown(element) {
                Some(image) => {
                    markdown.push_str(&image);
                    true
                }
                None => false,
            },
            "ul" | "ol" => {
                markdown.push_str(&list_markdown(element, name == "ol"));
                true
            }
            "li" => {
                let item = inline_markdown(element);
                if !item.is_empty() {
                    markdown.push_str(&format!("- {item}\n"));
                }
                true
            }
            _ => {
                if text.chars().count() >= MIN_PARAGRAPH_CHARS {
                    let formatted = inline_markdown(element);
                    if !formatted.is_empty() {
                        markdown.push_str(&format!("{formatted}\n\n"));
                    }
                    true
                } else {
                    false
                }
            }
        };

        if emitted {
            consumed.extend(element.descendants().skip(1).map(|node| node.id()));
        }
    }

    markdown.push_str(&format!(
        "\n---\n\n*Originally published on [Medium]({source_url})*\n"
    ));

    EXCESS_NEWLINES
        .replace_all(&markdown, "\n\n")
        .trim()
        .to_string()
}

/// Trimmed text content of an element.
pub fn plain_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Inline formatting, in precedence order.  An outer element of a given kind
/// flattens inner elements of the same or later kinds to text, so a link
/// inside bold text comes out as bold text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Inline {
    Bold,
    Italic,
    Code,
    Link,
}

/// Text of `element` with bold, italic, inline code and links converted.
///
/// The element itself is not transformed, only its descendants, and the
/// source tree is only read.
pub fn inline_markdown(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_children(element, None, &mut out);
    out.trim().to_string()
}

fn inline_kind(element: ElementRef<'_>) -> Option<Inline> {
    match element.value().name() {
        "strong" | "b" => Some(Inline::Bold),
        "em" | "i" => Some(Inline::Italic),
        "code" if !parent_is_pre(element) => Some(Inline::Code),
        "a" => Some(Inline::Link),
        _ => None,
    }
}

fn render_children(element: ElementRef<'_>, limit: Option<Inline>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, limit, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, limit: Option<Inline>, out: &mut String) {
    let kind = inline_kind(element).filter(|kind| limit.map_or(true, |l| *kind < l));

    match kind {
        Some(Inline::Bold) => {
            out.push_str("**");
            out.push_str(&element.text().collect::<String>());
            out.push_str("**");
        }
        Some(Inline::Italic) => {
            out.push('*');
            render_children(element, Some(Inline::Italic), out);
            out.push('*');
        }
        Some(Inline::Code) => {
            out.push('`');
            render_children(element, Some(Inline::Code), out);
            out.push('`');
        }
        Some(Inline::Link) => {
            let mut label = String::new();
            render_children(element, Some(Inline::Link), &mut label);
            match element.value().attr("href") {
                Some(href) if !href.is_empty() && !label.is_empty() => {
                    out.push_str(&format!("[{label}]({href})"));
                }
                _ => out.push_str(&label),
            }
        }
        None => render_children(element, limit, out),
    }
}

fn parent_is_pre(element: ElementRef<'_>) -> bool {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| parent.value().name() == "pre")
}

fn fenced(code: &str) -> String {
    format!("\n```\n{code}\n```\n\n")
}

/// One line per direct `li` child; ordered lists count from 1.
fn list_markdown(list: ElementRef<'_>, ordered: bool) -> String {
    let mut out = String::new();
    let items = list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li");

    for (index, item) in items.enumerate() {
        let text = inline_markdown(item);
        if text.is_empty() {
            continue;
        }
        if ordered {
            out.push_str(&format!("{}. {text}\n", index + 1));
        } else {
            out.push_str(&format!("- {text}\n"));
        }
    }
    out.push('\n');
    out
}

/// `![alt](src)` plus an italic caption line, for an `img` or a `figure`.
fn image_markdown(element: ElementRef<'_>) -> Option<String> {
    let (img, caption) = if element.value().name() == "img" {
        (Some(element), None)
    } else {
        let caption = element
            .select(&FIGCAPTION)
            .next()
            .map(plain_text)
            .filter(|c| !c.is_empty());
        (element.select(&IMG).next(), caption)
    };

    let img = img?;
    let src = img
        .value()
        .attr("src")
        .or_else(|| img.value().attr("data-src"))
        .map(clean_image_src)
        .filter(|src| !src.is_empty())?;
    let alt = img
        .value()
        .attr("alt")
        .filter(|alt| !alt.is_empty())
        .unwrap_or("Image");

    let mut out = format!("\n![{alt}]({src})\n");
    if let Some(caption) = caption {
        out.push_str(&format!("*{caption}*\n"));
    }
    out.push('\n');
    Some(out)
}

/// Drop the query string and a trailing `/WxH` size segment.
fn clean_image_src(src: &str) -> String {
    let without_query = src.split('?').next().unwrap_or(src);
    SIZE_SUFFIX.replace(without_query, "").into_owned()
}
