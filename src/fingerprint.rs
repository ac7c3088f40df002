//! Stable post identifiers.
//!
//! Ids are derived from the title whenever there is one, so the feed and the
//! archive page produce the same id for the same article even though they
//! report slightly different URLs.  Everything else in the crate that
//! de-duplicates relies on this being a pure function.

use std::sync::LazyLock;

use regex::Regex;

const SLUG_LEN: usize = 30;
const HASH_LEN: usize = 6;
const URL_SLUG_LEN: usize = 20;

/// First path segment after `@identity/`, up to the first `-`, `/` or `?`.
static URL_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[^/]+/([^/?-]+)").expect("valid url slug regex"));

/// Derive a post id from its title, falling back to its URL.
///
/// Returns `None` when neither yields anything; such a post cannot be
/// de-duplicated and callers drop it.
pub fn generate_id(url: &str, title: &str) -> Option<String> {
    if !title.is_empty() {
        return Some(format!("{}-{}", slugify(title), title_hash(title)));
    }

    let captures = URL_SLUG.captures(url)?;
    let slug: String = captures[1]
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(URL_SLUG_LEN)
        .collect();

    (!slug.is_empty()).then_some(slug)
}

/// Lowercase, drop everything but `[a-z0-9]` and whitespace, turn each
/// whitespace run into one `-`, keep the first 30 characters.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_space = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_space = false;
        }
    }

    slug.chars().take(SLUG_LEN).collect()
}

/// 31-multiplier polynomial hash over UTF-16 code units, wrapped to `i32`,
/// rendered as six base-36 digits.
fn title_hash(title: &str) -> String {
    let hash = title
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));

    let digits = to_base36(hash.unsigned_abs());
    format!("{digits:0>width$}", width = HASH_LEN)
        .chars()
        .take(HASH_LEN)
        .collect()
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
