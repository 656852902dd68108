//! Shared helpers for tokenizing and rendering.

use pulldown_cmark::HeadingLevel;

use crate::token::Attrs;

/// Attribute holding fence info words that are not `key=value` pairs.
pub(crate) const FENCE_INFO_ATTR: &str = "info";

/// HTML tag for a heading level.
#[must_use]
pub(crate) fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// Heading level (1-6) from a heading tag like `h3`.
///
/// Missing or malformed tags fall back to level 1.
#[must_use]
pub(crate) fn heading_level_from_tag(tag: Option<&str>) -> u8 {
    tag.and_then(|t| t.strip_prefix('h'))
        .and_then(|n| n.parse::<u8>().ok())
        .map_or(1, |n| n.clamp(1, 6))
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [word ...] [key=value ...]`. Words that are not
/// `key=value` pairs are kept, space-joined, under [`FENCE_INFO_ATTR`]
/// unless an explicit `info=...` pair is present.
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, Attrs) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut attrs = Attrs::new();
    let mut words = Vec::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            // Strip quotes if present
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        } else {
            words.push(part);
        }
    }
    if !words.is_empty() {
        attrs
            .entry(FENCE_INFO_ATTR.to_owned())
            .or_insert_with(|| words.join(" "));
    }

    (language, attrs)
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
