//! Heading anchor ids.
//!
//! Both the HTML renderer and the TOC extractor derive heading ids through
//! [`Slugger`] and [`heading_text`], so the `id` attribute of the n-th heading
//! element always equals the n-th TOC entry id for the same markdown.

use std::collections::{HashMap, HashSet};

use crate::token::Token;

/// Id used when a heading has no alphanumeric text.
const EMPTY_SLUG: &str = "section";

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    // Remove trailing dash if present
    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Generates unique heading ids for one document.
///
/// Create one per render call. Ids depend only on headings seen earlier in
/// the same document.
#[derive(Debug, Default)]
pub struct Slugger {
    /// Occurrences per base slug.
    counts: HashMap<String, usize>,
    /// Every id handed out so far.
    issued: HashSet<String>,
}

impl Slugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a unique id for heading text.
    ///
    /// The first occurrence of a base slug is returned as is, later ones get
    /// `-1`, `-2`, ... appended. A suffixed id that collides with a literal
    /// heading slug is skipped.
    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = EMPTY_SLUG.to_owned();
        }

        let count = self.counts.entry(base.clone()).or_default();
        loop {
            let candidate = match *count {
                0 => base.clone(),
                n => format!("{base}-{n}"),
            };
            *count += 1;
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Plain text of a heading's inline token.
///
/// Text runs, code spans and link text are included; images and raw HTML
/// are not.
#[must_use]
pub fn heading_text(inline: &Token) -> String {
    let Some(children) = &inline.children else {
        return inline.content.trim().to_owned();
    };

    let mut text = String::new();
    for child in children {
        match child.kind {
            "text" | "code_inline" => text.push_str(&child.content),
            "softbreak" | "hardbreak" => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_owned()
}

/// Plain text of the heading opened at `tokens[open]`.
///
/// Headings without inline content yield an empty string.
#[must_use]
pub(crate) fn heading_text_at(tokens: &[Token], open: usize) -> String {
    match tokens.get(open + 1) {
        Some(next) if next.kind == "inline" => heading_text(next),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("kebab-case"), "kebab-case");
        assert_eq!(slugify("snake_case"), "snake-case");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Café Über"), "café-über");
    }

    #[test]
    fn test_slugify_punctuation_only() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugger_disambiguates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("FAQ"), "faq");
        assert_eq!(slugger.slug("FAQ"), "faq-1");
        assert_eq!(slugger.slug("FAQ"), "faq-2");
    }

    #[test]
    fn test_slugger_keys_on_normalized_slug() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("A!"), "a");
        assert_eq!(slugger.slug("A?"), "a-1");
    }

    #[test]
    fn test_slugger_skips_literal_collision() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("A"), "a");
        assert_eq!(slugger.slug("A 1"), "a-1");
        assert_eq!(slugger.slug("A"), "a-2");
    }

    #[test]
    fn test_slugger_empty_text() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("???"), "section");
        assert_eq!(slugger.slug(""), "section-1");
    }

    #[test]
    fn test_fresh_slugger_per_document() {
        let mut first = Slugger::new();
        first.slug("Intro");
        let mut second = Slugger::new();
        assert_eq!(second.slug("Intro"), "intro");
    }

    #[test]
    fn test_heading_text_with_inline_code_and_emphasis() {
        let tokens = tokenize("## Install `npm` *now*");
        assert_eq!(heading_text_at(&tokens, 0), "Install npm now");
    }

    #[test]
    fn test_heading_text_excludes_image() {
        let tokens = tokenize("# Logo ![icon](i.png)");
        assert_eq!(heading_text_at(&tokens, 0), "Logo");
    }

    #[test]
    fn test_heading_text_empty_heading() {
        let tokens = tokenize("#");
        assert_eq!(heading_text_at(&tokens, 0), "");
    }
}
