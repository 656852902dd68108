//! Syntax highlighting for rendered HTML.
//!
//! Post-processes HTML produced by the Quill renderer: every
//! `<pre><code class="language-X">` block whose language has a grammar is
//! re-rendered with `<span class="hl-...">` token markup. The crate only
//! relies on that HTML shape, not on the renderer itself.
//!
//! Failures are isolated per block. A block with an unknown language, or
//! whose grammar fails (error or panic), is left exactly as it was.
//!
//! # Example
//!
//! ```
//! use quill_highlight::highlight;
//!
//! let html = r#"<pre><code class="language-rust">let x = 1;</code></pre>"#;
//! let out = highlight(html);
//! assert!(out.starts_with(r#"<pre><code class="language-rust highlighted">"#));
//! assert!(out.contains(r#"<span class="hl-"#));
//! ```

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Grammars bundled with syntect, loaded on first use.
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// A language-tagged code block as emitted by the renderer.
static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-([^"\s]+)">(.*?)</code></pre>"#)
        .expect("valid regex")
});

/// CSS class prefix of token spans.
pub const CLASS_PREFIX: &str = "hl-";

/// Class added to blocks that were highlighted.
const HIGHLIGHTED_CLASS: &str = "highlighted";

/// Highlighting failure for a single code block.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("no grammar for language `{0}`")]
    UnsupportedLanguage(String),

    #[error("grammar failed: {0}")]
    Grammar(#[from] syntect::Error),

    #[error("grammar panicked while highlighting `{0}`")]
    Panicked(String),
}

/// Syntax highlighter for rendered HTML.
#[derive(Clone, Debug, Default)]
pub struct Highlighter {
    /// Languages (lowercase) left as plain escaped text.
    skipped: HashSet<String>,
}

impl Highlighter {
    /// Create a highlighter for every bundled language.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave blocks in these languages unhighlighted.
    #[must_use]
    pub fn with_skipped_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skipped
            .extend(languages.into_iter().map(|l| l.as_ref().to_lowercase()));
        self
    }

    /// Whether blocks in `language` get highlighted.
    pub fn supports(&self, language: &str) -> bool {
        !self.skipped.contains(&language.to_lowercase()) && find_syntax(language).is_some()
    }

    /// Highlight every supported code block in `html`.
    ///
    /// Other content, and blocks that are unsupported or fail, pass through
    /// unchanged. Already highlighted blocks are not touched again.
    pub fn highlight(&self, html: &str) -> String {
        CODE_BLOCK
            .replace_all(html, |caps: &Captures<'_>| self.highlight_block(caps))
            .into_owned()
    }

    /// Highlight raw (unescaped) code, returning span markup.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError`] if the language is unknown or skipped, or
    /// the grammar fails on this input.
    pub fn highlight_code(&self, language: &str, code: &str) -> Result<String, HighlightError> {
        if !self.supports(language) {
            return Err(HighlightError::UnsupportedLanguage(language.to_owned()));
        }
        let syntax = find_syntax(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.to_owned()))?;

        catch_unwind(AssertUnwindSafe(|| highlight_lines(syntax, code)))
            .map_err(|_| HighlightError::Panicked(language.to_owned()))?
    }

    fn highlight_block(&self, caps: &Captures<'_>) -> String {
        let original = &caps[0];
        let class_language = &caps[1];
        let language = unescape_html(class_language);

        if !self.supports(&language) {
            tracing::debug!(language = %language, "No highlighting for code block");
            return original.to_owned();
        }

        match self.highlight_code(&language, &unescape_html(&caps[2])) {
            Ok(markup) => format!(
                r#"<pre><code class="language-{class_language} {HIGHLIGHTED_CLASS}">{markup}</code></pre>"#
            ),
            Err(error) => {
                tracing::warn!(language = %language, %error, "Highlighting failed");
                original.to_owned()
            }
        }
    }
}

/// Highlight every supported code block in `html` with default settings.
pub fn highlight(html: &str) -> String {
    Highlighter::new().highlight(html)
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let set: &'static SyntaxSet = &SYNTAX_SET;
    set.find_syntax_by_token(language)
}

fn highlight_lines(syntax: &SyntaxReference, code: &str) -> Result<String, HighlightError> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAX_SET,
        ClassStyle::SpacedPrefixed {
            prefix: CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// Reverse the entity escaping applied by the renderer.
fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
