//! Token model produced by the tokenizer.

use std::collections::BTreeMap;

/// String attributes attached to tokens and document nodes.
///
/// Ordered so that equal inputs always produce byte-identical output.
pub type Attrs = BTreeMap<String, String>;

/// Whether a token opens a block, closes one, or stands alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nesting {
    Open,
    Close,
    SelfClosing,
}

/// A single lexical unit of a markdown document.
///
/// Block structure is expressed as `*_open` / `*_close` pairs. Inline content
/// of a block is carried by one `inline` token whose `children` hold the
/// inline tokens (`text`, `em_open`, `code_inline`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Token kind, e.g. `heading_open`, `fence`, `text`.
    pub kind: &'static str,
    /// HTML tag the token corresponds to, e.g. `h2` or `em`.
    pub tag: Option<&'static str>,
    pub nesting: Nesting,
    /// Literal content: text runs, code, image alt text.
    pub content: String,
    /// Fence info string (`rust ignore`); empty for other tokens.
    pub info: String,
    /// Nesting depth within the block (or inline) structure.
    pub level: usize,
    pub attrs: Attrs,
    /// Inline children of `inline` and `image` tokens.
    pub children: Option<Vec<Token>>,
    /// Set on paragraphs synthesised for tight list items.
    pub hidden: bool,
}

impl Token {
    /// Create a token with empty content and attributes.
    #[must_use]
    pub fn new(kind: &'static str, tag: Option<&'static str>, nesting: Nesting) -> Self {
        Self {
            kind,
            tag,
            nesting,
            content: String::new(),
            info: String::new(),
            level: 0,
            attrs: Attrs::new(),
            children: None,
            hidden: false,
        }
    }

    /// Create a self-closing `text` token.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new("text", None, Nesting::SelfClosing).with_content(content)
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Kind without the `_open` / `_close` suffix.
    ///
    /// `heading_open` and `heading_close` both map to `heading`; self-closing
    /// kinds are returned unchanged.
    pub fn base_kind(&self) -> &'static str {
        let kind = self.kind;
        match self.nesting {
            Nesting::Open => kind.strip_suffix("_open").unwrap_or(kind),
            Nesting::Close => kind.strip_suffix("_close").unwrap_or(kind),
            Nesting::SelfClosing => kind,
        }
    }
}
