//! Token-to-node mapping table.
//!
//! A declarative dictionary from token kind to the document node or mark it
//! produces. The parser walks tokens and looks up each kind here; it has no
//! per-kind branches of its own, so supporting a new token kind means adding
//! an entry:
//!
//! ```
//! use quill_markdown::{MappingTable, TokenSpec};
//!
//! let table = MappingTable::standard()
//!     .clone()
//!     .with("html_block", TokenSpec::block("code_block").textblock().no_close_token());
//! assert!(table.validate().is_ok());
//! ```
//!
//! Entries are keyed by base kind: `heading` covers both `heading_open` and
//! `heading_close`.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::document::PARAGRAPH;
use crate::error::MappingError;
use crate::serializer::MarkdownSerializer;
use crate::token::{Attrs, Nesting, Token};
use crate::util::{heading_level_from_tag, parse_fence_info};

/// Derives node or mark attributes from the token at `index`.
///
/// Receives the whole token slice so that attributes depending on later
/// tokens (list tightness) can be computed.
pub type AttrExtractor = fn(&[Token], usize) -> Attrs;

/// What a token kind turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenTarget {
    /// Block node with children (`heading`, `list_item`).
    Block(&'static str),
    /// Leaf node without children (`horizontal_rule`, `image`).
    Node(&'static str),
    /// Mark applied to the text between open and close.
    Mark(&'static str),
    /// Text run taken from the token content.
    Text,
    /// Fixed text, regardless of the token content.
    Literal(&'static str),
    /// Token whose children are parsed in place (`inline`).
    Children,
    /// Structural token with no meaning of its own.
    Ignore,
}

/// Mapping entry for one token kind.
#[derive(Clone, Copy, Debug)]
pub struct TokenSpec {
    pub target: TokenTarget,
    pub attrs: Option<AttrExtractor>,
    /// The token is self-contained and its content becomes the node's text.
    pub no_close_token: bool,
    /// Block nodes of this type hold inline content.
    pub textblock: bool,
}

impl TokenSpec {
    const fn new(target: TokenTarget) -> Self {
        Self {
            target,
            attrs: None,
            no_close_token: false,
            textblock: false,
        }
    }

    #[must_use]
    pub const fn block(node_type: &'static str) -> Self {
        Self::new(TokenTarget::Block(node_type))
    }

    #[must_use]
    pub const fn node(node_type: &'static str) -> Self {
        Self::new(TokenTarget::Node(node_type))
    }

    #[must_use]
    pub const fn mark(mark_type: &'static str) -> Self {
        Self::new(TokenTarget::Mark(mark_type))
    }

    #[must_use]
    pub const fn text() -> Self {
        Self::new(TokenTarget::Text)
    }

    #[must_use]
    pub const fn literal(text: &'static str) -> Self {
        Self::new(TokenTarget::Literal(text))
    }

    #[must_use]
    pub const fn children() -> Self {
        Self::new(TokenTarget::Children)
    }

    #[must_use]
    pub const fn ignore() -> Self {
        Self::new(TokenTarget::Ignore)
    }

    #[must_use]
    pub const fn with_attrs(mut self, extractor: AttrExtractor) -> Self {
        self.attrs = Some(extractor);
        self
    }

    #[must_use]
    pub const fn no_close_token(mut self) -> Self {
        self.no_close_token = true;
        self
    }

    #[must_use]
    pub const fn textblock(mut self) -> Self {
        self.textblock = true;
        self
    }

    /// Attributes for the token at `index`, or none without an extractor.
    pub fn extract_attrs(&self, tokens: &[Token], index: usize) -> Attrs {
        self.attrs
            .map(|extract| extract(tokens, index))
            .unwrap_or_default()
    }
}

static STANDARD: LazyLock<MappingTable> = LazyLock::new(MappingTable::build_standard);

/// Dictionary of token kind → [`TokenSpec`].
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    specs: HashMap<&'static str, TokenSpec>,
    textblocks: HashSet<&'static str>,
}

impl MappingTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table for the standard token set, built once per process.
    pub fn standard() -> &'static MappingTable {
        &STANDARD
    }

    /// Add or replace the entry for a base token kind.
    pub fn insert(&mut self, kind: &'static str, spec: TokenSpec) -> Option<TokenSpec> {
        let previous = self.specs.insert(kind, spec);
        self.textblocks = self
            .specs
            .values()
            .filter(|spec| spec.textblock)
            .filter_map(|spec| match spec.target {
                TokenTarget::Block(node_type) => Some(node_type),
                _ => None,
            })
            .collect();
        previous
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, kind: &'static str, spec: TokenSpec) -> Self {
        self.insert(kind, spec);
        self
    }

    /// Entry for a base token kind.
    pub fn get(&self, kind: &str) -> Option<&TokenSpec> {
        self.specs.get(kind)
    }

    /// Entry for a token, keyed by its base kind.
    pub fn lookup(&self, token: &Token) -> Option<&TokenSpec> {
        self.specs.get(token.base_kind())
    }

    /// Whether nodes of this type hold inline content.
    pub fn is_textblock(&self, node_type: &str) -> bool {
        self.textblocks.contains(node_type)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TokenSpec)> {
        self.specs.iter().map(|(kind, spec)| (*kind, spec))
    }

    /// Validate against the standard serializer.
    ///
    /// See [`validate_with`](Self::validate_with).
    pub fn validate(&self) -> Result<(), MappingError> {
        self.validate_with(MarkdownSerializer::standard())
    }

    /// Check that the parser can build its mandatory structure with this table
    /// and that everything it produces can be serialized back.
    pub fn validate_with(&self, serializer: &MarkdownSerializer) -> Result<(), MappingError> {
        if !self.is_textblock(PARAGRAPH) {
            return Err(MappingError::MissingNodeType(PARAGRAPH));
        }

        // Sorted for a stable first error.
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_key(|(kind, _)| *kind);

        for (kind, spec) in entries {
            match spec.target {
                TokenTarget::Block(node_type) | TokenTarget::Node(node_type) => {
                    if !serializer.has_node_rule(node_type) {
                        return Err(MappingError::UnserializableNode { kind, node_type });
                    }
                }
                TokenTarget::Mark(mark_type) => {
                    if !serializer.has_mark_rule(mark_type) {
                        return Err(MappingError::UnserializableMark { kind, mark_type });
                    }
                }
                TokenTarget::Text
                | TokenTarget::Literal(_)
                | TokenTarget::Children
                | TokenTarget::Ignore => {}
            }
        }
        Ok(())
    }

    fn build_standard() -> Self {
        Self::new()
            .with("inline", TokenSpec::children())
            .with("text", TokenSpec::text())
            .with("softbreak", TokenSpec::literal(" "))
            .with("paragraph", TokenSpec::block("paragraph").textblock())
            .with(
                "heading",
                TokenSpec::block("heading")
                    .textblock()
                    .with_attrs(heading_attrs),
            )
            .with("blockquote", TokenSpec::block("blockquote"))
            .with(
                "bullet_list",
                TokenSpec::block("bullet_list").with_attrs(bullet_list_attrs),
            )
            .with(
                "ordered_list",
                TokenSpec::block("ordered_list").with_attrs(ordered_list_attrs),
            )
            .with("list_item", TokenSpec::block("list_item"))
            .with("fence", code_block_spec())
            .with("code_block", code_block_spec())
            .with("hr", TokenSpec::node("horizontal_rule"))
            .with("hardbreak", TokenSpec::node("hard_break"))
            .with("image", TokenSpec::node("image").with_attrs(image_attrs))
            .with("table", TokenSpec::block("table"))
            .with("thead", TokenSpec::ignore())
            .with("tbody", TokenSpec::ignore())
            .with("tr", TokenSpec::block("table_row"))
            .with(
                "th",
                TokenSpec::block("table_header")
                    .textblock()
                    .with_attrs(cell_attrs),
            )
            .with(
                "td",
                TokenSpec::block("table_cell")
                    .textblock()
                    .with_attrs(cell_attrs),
            )
            .with("em", TokenSpec::mark("em"))
            .with("strong", TokenSpec::mark("strong"))
            .with("s", TokenSpec::mark("strike"))
            .with("code_inline", TokenSpec::mark("code").no_close_token())
            .with("link", TokenSpec::mark("link").with_attrs(link_attrs))
    }
}

const fn code_block_spec() -> TokenSpec {
    TokenSpec::block("code_block")
        .textblock()
        .no_close_token()
        .with_attrs(code_block_attrs)
}

fn heading_attrs(tokens: &[Token], index: usize) -> Attrs {
    let level = heading_level_from_tag(tokens[index].tag);
    Attrs::from([("level".to_owned(), level.to_string())])
}

/// A list is tight when any of its items holds a hidden paragraph.
///
/// Items starting with a heading, fence or nested list have no paragraph of
/// their own, so every direct item is checked, not just the first.
fn list_is_tight(tokens: &[Token], index: usize) -> bool {
    let level = tokens[index].level;
    tokens[index + 1..]
        .iter()
        .take_while(|t| !(t.nesting == Nesting::Close && t.level == level))
        .any(|t| t.kind == "paragraph_open" && t.level == level + 2 && t.hidden)
}

fn bullet_list_attrs(tokens: &[Token], index: usize) -> Attrs {
    Attrs::from([(
        "tight".to_owned(),
        list_is_tight(tokens, index).to_string(),
    )])
}

fn ordered_list_attrs(tokens: &[Token], index: usize) -> Attrs {
    let order = tokens[index].attr("start").unwrap_or("1");
    Attrs::from([
        ("order".to_owned(), order.to_owned()),
        ("tight".to_owned(), list_is_tight(tokens, index).to_string()),
    ])
}

fn code_block_attrs(tokens: &[Token], index: usize) -> Attrs {
    let (language, mut attrs) = parse_fence_info(&tokens[index].info);
    if !language.is_empty() {
        attrs.insert("language".to_owned(), language);
    }
    attrs
}

fn image_attrs(tokens: &[Token], index: usize) -> Attrs {
    let token = &tokens[index];
    let mut attrs = Attrs::from([
        ("src".to_owned(), token.attr("src").unwrap_or_default().to_owned()),
        ("alt".to_owned(), token.content.clone()),
    ]);
    if let Some(title) = token.attr("title") {
        attrs.insert("title".to_owned(), title.to_owned());
    }
    attrs
}

fn link_attrs(tokens: &[Token], index: usize) -> Attrs {
    let token = &tokens[index];
    let mut attrs = Attrs::from([(
        "href".to_owned(),
        token.attr("href").unwrap_or_default().to_owned(),
    )]);
    if let Some(title) = token.attr("title") {
        attrs.insert("title".to_owned(), title.to_owned());
    }
    attrs
}

fn cell_attrs(tokens: &[Token], index: usize) -> Attrs {
    tokens[index]
        .attr("style")
        .and_then(|style| style.strip_prefix("text-align:"))
        .map(|align| Attrs::from([("align".to_owned(), align.to_owned())]))
        .unwrap_or_default()
}
