//! Markdown document-transformation pipeline.
//!
//! This crate turns markdown text into three outputs that must agree with
//! each other:
//!
//! - a structured [`DocumentNode`] tree, and back to markdown again,
//! - HTML with a stable `id` on every heading,
//! - a table of contents whose ids match those heading ids.
//!
//! # Architecture
//!
//! All paths start from one [`Tokenizer`] (built on `pulldown-cmark`):
//!
//! - The [`parse`] step turns tokens into a tree by looking each token kind up
//!   in a declarative [`MappingTable`]. Unknown kinds are skipped.
//! - The [`MarkdownSerializer`] holds the inverse rules (node type → markdown,
//!   mark type → delimiters).
//! - The [`HtmlRenderer`] renders tokens directly, bypassing the tree.
//! - [`extract_toc`] walks heading tokens with the same [`Slugger`] the
//!   renderer uses, so the n-th TOC id is the n-th heading id.
//!
//! Syntax highlighting is a separate post-processing step over the HTML
//! string (see the `quill-highlight` crate).
//!
//! # Example
//!
//! ```
//! use quill_markdown::{extract_toc, parse_to_document, render_to_html, serialize_to_markdown};
//!
//! let markdown = "# Hello\n\n- x\n- y";
//!
//! let html = render_to_html(markdown);
//! assert!(html.starts_with(r#"<h1 id="hello">Hello</h1>"#));
//!
//! let toc = extract_toc(markdown);
//! assert_eq!(toc[0].id, "hello");
//!
//! let doc = parse_to_document(markdown);
//! assert_eq!(serialize_to_markdown(&doc), "# Hello\n\n- x\n- y\n");
//! ```

mod document;
mod error;
mod html;
mod mapping;
mod parser;
mod pipeline;
mod serializer;
mod slug;
mod toc;
mod token;
mod tokenizer;
mod util;

pub use document::{DOCUMENT, DocumentNode, Mark, PARAGRAPH, TEXT};
pub use error::MappingError;
pub use html::{HtmlRenderer, RenderResult, render_html};
pub use mapping::{AttrExtractor, MappingTable, TokenSpec, TokenTarget};
pub use parser::parse;
pub use pipeline::MarkdownPipeline;
pub use serializer::{
    BlockContext, BlockRule, InlineContext, InlineRule, MarkRule, MarkdownSerializer, NodeRule,
    serialize,
};
pub use slug::{Slugger, heading_text, slugify};
pub use toc::{TocEntry, extract_toc, toc_from_tokens};
pub use token::{Attrs, Nesting, Token};
pub use tokenizer::{Tokenizer, tokenize};
pub use util::escape_html;

/// Parse markdown into a document tree with the standard mapping table.
pub fn parse_to_document(markdown: &str) -> DocumentNode {
    MarkdownPipeline::new().parse_to_document(markdown)
}

/// Write a document tree back to markdown with the standard rules.
pub fn serialize_to_markdown(doc: &DocumentNode) -> String {
    serialize(doc)
}

/// Render markdown to HTML with heading anchors.
pub fn render_to_html(markdown: &str) -> String {
    render_html(markdown)
}
