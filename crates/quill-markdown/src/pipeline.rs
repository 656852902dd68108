//! Pipeline facade.

use crate::document::DocumentNode;
use crate::error::MappingError;
use crate::html::{HtmlRenderer, RenderResult};
use crate::mapping::MappingTable;
use crate::parser::parse;
use crate::serializer::MarkdownSerializer;
use crate::toc::{TocEntry, toc_from_tokens};
use crate::token::Token;
use crate::tokenizer::Tokenizer;

/// Markdown pipeline: one tokenizer feeding the tree, HTML and TOC paths.
///
/// Every operation is a pure function of its input; a pipeline can be shared
/// between threads and reused for any number of documents.
///
/// # Example
///
/// ```
/// use quill_markdown::MarkdownPipeline;
///
/// let pipeline = MarkdownPipeline::new();
/// let doc = pipeline.parse_to_document("- x\n- y");
/// assert_eq!(pipeline.serialize_to_markdown(&doc), "- x\n- y\n");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MarkdownPipeline<'a> {
    tokenizer: Tokenizer,
    mapping: &'a MappingTable,
    serializer: &'a MarkdownSerializer,
}

impl MarkdownPipeline<'static> {
    /// Create a pipeline with the standard mapping table and GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            mapping: MappingTable::standard(),
            serializer: MarkdownSerializer::standard(),
        }
    }
}

impl Default for MarkdownPipeline<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MarkdownPipeline<'a> {
    /// Create a pipeline with a custom mapping table and serializer.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if the table targets node or mark types the
    /// serializer cannot write, or lacks a paragraph entry.
    pub fn with_mapping(
        mapping: &'a MappingTable,
        serializer: &'a MarkdownSerializer,
    ) -> Result<Self, MappingError> {
        mapping.validate_with(serializer)?;
        Ok(Self {
            tokenizer: Tokenizer::new(),
            mapping,
            serializer,
        })
    }

    /// Enable or disable GitHub Flavored Markdown (tables, strikethrough).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.tokenizer = self.tokenizer.with_gfm(enabled);
        self
    }

    pub fn tokenize(&self, markdown: &str) -> Vec<Token> {
        self.tokenizer.tokenize(markdown)
    }

    /// Parse markdown into a document tree.
    pub fn parse_to_document(&self, markdown: &str) -> DocumentNode {
        parse(&self.tokenize(markdown), self.mapping)
    }

    /// Write a document tree back to markdown.
    pub fn serialize_to_markdown(&self, doc: &DocumentNode) -> String {
        self.serializer.serialize(doc)
    }

    /// Render markdown to HTML with heading anchors.
    pub fn render_to_html(&self, markdown: &str) -> String {
        self.render(markdown).html
    }

    /// Render markdown to HTML and collect its table of contents in one pass.
    pub fn render(&self, markdown: &str) -> RenderResult {
        HtmlRenderer::new()
            .with_gfm(self.tokenizer.gfm())
            .render_tokens(&self.tokenize(markdown))
    }

    /// Table of contents with ids matching [`render_to_html`](Self::render_to_html).
    pub fn extract_toc(&self, markdown: &str) -> Vec<TocEntry> {
        toc_from_tokens(&self.tokenize(markdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::TokenSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operations_share_tokenizer_options() {
        let pipeline = MarkdownPipeline::new().with_gfm(false);
        let markdown = "| A |\n|---|\n| 1 |";
        assert!(!pipeline.render_to_html(markdown).contains("<table>"));
        let doc = pipeline.parse_to_document(markdown);
        assert_eq!(doc.children[0].node_type, "paragraph");
    }

    #[test]
    fn test_render_matches_toc() {
        let pipeline = MarkdownPipeline::new();
        let markdown = "# A\n\n## B\n\n# A";
        assert_eq!(pipeline.render(markdown).toc, pipeline.extract_toc(markdown));
    }

    #[test]
    fn test_with_mapping_validates() {
        let table = MappingTable::standard()
            .clone()
            .with("html_block", TokenSpec::block("raw_html"));
        let err = MarkdownPipeline::with_mapping(&table, MarkdownSerializer::standard())
            .unwrap_err();
        assert!(matches!(err, MappingError::UnserializableNode { .. }));
    }

    #[test]
    fn test_with_custom_mapping() {
        let table = MappingTable::standard().clone().with(
            "html_block",
            TokenSpec::block("code_block").textblock().no_close_token(),
        );
        let pipeline =
            MarkdownPipeline::with_mapping(&table, MarkdownSerializer::standard()).unwrap();
        let doc = pipeline.parse_to_document("<div>x</div>");
        assert_eq!(doc.children[0].node_type, "code_block");
        assert_eq!(
            pipeline.serialize_to_markdown(&doc),
            "```\n<div>x</div>\n```\n"
        );
    }
}
