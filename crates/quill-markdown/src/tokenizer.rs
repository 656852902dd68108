//! Markdown tokenizer.
//!
//! Lexing is delegated to `pulldown-cmark`; this module regroups its event
//! stream into the [`Token`] model: balanced `*_open` / `*_close` block pairs,
//! self-closing leaves (`fence`, `hr`, ...) and one `inline` token per text
//! block carrying the inline tokens as children.
//!
//! The tokenizer never fails. Anything the lexer cannot make sense of comes
//! back as paragraphs of plain text.

use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::token::{Nesting, Token};
use crate::util::heading_tag;

/// Block kinds whose inline content is emitted directly.
///
/// Inline content arriving inside any other block (a tight list item) is
/// wrapped in a hidden paragraph.
const TEXTBLOCK_KINDS: [&str; 4] = ["paragraph_close", "heading_close", "th_close", "td_close"];

/// Markdown tokenizer.
///
/// GitHub Flavored Markdown tables and strikethrough are enabled by default.
#[derive(Clone, Copy, Debug)]
pub struct Tokenizer {
    gfm: bool,
}

impl Tokenizer {
    /// Create a tokenizer with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown (tables, strikethrough).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Whether GFM extensions are enabled.
    pub fn gfm(&self) -> bool {
        self.gfm
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
        } else {
            Options::empty()
        }
    }

    /// Tokenize markdown text.
    pub fn tokenize(&self, markdown: &str) -> Vec<Token> {
        let mut builder = TokenBuilder::default();
        for event in Parser::new_ext(markdown, self.parser_options()) {
            builder.event(event);
        }
        builder.finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize markdown text with default options.
pub fn tokenize(markdown: &str) -> Vec<Token> {
    Tokenizer::new().tokenize(markdown)
}

/// An open block waiting for its close token.
struct OpenBlock {
    close_kind: &'static str,
    tag: Option<&'static str>,
    hidden: bool,
}

/// Code block content being collected.
struct CodeCapture {
    fenced: bool,
    info: String,
    content: String,
}

/// Image alt text being collected.
struct ImageCapture {
    src: String,
    title: String,
    alt: String,
    children: Vec<Token>,
}

impl ImageCapture {
    fn into_token(self) -> Token {
        let mut token = Token::new("image", Some("img"), Nesting::SelfClosing)
            .with_attr("src", self.src)
            .with_content(self.alt);
        if !self.title.is_empty() {
            token = token.with_attr("title", self.title);
        }
        token.children = Some(self.children);
        token
    }
}

/// State for tracking table structure.
#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    cell_index: usize,
    in_head: bool,
    body_open: bool,
}

impl TableState {
    fn current_alignment(&self) -> Option<&'static str> {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => Some("left"),
            Some(Alignment::Center) => Some("center"),
            Some(Alignment::Right) => Some("right"),
            Some(Alignment::None) | None => None,
        }
    }
}

/// Per-call token stream builder.
#[derive(Default)]
struct TokenBuilder {
    tokens: Vec<Token>,
    blocks: Vec<OpenBlock>,
    /// Inline tokens of the current text block.
    inline: Vec<Token>,
    inline_level: usize,
    code: Option<CodeCapture>,
    html: Option<String>,
    images: Vec<ImageCapture>,
    table: TableState,
}

impl TokenBuilder {
    fn event(&mut self, event: Event<'_>) {
        if self.code.is_some() {
            self.code_event(event);
            return;
        }
        if self.html.is_some() {
            self.html_event(event);
            return;
        }
        if !self.images.is_empty() {
            self.image_event(event);
            return;
        }

        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.push_inline(Token::text(text.into_string()));
            }
            Event::Code(code) => self.push_inline(
                Token::new("code_inline", Some("code"), Nesting::SelfClosing)
                    .with_content(code.into_string()),
            ),
            Event::Html(html) => self.leaf(
                Token::new("html_block", None, Nesting::SelfClosing)
                    .with_content(html.into_string()),
            ),
            Event::InlineHtml(html) => self.push_inline(
                Token::new("html_inline", None, Nesting::SelfClosing)
                    .with_content(html.into_string()),
            ),
            Event::SoftBreak => {
                self.push_inline(Token::new("softbreak", None, Nesting::SelfClosing));
            }
            Event::HardBreak => {
                self.push_inline(Token::new("hardbreak", Some("br"), Nesting::SelfClosing));
            }
            Event::Rule => self.leaf(Token::new("hr", Some("hr"), Nesting::SelfClosing)),
            Event::FootnoteReference(name) => {
                self.push_inline(Token::text(format!("[^{name}]")));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_inline(Token::text(marker));
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(Token::new("paragraph_open", Some("p"), Nesting::Open)),
            Tag::Heading { level, .. } => {
                self.open(Token::new("heading_open", Some(heading_tag(level)), Nesting::Open));
            }
            Tag::BlockQuote(_) => {
                self.open(Token::new("blockquote_open", Some("blockquote"), Nesting::Open));
            }
            Tag::CodeBlock(kind) => {
                self.flush_inline();
                let (fenced, info) = match kind {
                    CodeBlockKind::Fenced(info) => (true, info.trim().to_owned()),
                    CodeBlockKind::Indented => (false, String::new()),
                };
                self.code = Some(CodeCapture {
                    fenced,
                    info,
                    content: String::new(),
                });
            }
            Tag::HtmlBlock => {
                self.flush_inline();
                self.html = Some(String::new());
            }
            Tag::List(Some(start)) => self.open(
                Token::new("ordered_list_open", Some("ol"), Nesting::Open)
                    .with_attr("start", start.to_string()),
            ),
            Tag::List(None) => {
                self.open(Token::new("bullet_list_open", Some("ul"), Nesting::Open));
            }
            Tag::Item => self.open(Token::new("list_item_open", Some("li"), Nesting::Open)),
            Tag::Table(alignments) => {
                self.table = TableState {
                    alignments,
                    ..TableState::default()
                };
                self.open(Token::new("table_open", Some("table"), Nesting::Open));
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell_index = 0;
                self.open(Token::new("thead_open", Some("thead"), Nesting::Open));
                self.open(Token::new("tr_open", Some("tr"), Nesting::Open));
            }
            Tag::TableRow => {
                if !self.table.body_open {
                    self.table.body_open = true;
                    self.open(Token::new("tbody_open", Some("tbody"), Nesting::Open));
                }
                self.table.cell_index = 0;
                self.open(Token::new("tr_open", Some("tr"), Nesting::Open));
            }
            Tag::TableCell => {
                let mut token = if self.table.in_head {
                    Token::new("th_open", Some("th"), Nesting::Open)
                } else {
                    Token::new("td_open", Some("td"), Nesting::Open)
                };
                if let Some(align) = self.table.current_alignment() {
                    token = token.with_attr("style", format!("text-align:{align}"));
                }
                self.open(token);
            }
            Tag::Emphasis => self.push_inline(Token::new("em_open", Some("em"), Nesting::Open)),
            Tag::Strong => {
                self.push_inline(Token::new("strong_open", Some("strong"), Nesting::Open));
            }
            Tag::Strikethrough => {
                self.push_inline(Token::new("s_open", Some("s"), Nesting::Open));
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut token = Token::new("link_open", Some("a"), Nesting::Open)
                    .with_attr("href", dest_url.into_string());
                if !title.is_empty() {
                    token = token.with_attr("title", title.into_string());
                }
                self.push_inline(token);
            }
            Tag::Image {
                dest_url, title, ..
            } => self.start_image(dest_url, title),
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_)
            | Tag::Superscript
            | Tag::Subscript => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::List(_)
            | TagEnd::Item => self.close(),
            TagEnd::Table => {
                if self.table.body_open {
                    self.close();
                }
                self.close();
                self.table = TableState::default();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.table.in_head = false;
            }
            TagEnd::TableRow => self.close(),
            TagEnd::TableCell => {
                self.close();
                self.table.cell_index += 1;
            }
            TagEnd::Emphasis => self.push_inline(Token::new("em_close", Some("em"), Nesting::Close)),
            TagEnd::Strong => {
                self.push_inline(Token::new("strong_close", Some("strong"), Nesting::Close));
            }
            TagEnd::Strikethrough => {
                self.push_inline(Token::new("s_close", Some("s"), Nesting::Close));
            }
            TagEnd::Link => self.push_inline(Token::new("link_close", Some("a"), Nesting::Close)),
            // Code, HTML and image ends are consumed by their capture handlers.
            TagEnd::CodeBlock
            | TagEnd::HtmlBlock
            | TagEnd::Image
            | TagEnd::FootnoteDefinition
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::MetadataBlock(_)
            | TagEnd::Superscript
            | TagEnd::Subscript => {}
        }
    }

    fn code_event(&mut self, event: Event<'_>) {
        match event {
            Event::Text(text) => {
                if let Some(code) = &mut self.code {
                    code.content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => self.end_code_block(),
            _ => {}
        }
    }

    fn end_code_block(&mut self) {
        let Some(code) = self.code.take() else {
            return;
        };
        let mut token = if code.fenced {
            Token::new("fence", Some("code"), Nesting::SelfClosing)
        } else {
            Token::new("code_block", Some("code"), Nesting::SelfClosing)
        };
        token.info = code.info;
        token.content = code.content;
        self.leaf(token);
    }

    fn html_event(&mut self, event: Event<'_>) {
        match event {
            Event::Html(text) | Event::Text(text) => {
                if let Some(html) = &mut self.html {
                    html.push_str(&text);
                }
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(html) = self.html.take() {
                    self.leaf(Token::new("html_block", None, Nesting::SelfClosing).with_content(html));
                }
            }
            _ => {}
        }
    }

    fn start_image(&mut self, src: CowStr<'_>, title: CowStr<'_>) {
        self.images.push(ImageCapture {
            src: src.into_string(),
            title: title.into_string(),
            alt: String::new(),
            children: Vec::new(),
        });
    }

    /// Collect alt text while inside an image. Nested formatting is flattened.
    fn image_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => self.start_image(dest_url, title),
            Event::End(TagEnd::Image) => {
                let Some(image) = self.images.pop() else {
                    return;
                };
                let token = image.into_token();
                match self.images.last_mut() {
                    Some(parent) => parent.alt.push_str(&token.content),
                    None => self.push_inline(token),
                }
            }
            Event::Text(text)
            | Event::Code(text)
            | Event::InlineMath(text)
            | Event::DisplayMath(text) => {
                if let Some(image) = self.images.last_mut() {
                    image.alt.push_str(&text);
                    image.children.push(Token::text(text.into_string()));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(image) = self.images.last_mut() {
                    image.alt.push(' ');
                    image.children.push(Token::text(" "));
                }
            }
            _ => {}
        }
    }

    fn open(&mut self, mut token: Token) {
        self.flush_inline();
        let close_kind = close_kind_for(token.kind);
        token.level = self.blocks.len();
        self.blocks.push(OpenBlock {
            close_kind,
            tag: token.tag,
            hidden: token.hidden,
        });
        self.tokens.push(token);
    }

    fn close(&mut self) {
        self.flush_inline();
        self.pop_block();
    }

    fn pop_block(&mut self) {
        if let Some(block) = self.blocks.pop() {
            let mut token = Token::new(block.close_kind, block.tag, Nesting::Close);
            token.level = self.blocks.len();
            token.hidden = block.hidden;
            self.tokens.push(token);
        }
    }

    fn leaf(&mut self, mut token: Token) {
        self.flush_inline();
        token.level = self.blocks.len();
        self.tokens.push(token);
    }

    fn in_textblock(&self) -> bool {
        self.blocks
            .last()
            .is_some_and(|block| TEXTBLOCK_KINDS.contains(&block.close_kind))
    }

    fn hidden_paragraph_open(&self) -> bool {
        self.blocks.last().is_some_and(|block| block.hidden)
    }

    fn push_inline(&mut self, mut token: Token) {
        if !self.in_textblock() {
            let mut paragraph = Token::new("paragraph_open", Some("p"), Nesting::Open);
            paragraph.hidden = true;
            self.open(paragraph);
        }

        match token.nesting {
            Nesting::Open => {
                token.level = self.inline_level;
                self.inline_level += 1;
            }
            Nesting::Close => {
                self.inline_level = self.inline_level.saturating_sub(1);
                token.level = self.inline_level;
            }
            Nesting::SelfClosing => token.level = self.inline_level,
        }
        self.inline.push(token);
    }

    /// Wrap pending inline tokens into an `inline` token and close any hidden paragraph.
    fn flush_inline(&mut self) {
        if !self.inline.is_empty() {
            let children = std::mem::take(&mut self.inline);
            let content: String = children
                .iter()
                .filter(|t| matches!(t.kind, "text" | "code_inline"))
                .map(|t| t.content.as_str())
                .collect();
            let mut token = Token::new("inline", None, Nesting::SelfClosing).with_content(content);
            token.level = self.blocks.len();
            token.children = Some(children);
            self.tokens.push(token);
            self.inline_level = 0;
        }

        if self.hidden_paragraph_open() {
            self.pop_block();
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.end_code_block();
        if let Some(html) = self.html.take() {
            self.leaf(Token::new("html_block", None, Nesting::SelfClosing).with_content(html));
        }
        while let Some(image) = self.images.pop() {
            self.push_inline(image.into_token());
        }
        self.flush_inline();
        while !self.blocks.is_empty() {
            self.pop_block();
        }
        self.tokens
    }
}

/// Close kind matching an open kind (`heading_open` → `heading_close`).
fn close_kind_for(open_kind: &'static str) -> &'static str {
    match open_kind {
        "paragraph_open" => "paragraph_close",
        "heading_open" => "heading_close",
        "blockquote_open" => "blockquote_close",
        "ordered_list_open" => "ordered_list_close",
        "bullet_list_open" => "bullet_list_close",
        "list_item_open" => "list_item_close",
        "table_open" => "table_close",
        "thead_open" => "thead_close",
        "tbody_open" => "tbody_close",
        "tr_open" => "tr_close",
        "th_open" => "th_close",
        "td_open" => "td_close",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(tokens: &[Token]) -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn assert_balanced(tokens: &[Token]) {
        let mut stack: Vec<&Token> = Vec::new();
        for token in tokens {
            match token.nesting {
                Nesting::Open => stack.push(token),
                Nesting::Close => {
                    let open = stack.pop().expect("close without open");
                    assert_eq!(open.base_kind(), token.base_kind());
                    assert_eq!(open.level, token.level);
                }
                Nesting::SelfClosing => {}
            }
        }
        assert!(stack.is_empty(), "unclosed tokens: {stack:?}");
    }

    #[test]
    fn test_heading_tokens() {
        let tokens = tokenize("# Hello");
        assert_eq!(kinds(&tokens), vec!["heading_open", "inline", "heading_close"]);
        assert_eq!(tokens[0].tag, Some("h1"));
        assert_eq!(tokens[1].level, 1);
        let children = tokens[1].children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].content, "Hello");
    }

    #[test]
    fn test_heading_levels() {
        let tokens = tokenize("###### Deep");
        assert_eq!(tokens[0].tag, Some("h6"));

        let tokens = tokenize("Setext\n------");
        assert_eq!(tokens[0].tag, Some("h2"));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tight_list_has_hidden_paragraphs() {
        let tokens = tokenize("- x\n- y");
        assert_eq!(
            kinds(&tokens),
            vec![
                "bullet_list_open",
                "list_item_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "list_item_close",
                "list_item_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "list_item_close",
                "bullet_list_close",
            ]
        );
        assert!(tokens[2].hidden);
        assert!(tokens[4].hidden);
        assert_balanced(&tokens);
    }

    #[test]
    fn test_loose_list_paragraphs_not_hidden() {
        let tokens = tokenize("- x\n\n- y");
        let paragraphs: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == "paragraph_open")
            .collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs.iter().all(|t| !t.hidden));
    }

    #[test]
    fn test_nested_list_levels() {
        let tokens = tokenize("- a\n  - b\n    - c\n- d");
        assert_balanced(&tokens);
        let list_opens: Vec<usize> = tokens
            .iter()
            .filter(|t| t.kind == "bullet_list_open")
            .map(|t| t.level)
            .collect();
        assert_eq!(list_opens, vec![0, 2, 4]);
    }

    #[test]
    fn test_ordered_list_start() {
        let tokens = tokenize("3. three\n4. four");
        assert_eq!(tokens[0].kind, "ordered_list_open");
        assert_eq!(tokens[0].attr("start"), Some("3"));
    }

    #[test]
    fn test_fence_captures_info() {
        let tokens = tokenize("```rust title=main.rs\nfn main() {}\n```");
        assert_eq!(kinds(&tokens), vec!["fence"]);
        assert_eq!(tokens[0].info, "rust title=main.rs");
        assert_eq!(tokens[0].content, "fn main() {}\n");
    }

    #[test]
    fn test_indented_code_block() {
        let tokens = tokenize("    let x = 1;\n");
        assert_eq!(kinds(&tokens), vec!["code_block"]);
        assert_eq!(tokens[0].content, "let x = 1;\n");
        assert!(tokens[0].info.is_empty());
    }

    #[test]
    fn test_inline_marks() {
        let tokens = tokenize("*a* **b** `c` ~~d~~");
        let children = tokens[1].children.as_ref().unwrap();
        let inline_kinds: Vec<_> = children.iter().map(|t| t.kind).collect();
        assert_eq!(
            inline_kinds,
            vec![
                "em_open",
                "text",
                "em_close",
                "text",
                "strong_open",
                "text",
                "strong_close",
                "text",
                "code_inline",
                "text",
                "s_open",
                "text",
                "s_close",
            ]
        );
        assert_eq!(children[1].level, 1);
    }

    #[test]
    fn test_link_and_image() {
        let tokens = tokenize(r#"[site](https://example.com "Home") ![alt *text*](a.png)"#);
        let children = tokens[1].children.as_ref().unwrap();
        assert_eq!(children[0].kind, "link_open");
        assert_eq!(children[0].attr("href"), Some("https://example.com"));
        assert_eq!(children[0].attr("title"), Some("Home"));

        let image = children.iter().find(|t| t.kind == "image").unwrap();
        assert_eq!(image.attr("src"), Some("a.png"));
        assert_eq!(image.content, "alt text");
    }

    #[test]
    fn test_hard_break() {
        let tokens = tokenize("a  \nb");
        let children = tokens[1].children.as_ref().unwrap();
        assert!(children.iter().any(|t| t.kind == "hardbreak"));
    }

    #[test]
    fn test_blockquote_and_rule() {
        let tokens = tokenize("> quote\n\n---");
        assert_eq!(
            kinds(&tokens),
            vec![
                "blockquote_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "blockquote_close",
                "hr",
            ]
        );
    }

    #[test]
    fn test_table_tokens() {
        let tokens = tokenize("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_balanced(&tokens);
        assert_eq!(
            kinds(&tokens)[..4],
            ["table_open", "thead_open", "tr_open", "th_open"]
        );
        assert_eq!(tokens[3].attr("style"), Some("text-align:left"));
        assert!(kinds(&tokens).contains(&"tbody_open"));
        let right = tokens.iter().filter(|t| t.kind == "td_open").nth(1).unwrap();
        assert_eq!(right.attr("style"), Some("text-align:right"));
    }

    #[test]
    fn test_tables_disabled_without_gfm() {
        let tokens = Tokenizer::new()
            .with_gfm(false)
            .tokenize("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(!kinds(&tokens).contains(&"table_open"));
    }

    #[test]
    fn test_html_block() {
        let tokens = tokenize("<div>\nhi\n</div>");
        assert_eq!(kinds(&tokens), vec!["html_block"]);
        assert!(tokens[0].content.contains("<div>"));
    }

    #[test]
    fn test_deterministic() {
        let markdown = "# T\n\n- a\n  1. b\n\n```js\nx\n```\n\n> *q*";
        assert_eq!(tokenize(markdown), tokenize(markdown));
    }

    #[test]
    fn test_malformed_input_degrades_to_text() {
        for input in [
            "**unclosed",
            "```\nunterminated fence",
            "[link](",
            "> > > >",
            "<div",
            "![",
            "1. \n2.",
            "|||\n|-|",
            "\u{0}\u{feff}",
        ] {
            let tokens = tokenize(input);
            assert_balanced(&tokens);
        }

        let tokens = tokenize("**unclosed");
        let children = tokens[1].children.as_ref().unwrap();
        assert!(children.iter().all(|t| t.kind == "text"));
    }
}
