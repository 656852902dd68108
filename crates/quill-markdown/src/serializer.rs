//! Document tree to markdown.
//!
//! The serializer is the inverse of the [`MappingTable`](crate::MappingTable):
//! one rule per node type and one per mark type. Output re-parses to an
//! equivalent tree: text is escaped wherever it could be mistaken for markup,
//! code fences grow to outrun fence-character runs in the code, and adjacent lists
//! alternate their markers so they stay separate.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{DOCUMENT, DocumentNode, Mark, PARAGRAPH};
use crate::util::FENCE_INFO_ATTR;

static STANDARD: LazyLock<MarkdownSerializer> = LazyLock::new(MarkdownSerializer::build_standard);

/// Entity references (`&amp;`, `&#35;`) that must not be decoded on re-parse.
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&#?[A-Za-z0-9]+;").expect("valid regex"));
static LINE_START_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-+=>])").expect("valid regex"));
static LINE_START_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(#{1,6})(\s|$)").expect("valid regex"));
static LINE_START_ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d{1,9})([.)])(\s|$)").expect("valid regex"));

/// Context handed to block rules by the enclosing container.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockContext {
    /// Sibling blocks are separated by a single newline.
    pub tight: bool,
    /// Use the alternate list marker (`*`, `)`) so this list does not merge
    /// with an adjacent list of the same kind.
    pub alternate: bool,
}

/// Context handed to inline rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineContext {
    /// Content must stay on one line (headings, table cells).
    pub single_line: bool,
}

pub type BlockRule = fn(&MarkdownSerializer, &DocumentNode, BlockContext) -> String;
pub type InlineRule = fn(&MarkdownSerializer, &DocumentNode, InlineContext) -> String;

/// How a node type is written.
#[derive(Clone, Copy, Debug)]
pub enum NodeRule {
    Block(BlockRule),
    Inline(InlineRule),
}

/// How a mark type is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkRule {
    /// Wrap the marked range in fixed delimiters.
    Delimited {
        open: &'static str,
        close: &'static str,
    },
    /// `[text](href "title")`.
    Link,
    /// Backtick code span; content is written verbatim.
    CodeSpan,
}

/// Markdown serializer driven by node and mark rule tables.
#[derive(Clone, Debug, Default)]
pub struct MarkdownSerializer {
    nodes: HashMap<&'static str, NodeRule>,
    marks: HashMap<&'static str, MarkRule>,
}

impl MarkdownSerializer {
    /// Create a serializer without rules. Every node is written as plain text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The serializer for the standard node and mark set.
    pub fn standard() -> &'static MarkdownSerializer {
        &STANDARD
    }

    #[must_use]
    pub fn with_node_rule(mut self, node_type: &'static str, rule: NodeRule) -> Self {
        self.nodes.insert(node_type, rule);
        self
    }

    #[must_use]
    pub fn with_mark_rule(mut self, mark_type: &'static str, rule: MarkRule) -> Self {
        self.marks.insert(mark_type, rule);
        self
    }

    pub fn has_node_rule(&self, node_type: &str) -> bool {
        self.nodes.contains_key(node_type)
    }

    pub fn has_mark_rule(&self, mark_type: &str) -> bool {
        self.marks.contains_key(mark_type)
    }

    /// Serialize a document (or any single node) to markdown.
    ///
    /// Non-empty output ends with a newline. Never fails: nodes without a
    /// rule are written as their escaped text content.
    pub fn serialize(&self, node: &DocumentNode) -> String {
        let mut out = if node.node_type == DOCUMENT {
            self.blocks(&node.children, false)
        } else {
            self.block(node, BlockContext::default())
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Write a sequence of sibling blocks.
    pub fn blocks(&self, children: &[DocumentNode], tight: bool) -> String {
        let mut out = String::new();
        let mut previous: Option<&DocumentNode> = None;
        let mut alternate = false;

        for child in children {
            alternate = previous.is_some_and(|p| p.node_type == child.node_type && is_list(child))
                && !alternate;
            let text = self.block(child, BlockContext { tight, alternate });
            if text.is_empty() {
                continue;
            }
            if let Some(previous) = previous {
                out.push_str(block_separator(previous, child, tight));
            }
            out.push_str(&text);
            previous = Some(child);
        }
        out
    }

    /// Write one block node.
    pub fn block(&self, node: &DocumentNode, ctx: BlockContext) -> String {
        if node.is_text() {
            return self.inline(std::slice::from_ref(node), InlineContext::default());
        }
        match self.nodes.get(node.node_type.as_str()) {
            Some(NodeRule::Block(rule)) => rule(self, node, ctx),
            Some(NodeRule::Inline(_)) => {
                self.inline(std::slice::from_ref(node), InlineContext::default())
            }
            None => escape_text(&node.text_content(), true),
        }
    }

    /// Write inline content, opening and closing marks so that ranges nest.
    pub fn inline(&self, nodes: &[DocumentNode], ctx: InlineContext) -> String {
        let mut out = String::new();
        let mut active: Vec<&Mark> = Vec::new();

        for node in nodes {
            let marks: Vec<&Mark> = node
                .marks
                .iter()
                .filter(|m| {
                    matches!(
                        self.marks.get(m.mark_type.as_str()),
                        Some(MarkRule::Delimited { .. } | MarkRule::Link)
                    )
                })
                .collect();
            let text = node.text.as_deref().filter(|_| node.is_text());
            let keep = active
                .iter()
                .zip(&marks)
                .take_while(|(a, b)| a == b)
                .count();

            self.close_marks(&mut out, &mut active, keep);

            // Delimiters must touch text, link brackets need not. Marks up to
            // the innermost new link open before leading whitespace, the
            // delimited marks inside it only once text starts.
            let opening = &marks[keep..];
            let bracketed = opening
                .iter()
                .rposition(|m| self.is_link(m))
                .map_or(0, |i| i + 1);
            for &mark in &opening[..bracketed] {
                out.push_str(&self.mark_open(mark));
                active.push(mark);
            }

            let mut body = text;
            if let Some(t) = text
                && !self.is_code(node)
            {
                let trimmed = t.trim_start();
                if trimmed.is_empty() {
                    out.push_str(t);
                    continue;
                }
                if opening.len() > bracketed {
                    out.push_str(&t[..t.len() - trimmed.len()]);
                    body = Some(trimmed);
                }
            }
            for &mark in &opening[bracketed..] {
                out.push_str(&self.mark_open(mark));
                active.push(mark);
            }

            match body {
                Some(t) if self.is_code(node) => out.push_str(&code_span(t)),
                Some(t) => {
                    let at_line_start = out.is_empty() || out.ends_with('\n');
                    out.push_str(&escape_text(t, at_line_start));
                }
                None => out.push_str(&self.inline_node(node, ctx)),
            }
        }

        self.close_marks(&mut out, &mut active, 0);
        out
    }

    fn inline_node(&self, node: &DocumentNode, ctx: InlineContext) -> String {
        match self.nodes.get(node.node_type.as_str()) {
            Some(NodeRule::Inline(rule)) => rule(self, node, ctx),
            Some(NodeRule::Block(_)) | None => escape_text(&node.text_content(), false),
        }
    }

    fn is_code(&self, node: &DocumentNode) -> bool {
        node.marks
            .iter()
            .any(|m| self.marks.get(m.mark_type.as_str()) == Some(&MarkRule::CodeSpan))
    }

    fn is_link(&self, mark: &Mark) -> bool {
        self.marks.get(mark.mark_type.as_str()) == Some(&MarkRule::Link)
    }

    /// Close `active[keep..]`, innermost first.
    ///
    /// Trailing spaces move outside delimited marks but stay inside the
    /// innermost link being closed.
    fn close_marks(&self, out: &mut String, active: &mut Vec<&Mark>, keep: usize) {
        if active.len() <= keep {
            return;
        }
        let mut trailing = Some(out.split_off(out.trim_end_matches([' ', '\t']).len()));
        for mark in active[keep..].iter().rev() {
            if self.is_link(mark)
                && let Some(spaces) = trailing.take()
            {
                out.push_str(&spaces);
            }
            out.push_str(&self.mark_close(mark));
        }
        if let Some(spaces) = trailing {
            out.push_str(&spaces);
        }
        active.truncate(keep);
    }

    fn mark_open(&self, mark: &Mark) -> String {
        match self.marks.get(mark.mark_type.as_str()) {
            Some(MarkRule::Delimited { open, .. }) => (*open).to_owned(),
            Some(MarkRule::Link) => "[".to_owned(),
            Some(MarkRule::CodeSpan) | None => String::new(),
        }
    }

    fn mark_close(&self, mark: &Mark) -> String {
        match self.marks.get(mark.mark_type.as_str()) {
            Some(MarkRule::Delimited { close, .. }) => (*close).to_owned(),
            Some(MarkRule::Link) => format!(
                "]({}{})",
                link_destination(mark.attr("href").unwrap_or_default()),
                link_title(mark.attr("title"))
            ),
            Some(MarkRule::CodeSpan) | None => String::new(),
        }
    }

    fn build_standard() -> Self {
        Self::new()
            .with_node_rule(PARAGRAPH, NodeRule::Block(paragraph))
            .with_node_rule("heading", NodeRule::Block(heading))
            .with_node_rule("blockquote", NodeRule::Block(blockquote))
            .with_node_rule("bullet_list", NodeRule::Block(list))
            .with_node_rule("ordered_list", NodeRule::Block(list))
            .with_node_rule("list_item", NodeRule::Block(list_item))
            .with_node_rule("code_block", NodeRule::Block(code_block))
            .with_node_rule("horizontal_rule", NodeRule::Block(horizontal_rule))
            .with_node_rule("table", NodeRule::Block(table))
            .with_node_rule("table_row", NodeRule::Block(table_row))
            .with_node_rule("table_header", NodeRule::Block(table_cell))
            .with_node_rule("table_cell", NodeRule::Block(table_cell))
            .with_node_rule("hard_break", NodeRule::Inline(hard_break))
            .with_node_rule("image", NodeRule::Inline(image))
            .with_mark_rule(
                "em",
                MarkRule::Delimited {
                    open: "*",
                    close: "*",
                },
            )
            .with_mark_rule(
                "strong",
                MarkRule::Delimited {
                    open: "**",
                    close: "**",
                },
            )
            .with_mark_rule(
                "strike",
                MarkRule::Delimited {
                    open: "~~",
                    close: "~~",
                },
            )
            .with_mark_rule("link", MarkRule::Link)
            .with_mark_rule("code", MarkRule::CodeSpan)
    }
}

/// Serialize with the standard rules.
pub fn serialize(doc: &DocumentNode) -> String {
    MarkdownSerializer::standard().serialize(doc)
}

fn is_list(node: &DocumentNode) -> bool {
    matches!(node.node_type.as_str(), "bullet_list" | "ordered_list")
}

fn block_separator(previous: &DocumentNode, next: &DocumentNode, tight: bool) -> &'static str {
    // A paragraph line followed directly by another paragraph (or an ordered
    // list not starting at 1) would be read as one paragraph.
    let merges = previous.node_type == PARAGRAPH
        && (next.node_type == PARAGRAPH
            || (next.node_type == "ordered_list" && next.attr("order").is_some_and(|o| o != "1")));
    if tight && !merges { "\n" } else { "\n\n" }
}

fn paragraph(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    s.inline(&node.children, InlineContext::default())
}

fn heading(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    let level = node
        .attr("level")
        .and_then(|l| l.parse::<usize>().ok())
        .map_or(1, |l| l.clamp(1, 6));
    let mut content = s.inline(&node.children, InlineContext { single_line: true });

    // A trailing `#` run would be read as the closing sequence.
    if content.ends_with('#') {
        let run_start = content.trim_end_matches('#').len();
        content.insert(run_start, '\\');
    }

    let hashes = "#".repeat(level);
    if content.is_empty() {
        hashes
    } else {
        format!("{hashes} {content}")
    }
}

fn blockquote(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    let inner = s.blocks(&node.children, false);
    if inner.is_empty() {
        return ">".to_owned();
    }
    inner
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_owned()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list(s: &MarkdownSerializer, node: &DocumentNode, ctx: BlockContext) -> String {
    let tight = node.attr("tight") == Some("true");
    let ordered = node.node_type == "ordered_list";
    let start = node
        .attr("order")
        .and_then(|o| o.parse::<u64>().ok())
        .unwrap_or(1);

    let mut items = Vec::with_capacity(node.children.len());
    for (number, item) in (start..).zip(&node.children) {
        let marker = match (ordered, ctx.alternate) {
            (true, false) => format!("{number}."),
            (true, true) => format!("{number})"),
            (false, false) => "-".to_owned(),
            (false, true) => "*".to_owned(),
        };
        let content = if item.node_type == "list_item" {
            s.blocks(&item.children, tight)
        } else {
            s.block(item, BlockContext::default())
        };
        items.push(indent_item(&marker, &content));
    }
    items.join(if tight { "\n" } else { "\n\n" })
}

/// Prefix the first line with the marker and indent the rest by its width.
fn indent_item(marker: &str, content: &str) -> String {
    if content.is_empty() {
        return marker.to_owned();
    }
    let indent = " ".repeat(marker.len() + 1);
    let mut out = String::new();
    for (i, line) in content.split('\n').enumerate() {
        if i == 0 {
            out.push_str(marker);
            out.push(' ');
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }
    out
}

fn list_item(s: &MarkdownSerializer, node: &DocumentNode, ctx: BlockContext) -> String {
    s.blocks(&node.children, ctx.tight)
}

fn code_block(_s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    let code = node.text_content();
    let info = fence_info(node);

    // A backtick fence cannot carry a backtick in its info string.
    let marker = if info.contains('`') { '~' } else { '`' };
    let longest_run = code
        .split(|c| c != marker)
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = marker.to_string().repeat((longest_run + 1).max(3));

    if code.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{code}\n{fence}")
    }
}

/// Info string: language, bare words, then `key=value` pairs.
fn fence_info(node: &DocumentNode) -> String {
    let mut info = node.attr("language").unwrap_or_default().to_owned();
    if let Some(words) = node.attr(FENCE_INFO_ATTR) {
        info.push(' ');
        info.push_str(words);
    }
    for (key, value) in node
        .attrs
        .iter()
        .filter(|(k, _)| *k != "language" && *k != FENCE_INFO_ATTR)
    {
        info.push_str(&format!(" {key}={value}"));
    }
    info
}

fn horizontal_rule(_s: &MarkdownSerializer, _node: &DocumentNode, ctx: BlockContext) -> String {
    // `---` right under a paragraph line would turn it into a heading.
    let rule = if ctx.tight { "***" } else { "---" };
    rule.to_owned()
}

fn hard_break(_s: &MarkdownSerializer, _node: &DocumentNode, ctx: InlineContext) -> String {
    let text = if ctx.single_line { " " } else { "\\\n" };
    text.to_owned()
}

fn image(_s: &MarkdownSerializer, node: &DocumentNode, _ctx: InlineContext) -> String {
    format!(
        "![{}]({}{})",
        escape_text(node.attr("alt").unwrap_or_default(), false),
        link_destination(node.attr("src").unwrap_or_default()),
        link_title(node.attr("title"))
    )
}

fn table(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    let rows: Vec<Vec<String>> = node
        .children
        .iter()
        .map(|row| row.children.iter().map(|cell| cell_content(s, cell)).collect())
        .collect();
    let Some(header) = node.children.first() else {
        return String::new();
    };
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let delimiter: Vec<String> = (0..columns)
        .map(|i| {
            let align = header.children.get(i).and_then(|cell| cell.attr("align"));
            let delimiter = match align {
                Some("left") => ":--",
                Some("center") => ":-:",
                Some("right") => "--:",
                _ => "---",
            };
            delimiter.to_owned()
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, cells) in rows.iter().enumerate() {
        lines.push(table_line(cells, columns));
        if i == 0 {
            lines.push(table_line(&delimiter, columns));
        }
    }
    lines.join("\n")
}

fn table_row(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    let cells: Vec<String> = node.children.iter().map(|cell| cell_content(s, cell)).collect();
    table_line(&cells, cells.len().max(1))
}

fn table_cell(s: &MarkdownSerializer, node: &DocumentNode, _ctx: BlockContext) -> String {
    cell_content(s, node)
}

fn cell_content(s: &MarkdownSerializer, cell: &DocumentNode) -> String {
    s.inline(&cell.children, InlineContext { single_line: true })
        .replace('|', "\\|")
}

fn table_line(cells: &[String], columns: usize) -> String {
    let padded: Vec<&str> = (0..columns)
        .map(|i| cells.get(i).map_or("", String::as_str))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Wrap code in a backtick span long enough to contain it.
fn code_span(code: &str) -> String {
    let longest_run = code
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let ticks = "`".repeat(longest_run + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    if pad {
        format!("{ticks} {code} {ticks}")
    } else {
        format!("{ticks}{code}{ticks}")
    }
}

fn link_destination(href: &str) -> String {
    if href.contains(char::is_whitespace) {
        let escaped = href.replace('<', "\\<").replace('>', "\\>");
        return format!("<{escaped}>");
    }
    href.replace('(', "\\(").replace(')', "\\)")
}

fn link_title(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => {
            format!(" \"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
        }
        _ => String::new(),
    }
}

/// Escape text so that it re-parses as the same text.
fn escape_text(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let escaped = escape_inline_chars(line);
        if i > 0 || at_line_start {
            out.push_str(&escape_line_start(&escaped));
        } else {
            out.push_str(&escaped);
        }
    }
    out
}

fn escape_inline_chars(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut previous: Option<char> = None;
    for (idx, c) in line.char_indices() {
        let next = line[idx + c.len_utf8()..].chars().next();
        match c {
            '\\' | '`' | '*' | '[' | ']' | '<' | '~' => out.push('\\'),
            '_' => {
                let intraword = previous.is_some_and(char::is_alphanumeric)
                    && next.is_some_and(char::is_alphanumeric);
                if !intraword {
                    out.push('\\');
                }
            }
            '&' if ENTITY.is_match(&line[idx..]) => out.push('\\'),
            _ => {}
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

fn escape_line_start(line: &str) -> String {
    if LINE_START_MARKER.is_match(line) {
        return LINE_START_MARKER.replace(line, r"${1}\${2}").into_owned();
    }
    if LINE_START_HEADING.is_match(line) {
        return LINE_START_HEADING
            .replace(line, r"${1}\${2}${3}")
            .into_owned();
    }
    LINE_START_ORDERED
        .replace(line, r"${1}${2}\${3}${4}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingTable;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn text(t: &str) -> DocumentNode {
        DocumentNode::text_run(t, vec![])
    }

    fn paragraph_of(children: Vec<DocumentNode>) -> DocumentNode {
        DocumentNode::new(PARAGRAPH).with_children(children)
    }

    fn parse_markdown(markdown: &str) -> DocumentNode {
        parse(&tokenize(markdown), MappingTable::standard())
    }

    fn normalize(markdown: &str) -> String {
        serialize(&parse_markdown(markdown))
    }

    /// Serializing and re-parsing yields the same tree.
    fn assert_stable(markdown: &str) {
        let doc = parse_markdown(markdown);
        let written = serialize(&doc);
        assert_eq!(parse_markdown(&written), doc, "serialized as:\n{written}");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(serialize(&DocumentNode::document(vec![])), "");
    }

    #[test]
    fn test_heading() {
        assert_eq!(normalize("# Hello"), "# Hello\n");
        assert_eq!(normalize("Title\n====="), "# Title\n");
        assert_eq!(normalize("###### Six"), "###### Six\n");
    }

    #[test]
    fn test_heading_trailing_hashes_escaped() {
        let doc = DocumentNode::document(vec![
            DocumentNode::new("heading")
                .with_attr("level", "2")
                .with_children(vec![text("C #")]),
        ]);
        assert_eq!(serialize(&doc), "## C \\#\n");
        assert_eq!(parse_markdown(&serialize(&doc)), doc);
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        assert_eq!(normalize("one\n\n\n\ntwo"), "one\n\ntwo\n");
    }

    #[test]
    fn test_tight_and_loose_lists() {
        assert_eq!(normalize("* x\n* y"), "- x\n- y\n");
        assert_eq!(normalize("- x\n\n- y"), "- x\n\n- y\n");
    }

    #[test]
    fn test_nested_list_indentation() {
        assert_eq!(
            normalize("- a\n    - b\n        - c"),
            "- a\n  - b\n    - c\n"
        );
        assert_eq!(normalize("10. a\n    - b"), "10. a\n    - b\n");
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(normalize("3. a\n4. b"), "3. a\n4. b\n");
    }

    #[test]
    fn test_adjacent_lists_alternate_markers() {
        let list = |item: &str| {
            DocumentNode::new("bullet_list")
                .with_attr("tight", "true")
                .with_children(vec![
                    DocumentNode::new("list_item").with_children(vec![paragraph_of(vec![text(item)])]),
                ])
        };
        let doc = DocumentNode::document(vec![list("a"), list("b"), list("c")]);
        assert_eq!(serialize(&doc), "- a\n\n* b\n\n- c\n");
        assert_eq!(parse_markdown(&serialize(&doc)), doc);
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(normalize("> a\n>\n> b"), "> a\n>\n> b\n");
        assert_eq!(normalize("> # T\n> - x"), "> # T\n>\n> - x\n");
    }

    #[test]
    fn test_code_block_fence() {
        assert_eq!(
            normalize("```rust title=main.rs\nfn main() {}\n```"),
            "```rust title=main.rs\nfn main() {}\n```\n"
        );
        assert_eq!(normalize("    indented\n"), "```\nindented\n```\n");
    }

    #[test]
    fn test_code_block_fence_outruns_backticks() {
        let doc = DocumentNode::document(vec![
            DocumentNode::new("code_block").with_children(vec![text("````\ninner\n````")]),
        ]);
        let written = serialize(&doc);
        assert!(written.starts_with("`````\n"), "{written}");
        assert_eq!(parse_markdown(&written), doc);
    }

    #[test]
    fn test_code_block_tilde_fence_for_backtick_info() {
        let markdown = "~~~ a`b\nx\n~~~";
        let doc = parse_markdown(markdown);
        assert_eq!(doc.children[0].node_type, "code_block");
        assert_eq!(doc.children[0].attr("language"), Some("a`b"));

        let written = serialize(&doc);
        assert_eq!(written, "~~~a`b\nx\n~~~\n");
        assert_eq!(parse_markdown(&written), doc);
    }

    #[test]
    fn test_code_block_tilde_fence_outruns_tildes() {
        let doc = DocumentNode::document(vec![
            DocumentNode::new("code_block")
                .with_attr("language", "a`b")
                .with_children(vec![text("~~~~\ninner")]),
        ]);
        let written = serialize(&doc);
        assert!(written.starts_with("~~~~~a`b\n"), "{written}");
        assert_eq!(parse_markdown(&written), doc);
    }

    #[test]
    fn test_code_block_keeps_bare_info_words() {
        assert_eq!(
            normalize("```rust ignore title=lib.rs\nfn f() {}\n```"),
            "```rust ignore title=lib.rs\nfn f() {}\n```\n"
        );
    }

    #[test]
    fn test_tight_list_starting_with_non_paragraph() {
        for (markdown, expected) in [
            ("- # h\n- b", "- # h\n- b\n"),
            ("- - a\n- b", "- - a\n- b\n"),
        ] {
            let doc = parse_markdown(markdown);
            assert_eq!(doc.children[0].attr("tight"), Some("true"), "{markdown:?}");
            assert_eq!(serialize(&doc), expected);
            assert_stable(markdown);
        }
    }

    #[test]
    fn test_marks() {
        assert_eq!(
            normalize("*em* **strong** ~~gone~~ `code` [link](/a \"T\")"),
            "*em* **strong** ~~gone~~ `code` [link](/a \"T\")\n"
        );
    }

    #[test]
    fn test_nested_marks() {
        assert_eq!(normalize("**bold *both***"), "**bold *both***\n");
        assert_eq!(normalize("[**x**](/y)"), "[**x**](/y)\n");
    }

    #[test]
    fn test_whitespace_moved_outside_marks() {
        let doc = DocumentNode::document(vec![paragraph_of(vec![
            text("a"),
            DocumentNode::text_run(" b ", vec![Mark::new("strong")]),
            text("c"),
        ])]);
        assert_eq!(serialize(&doc), "a **b** c\n");
    }

    #[test]
    fn test_link_text_whitespace_kept_inside_brackets() {
        assert_eq!(normalize("see [docs ](/d) now"), "see [docs ](/d) now\n");
        assert_eq!(normalize("a [ b](/z) c"), "a [ b](/z) c\n");
        assert_eq!(normalize("[ ](/x) after"), "[ ](/x) after\n");
        assert_eq!(normalize("[*a* ](/x)"), "[*a* ](/x)\n");
        assert_stable("see [docs ](/d) now");
        assert_stable("a [ b](/z) c");
        assert_stable("[ ](/x) after");
    }

    #[test]
    fn test_whitespace_only_link_is_not_dropped() {
        let doc = DocumentNode::document(vec![paragraph_of(vec![
            DocumentNode::text_run(" ", vec![Mark::new("link").with_attr("href", "/x")]),
            text(" after"),
        ])]);
        let written = serialize(&doc);
        assert_eq!(written, "[ ](/x) after\n");
        assert_eq!(parse_markdown(&written), doc);
    }

    #[test]
    fn test_code_span_with_backticks() {
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("`x"), "`` `x ``");
        assert_eq!(code_span(" x "), "`  x  `");
        assert_eq!(code_span("  "), "`  `");
        assert_stable("use ``a`b`` here");
    }

    #[test]
    fn test_text_escaping() {
        let doc = DocumentNode::document(vec![paragraph_of(vec![text(
            "*not em* [x] <b> a_b _c_ ~s~ \\ &amp;",
        )])]);
        let written = serialize(&doc);
        assert_eq!(
            written,
            "\\*not em\\* \\[x\\] \\<b> a_b \\_c\\_ \\~s\\~ \\\\ \\&amp;\n"
        );
        assert_eq!(parse_markdown(&written), doc);
    }

    #[test]
    fn test_line_start_escaping() {
        for line in ["# not a heading", "- not a list", "> not a quote", "1. not a list", "+ x"] {
            let doc = DocumentNode::document(vec![paragraph_of(vec![text(line)])]);
            let written = serialize(&doc);
            assert_eq!(parse_markdown(&written), doc, "serialized as: {written}");
        }
    }

    #[test]
    fn test_hard_break_and_image() {
        assert_eq!(normalize("a\\\nb"), "a\\\nb\n");
        assert_eq!(
            normalize("![alt](a.png \"Title\")"),
            "![alt](a.png \"Title\")\n"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            normalize("| A | B | C |\n|:--|:-:|--:|\n| 1 | 2 | 3 |"),
            "| A | B | C |\n| :-- | :-: | --: |\n| 1 | 2 | 3 |\n"
        );
    }

    #[test]
    fn test_table_cell_pipe_escaped() {
        assert_stable("| A |\n|---|\n| a \\| b |");
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(normalize("***"), "---\n");
    }

    #[test]
    fn test_unknown_node_as_text() {
        let doc = DocumentNode::document(vec![
            DocumentNode::new("callout").with_children(vec![paragraph_of(vec![text("Note *this*")])]),
        ]);
        assert_eq!(serialize(&doc), "Note \\*this\\*\n");
    }

    #[test]
    fn test_unknown_mark_dropped() {
        let doc = DocumentNode::document(vec![paragraph_of(vec![DocumentNode::text_run(
            "x",
            vec![Mark::new("highlight")],
        )])]);
        assert_eq!(serialize(&doc), "x\n");
    }

    #[test]
    fn test_round_trips() {
        for markdown in [
            "# Title\n\nSome *text* with **marks**.",
            "- x\n- y",
            "- a\n  - b\n- c",
            "1. one\n2. two\n\n   para",
            "> quote\n>\n> - item",
            "```js\nconst a = `b`;\n```",
            "Line  \nbreak",
            "[a *b*](/c) and ![i](j.png)",
            "| H |\n|---|\n| `c` |",
            "---\n\ntext after rule",
            "1986\\. A great year",
            "- [ ] task",
            "see [docs ](/d) now",
            "a [ b](/z) c",
            "[ ](/x) after",
            "**[ x ](/y)** and *a [b](/c)*",
            "- # h\n- b",
            "- - a\n- b",
            "1. ```\n   code\n   ```\n2. next",
            "~~~ a`b\nx\n~~~",
            "````md\n```\nnested\n```\n````",
        ] {
            assert_stable(markdown);
        }
    }
}
