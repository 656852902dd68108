//! HTML renderer.
//!
//! Renders tokens straight to HTML without building a document tree. Heading
//! ids come from the same [`Slugger`] walk as [`extract_toc`](crate::extract_toc),
//! so `render_with_toc` returns a TOC whose ids match the rendered anchors.
//!
//! Output is compact: no whitespace between block elements. Raw HTML in the
//! source is escaped like any other text.

use crate::slug::Slugger;
use crate::toc::{TocEntry, heading_entry};
use crate::token::{Nesting, Token};
use crate::tokenizer::Tokenizer;
use crate::util::{escape_html, heading_level_from_tag, parse_fence_info};

/// URL schemes that are never emitted as link targets.
const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Result of rendering markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Table of contents entries, in document order.
    pub toc: Vec<TocEntry>,
}

/// Markdown to HTML renderer.
///
/// # Example
///
/// ```
/// use quill_markdown::HtmlRenderer;
///
/// let result = HtmlRenderer::new().render_with_toc("# Hello");
/// assert_eq!(result.html, r#"<h1 id="hello">Hello</h1>"#);
/// assert_eq!(result.toc[0].id, "hello");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer {
    tokenizer: Tokenizer,
}

impl HtmlRenderer {
    /// Create a renderer with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GitHub Flavored Markdown (tables, strikethrough).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.tokenizer = self.tokenizer.with_gfm(enabled);
        self
    }

    /// Render markdown to HTML.
    pub fn render(&self, markdown: &str) -> String {
        self.render_with_toc(markdown).html
    }

    /// Render markdown to HTML, collecting the table of contents on the way.
    pub fn render_with_toc(&self, markdown: &str) -> RenderResult {
        self.render_tokens(&self.tokenizer.tokenize(markdown))
    }

    /// Render an already tokenized document.
    pub fn render_tokens(&self, tokens: &[Token]) -> RenderResult {
        let mut writer = HtmlWriter::default();
        for index in 0..tokens.len() {
            writer.block(tokens, index);
        }
        RenderResult {
            html: writer.out,
            toc: writer.toc,
        }
    }
}

/// Render markdown to HTML with default options.
pub fn render_html(markdown: &str) -> String {
    HtmlRenderer::new().render(markdown)
}

/// Per-call output and heading state.
#[derive(Default)]
struct HtmlWriter {
    out: String,
    slugger: Slugger,
    toc: Vec<TocEntry>,
}

impl HtmlWriter {
    fn block(&mut self, tokens: &[Token], index: usize) {
        let token = &tokens[index];
        match token.kind {
            "paragraph_open" if !token.hidden => self.out.push_str("<p>"),
            "paragraph_close" if !token.hidden => self.out.push_str("</p>"),
            "paragraph_open" | "paragraph_close" => {}
            "heading_open" => {
                let entry = heading_entry(&mut self.slugger, tokens, index);
                self.out.push_str(&format!(
                    r#"<h{} id="{}">"#,
                    entry.level,
                    escape_html(&entry.id)
                ));
                self.toc.push(entry);
            }
            "heading_close" => {
                let level = heading_level_from_tag(token.tag);
                self.out.push_str(&format!("</h{level}>"));
            }
            "ordered_list_open" => match token.attr("start") {
                Some(start) if start != "1" => {
                    self.out
                        .push_str(&format!(r#"<ol start="{}">"#, escape_html(start)));
                }
                _ => self.out.push_str("<ol>"),
            },
            "th_open" | "td_open" => {
                let tag = token.tag.unwrap_or("td");
                match token.attr("style") {
                    Some(style) => self.out.push_str(&format!(
                        r#"<{tag} style="{}">"#,
                        escape_html(style)
                    )),
                    None => self.out.push_str(&format!("<{tag}>")),
                }
            }
            "fence" => {
                let (language, _) = parse_fence_info(&token.info);
                code_block(&mut self.out, Some(&language), &token.content);
            }
            "code_block" => code_block(&mut self.out, None, &token.content),
            "hr" => self.out.push_str("<hr>"),
            "html_block" => {
                self.out.push_str("<p>");
                self.out.push_str(&escape_html(token.content.trim_end()));
                self.out.push_str("</p>");
            }
            "inline" => {
                if let Some(children) = &token.children {
                    self.inline(children);
                }
            }
            _ => match (token.nesting, token.tag) {
                (Nesting::Open, Some(tag)) => {
                    self.out.push_str(&format!("<{tag}>"));
                }
                (Nesting::Close, Some(tag)) => {
                    self.out.push_str(&format!("</{tag}>"));
                }
                _ => {}
            },
        }
    }

    fn inline(&mut self, children: &[Token]) {
        for token in children {
            match token.kind {
                "text" => self.out.push_str(&escape_html(&token.content)),
                "softbreak" => self.out.push('\n'),
                "hardbreak" => self.out.push_str("<br>"),
                "code_inline" => {
                    self.out
                        .push_str(&format!("<code>{}</code>", escape_html(&token.content)));
                }
                "link_open" => {
                    let href = safe_url(token.attr("href").unwrap_or_default(), false);
                    self.out.push_str(&format!(r#"<a href="{}""#, escape_html(href)));
                    if let Some(title) = token.attr("title") {
                        self.out
                            .push_str(&format!(r#" title="{}""#, escape_html(title)));
                    }
                    self.out.push('>');
                }
                "link_close" => self.out.push_str("</a>"),
                "image" => self.image(token),
                "html_inline" => self.out.push_str(&escape_html(&token.content)),
                _ => match (token.nesting, token.tag) {
                    (Nesting::Open, Some(tag)) => {
                        self.out.push_str(&format!("<{tag}>"));
                    }
                    (Nesting::Close, Some(tag)) => {
                        self.out.push_str(&format!("</{tag}>"));
                    }
                    _ => self.out.push_str(&escape_html(&token.content)),
                },
            }
        }
    }

    fn image(&mut self, token: &Token) {
        let src = safe_url(token.attr("src").unwrap_or_default(), true);
        let title_attr = token
            .attr("title")
            .map(|title| format!(r#" title="{}""#, escape_html(title)))
            .unwrap_or_default();
        self.out.push_str(&format!(
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(&token.content)
        ));
    }
}

fn code_block(out: &mut String, language: Option<&str>, content: &str) {
    match language.filter(|l| !l.is_empty()) {
        Some(language) => out.push_str(&format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(language),
            escape_html(content)
        )),
        None => out.push_str(&format!("<pre><code>{}</code></pre>", escape_html(content))),
    }
}

/// Replace URLs with a script-capable scheme by `#`.
///
/// Inline `data:image/...` URLs stay allowed for images.
fn safe_url(url: &str, image: bool) -> &str {
    let normalized: String = url
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if image && normalized.starts_with("data:image/") {
        return url;
    }
    if UNSAFE_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme)) {
        "#"
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_with_id() {
        assert_eq!(render_html("# Hello"), r#"<h1 id="hello">Hello</h1>"#);
        assert_eq!(
            render_html("### Deep *dive*"),
            r#"<h3 id="deep-dive">Deep <em>dive</em></h3>"#
        );
    }

    #[test]
    fn test_duplicate_heading_ids() {
        assert_eq!(
            render_html("# A\n# A"),
            r#"<h1 id="a">A</h1><h1 id="a-1">A</h1>"#
        );
    }

    #[test]
    fn test_render_with_toc() {
        let result = HtmlRenderer::new().render_with_toc("# Intro\n\n## Setup");
        assert_eq!(
            result.html,
            r#"<h1 id="intro">Intro</h1><h2 id="setup">Setup</h2>"#
        );
        let ids: Vec<_> = result.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "setup"]);
    }

    #[test]
    fn test_empty_input() {
        let result = HtmlRenderer::new().render_with_toc("");
        assert_eq!(result.html, "");
        assert!(result.toc.is_empty());
    }

    #[test]
    fn test_paragraph_and_inline() {
        assert_eq!(
            render_html("Hello **bold** `code` ~~gone~~\nnext  \nline"),
            "<p>Hello <strong>bold</strong> <code>code</code> <s>gone</s>\nnext<br>line</p>"
        );
    }

    #[test]
    fn test_tight_list_has_no_paragraphs() {
        assert_eq!(render_html("- x\n- y"), "<ul><li>x</li><li>y</li></ul>");
    }

    #[test]
    fn test_loose_list_has_paragraphs() {
        assert_eq!(
            render_html("- x\n\n- y"),
            "<ul><li><p>x</p></li><li><p>y</p></li></ul>"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(render_html("1. a"), "<ol><li>a</li></ol>");
        assert_eq!(render_html("7. a"), r#"<ol start="7"><li>a</li></ol>"#);
    }

    #[test]
    fn test_fenced_code_with_language() {
        assert_eq!(
            render_html("```rust title=main.rs\nlet x = a < b;\n```"),
            "<pre><code class=\"language-rust\">let x = a &lt; b;\n</code></pre>"
        );
    }

    #[test]
    fn test_code_without_language() {
        assert_eq!(
            render_html("```\nplain\n```"),
            "<pre><code>plain\n</code></pre>"
        );
        assert_eq!(
            render_html("    indented\n"),
            "<pre><code>indented\n</code></pre>"
        );
    }

    #[test]
    fn test_blockquote_and_rule() {
        assert_eq!(
            render_html("> quote\n\n---"),
            "<blockquote><p>quote</p></blockquote><hr>"
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            render_html(r#"[a](/b "T") ![alt](i.png "Pic")"#),
            r#"<p><a href="/b" title="T">a</a> <img src="i.png" title="Pic" alt="alt"></p>"#
        );
    }

    #[test]
    fn test_unsafe_link_schemes() {
        assert_eq!(
            render_html("[x](javascript:alert(1))"),
            r##"<p><a href="#">x</a></p>"##
        );
        assert_eq!(
            render_html("[x](JaVaScRiPt:alert(1))"),
            r##"<p><a href="#">x</a></p>"##
        );
        assert_eq!(
            render_html("![x](data:image/png;base64,AAAA)"),
            r#"<p><img src="data:image/png;base64,AAAA" alt="x"></p>"#
        );
    }

    #[test]
    fn test_raw_html_is_escaped() {
        assert_eq!(
            render_html("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
        assert_eq!(
            render_html("a <b>b</b>"),
            "<p>a &lt;b&gt;b&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(
            render_html(r#"Tom & "Jerry" 1 \< 2"#),
            "<p>Tom &amp; &quot;Jerry&quot; 1 &lt; 2</p>"
        );
    }

    #[test]
    fn test_table_alignment() {
        assert_eq!(
            render_html("| A | B |\n|:--|---|\n| 1 | 2 |"),
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align:left">A</th><th>B</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align:left">1</td><td>2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_heading_ids_are_html_safe() {
        let html = render_html(r#"# Q&A "quoted""#);
        assert_eq!(
            html,
            r#"<h1 id="qa-quoted">Q&amp;A &quot;quoted&quot;</h1>"#
        );
    }

    #[test]
    fn test_gfm_disabled() {
        let html = HtmlRenderer::new().with_gfm(false).render("~~x~~");
        assert_eq!(html, "<p>~~x~~</p>");
    }
}
