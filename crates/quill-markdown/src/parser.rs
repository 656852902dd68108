//! Token stream to document tree.
//!
//! Dispatch goes entirely through the [`MappingTable`]: a token kind the table
//! does not know is skipped, never rejected.

use crate::document::{DocumentNode, Mark, PARAGRAPH};
use crate::mapping::{MappingTable, TokenSpec, TokenTarget};
use crate::token::{Attrs, Nesting, Token};

/// Build a document tree from tokens.
///
/// The result always has a single `document` root, whatever the token stream
/// looks like: unmatched closes are ignored and blocks still open at the end
/// are closed.
pub fn parse(tokens: &[Token], mapping: &MappingTable) -> DocumentNode {
    let mut state = ParseState::new(mapping);
    state.parse_tokens(tokens);
    state.finish()
}

/// A block node under construction.
struct OpenNode {
    node: DocumentNode,
    /// Created by the parser for stray inline content, not by a token.
    implicit: bool,
}

struct ParseState<'a> {
    mapping: &'a MappingTable,
    /// Open blocks; the root is always at the bottom.
    stack: Vec<OpenNode>,
    /// Active marks, outermost first.
    marks: Vec<Mark>,
    /// Inside the children of an `inline` token.
    in_inline: bool,
}

impl<'a> ParseState<'a> {
    fn new(mapping: &'a MappingTable) -> Self {
        Self {
            mapping,
            stack: vec![OpenNode {
                node: DocumentNode::document(Vec::new()),
                implicit: false,
            }],
            marks: Vec::new(),
            in_inline: false,
        }
    }

    fn parse_tokens(&mut self, tokens: &[Token]) {
        for (index, token) in tokens.iter().enumerate() {
            let Some(spec) = self.mapping.lookup(token) else {
                tracing::debug!(kind = token.kind, "Skipping unmapped token");
                continue;
            };
            self.apply(spec, tokens, index);
        }
    }

    fn apply(&mut self, spec: &TokenSpec, tokens: &[Token], index: usize) {
        let token = &tokens[index];
        match spec.target {
            TokenTarget::Children => {
                if let Some(children) = &token.children {
                    self.parse_inline(children);
                }
            }
            TokenTarget::Text => self.add_text(&token.content),
            TokenTarget::Literal(text) => self.add_text(text),
            TokenTarget::Ignore => {}
            TokenTarget::Mark(mark_type) => {
                let mark = Mark {
                    mark_type: mark_type.to_owned(),
                    attrs: spec.extract_attrs(tokens, index),
                };
                match token.nesting {
                    Nesting::Open => self.marks.push(mark),
                    Nesting::Close => self.close_mark(mark_type),
                    Nesting::SelfClosing => {
                        self.marks.push(mark);
                        if spec.no_close_token {
                            self.add_text(&token.content);
                        }
                        self.close_mark(mark_type);
                    }
                }
            }
            TokenTarget::Node(node_type) => {
                let mut node = DocumentNode::new(node_type);
                node.attrs = spec.extract_attrs(tokens, index);
                self.add_leaf(node);
            }
            TokenTarget::Block(node_type) => {
                let attrs = || spec.extract_attrs(tokens, index);
                match token.nesting {
                    Nesting::Open => self.open_block(node_type, attrs()),
                    Nesting::Close => self.close_block(node_type),
                    Nesting::SelfClosing => {
                        self.open_block(node_type, attrs());
                        if spec.no_close_token {
                            let content = &token.content;
                            self.add_text(content.strip_suffix('\n').unwrap_or(content));
                        }
                        self.close_block(node_type);
                    }
                }
            }
        }
    }

    fn parse_inline(&mut self, children: &[Token]) {
        let outer_marks = self.marks.len();
        let was_inline = std::mem::replace(&mut self.in_inline, true);
        self.parse_tokens(children);
        self.in_inline = was_inline;
        // Marks never leak out of the inline token that opened them.
        self.marks.truncate(outer_marks);
    }

    fn top(&self) -> &DocumentNode {
        // The root is never popped.
        &self.stack[self.stack.len() - 1].node
    }

    fn top_mut(&mut self) -> &mut DocumentNode {
        let last = self.stack.len() - 1;
        &mut self.stack[last].node
    }

    fn open_block(&mut self, node_type: &str, attrs: Attrs) {
        self.close_implicit();
        let mut node = DocumentNode::new(node_type);
        node.attrs = attrs;
        self.stack.push(OpenNode {
            node,
            implicit: false,
        });
    }

    /// Pop up to and including the innermost open block of `node_type`.
    fn close_block(&mut self, node_type: &str) {
        self.close_implicit();
        let Some(position) = self.stack[1..]
            .iter()
            .rposition(|open| open.node.node_type == node_type)
        else {
            tracing::debug!(node_type, "Ignoring unmatched close token");
            return;
        };
        let depth = position + 1;
        while self.stack.len() > depth {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if self.stack.len() > 1
            && let Some(open) = self.stack.pop()
        {
            self.top_mut().children.push(open.node);
        }
    }

    fn close_implicit(&mut self) {
        if self.stack.last().is_some_and(|open| open.implicit) {
            self.pop();
        }
    }

    /// Make sure the stack top accepts inline content.
    fn ensure_textblock(&mut self) {
        if !self.mapping.is_textblock(&self.top().node_type) {
            self.stack.push(OpenNode {
                node: DocumentNode::new(PARAGRAPH),
                implicit: true,
            });
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ensure_textblock();
        let marks = self.marks.clone();
        let parent = self.top_mut();
        if let Some(last) = parent.children.last_mut()
            && last.is_text()
            && last.marks == marks
            && let Some(existing) = &mut last.text
        {
            existing.push_str(text);
            return;
        }
        parent.children.push(DocumentNode::text_run(text, marks));
    }

    fn add_leaf(&mut self, mut node: DocumentNode) {
        if self.in_inline {
            self.ensure_textblock();
            node.marks = self.marks.clone();
        } else {
            self.close_implicit();
        }
        self.top_mut().children.push(node);
    }

    fn finish(mut self) -> DocumentNode {
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack
            .pop()
            .map(|open| open.node)
            .unwrap_or_else(|| DocumentNode::document(Vec::new()))
    }

    fn close_mark(&mut self, mark_type: &str) {
        if let Some(position) = self.marks.iter().rposition(|m| m.mark_type == mark_type) {
            self.marks.remove(position);
        }
    }
}
