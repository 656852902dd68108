//! Structured document tree.

use crate::token::Attrs;

/// Node type of the tree root.
pub const DOCUMENT: &str = "document";
/// Node type of text runs.
pub const TEXT: &str = "text";
/// Node type the parser creates for stray inline content.
pub const PARAGRAPH: &str = "paragraph";

/// Inline decoration attached to a text run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mark {
    /// Mark type, e.g. `strong` or `link`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub mark_type: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Attrs::is_empty")
    )]
    pub attrs: Attrs,
}

impl Mark {
    #[must_use]
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
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
}

/// A node of the document tree.
///
/// Block nodes hold either block children or inline children (text runs and
/// inline leaves such as `image`), never both. Text runs carry their text in
/// `text` and their decorations in `marks`, outermost mark first.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentNode {
    /// Node type, e.g. `heading` or `text`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub node_type: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Attrs::is_empty")
    )]
    pub attrs: Attrs,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub children: Vec<DocumentNode>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub text: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub marks: Vec<Mark>,
}

impl DocumentNode {
    /// Create an empty node of the given type.
    #[must_use]
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attrs: Attrs::new(),
            children: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// Create a document root.
    #[must_use]
    pub fn document(children: Vec<DocumentNode>) -> Self {
        Self::new(DOCUMENT).with_children(children)
    }

    /// Create a text run.
    #[must_use]
    pub fn text_run(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            text: Some(text.into()),
            marks,
            ..Self::new(TEXT)
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<DocumentNode>) -> Self {
        self.children = children;
        self
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Whether this node is a text run.
    pub fn is_text(&self) -> bool {
        self.node_type == TEXT
    }

    /// Whether a mark of the given type applies to this node.
    pub fn has_mark(&self, mark_type: &str) -> bool {
        self.marks.iter().any(|m| m.mark_type == mark_type)
    }

    /// Concatenated text of this node and all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}
