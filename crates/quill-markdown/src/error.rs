//! Error types.

/// Invalid token-to-node mapping table.
///
/// Raised by [`MappingTable::validate`](crate::MappingTable::validate). A table
/// that fails validation is a programming error, not a content error: check it
/// once at startup.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The parser needs this node type for its own structure.
    #[error("mapping table has no text block entry producing `{0}` nodes")]
    MissingNodeType(&'static str),

    /// A node type the parser can produce has no way back to markdown.
    #[error("token `{kind}` maps to node `{node_type}`, which has no serializer rule")]
    UnserializableNode {
        kind: &'static str,
        node_type: &'static str,
    },

    /// A mark type the parser can produce has no way back to markdown.
    #[error("token `{kind}` maps to mark `{mark_type}`, which has no serializer rule")]
    UnserializableMark {
        kind: &'static str,
        mark_type: &'static str,
    },
}
