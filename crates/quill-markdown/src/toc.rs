//! Table of contents extraction.

use crate::slug::{Slugger, heading_text_at};
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::util::heading_level_from_tag;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Anchor ID for linking.
    pub id: String,
    /// Heading text.
    pub text: String,
    /// Heading level (1-6).
    pub level: u8,
}

/// Extract the table of contents of a markdown document.
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    toc_from_tokens(&Tokenizer::new().tokenize(markdown))
}

/// Extract the table of contents from a token stream.
pub fn toc_from_tokens(tokens: &[Token]) -> Vec<TocEntry> {
    let mut slugger = Slugger::new();
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.kind == "heading_open")
        .map(|(index, _)| heading_entry(&mut slugger, tokens, index))
        .collect()
}

/// TOC entry for the heading opened at `tokens[open]`.
///
/// The HTML renderer calls this for every heading too, which is what keeps
/// rendered ids and TOC ids identical.
pub(crate) fn heading_entry(slugger: &mut Slugger, tokens: &[Token], open: usize) -> TocEntry {
    let text = heading_text_at(tokens, open);
    TocEntry {
        id: slugger.slug(&text),
        level: heading_level_from_tag(tokens[open].tag),
        text,
    }
}
