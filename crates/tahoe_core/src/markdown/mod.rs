//! Markdown document pipeline.
//!
//! raw text -> [`blocks::parse_blocks`] -> [`inline::resolve_inline`] per block.
//! Task extraction works on raw text directly and shares the task-line grammar
//! with the block parser.

pub mod blocks;
pub mod inline;
pub mod tasks;

use once_cell::sync::Lazy;
use regex::Regex;

pub use blocks::{parse_blocks, ContentBlock};
pub use inline::{resolve_inline, InlineStyle, StyledRun, StyledText};

/// Non-greedy `[[Title]]` matcher shared by the inline resolver and the link
/// graph.
pub(crate) static WIKI_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid wiki link regex"));

/// A parsed block together with its styled inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub block: ContentBlock,
    /// `None` for blocks without inline text (code, images, rules, bare
    /// callout openers).
    pub spans: Option<StyledText>,
}

/// Runs the full pipeline over one note's content.
pub fn render_document(text: &str) -> Vec<RenderedBlock> {
    parse_blocks(text)
        .into_iter()
        .map(|block| {
            let spans = block.inline_text().map(resolve_inline);
            RenderedBlock { block, spans }
        })
        .collect()
}

/// Returns the first `limit` characters of content, for list previews.
pub fn content_preview(content: &str, limit: usize) -> String {
    content.chars().take(limit).collect()
}
