//! Line-oriented markdown block parser.
//!
//! # Responsibility
//! - Turn raw note text into an ordered sequence of [`ContentBlock`]s in one
//!   left-to-right pass.
//!
//! # Invariants
//! - Blank lines never produce a block.
//! - Each non-blank line outside a fence yields exactly one block, except
//!   callout continuation lines, which fold into their callout.
//! - A fenced region yields exactly one `Code` block, emitted at its closing
//!   fence (or at end of input when the fence is never closed).

use crate::markdown::tasks::parse_task_line;
use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";
const MAX_HEADER_LEVEL: usize = 6;

static WIKI_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[\[([^\]]+)\]\]$").expect("valid wiki image regex"));
static MARKDOWN_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^!\[([^\]]*)\](?:\(([^)]*)\))?$").expect("valid markdown image regex")
});

/// One structurally classified unit of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Header {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    ListItem {
        text: String,
    },
    Image {
        path: String,
    },
    Code {
        /// Declared language tag; `None` for a bare fence.
        language: Option<String>,
        text: String,
    },
    Callout {
        /// Type as written between `[!` and `]`, e.g. `NOTE`.
        kind: String,
        title: Option<String>,
        /// Continuation lines joined by `\n`; empty when the callout has only
        /// its opening line.
        text: String,
    },
    Quote {
        text: String,
    },
    Task {
        done: bool,
        text: String,
    },
    HorizontalRule,
    Footnote {
        id: String,
        text: String,
    },
}

impl ContentBlock {
    /// Returns the text an inline renderer should style, if the block has any.
    pub fn inline_text(&self) -> Option<&str> {
        match self {
            Self::Header { text, .. }
            | Self::Paragraph { text }
            | Self::ListItem { text }
            | Self::Quote { text }
            | Self::Task { text, .. }
            | Self::Footnote { text, .. } => Some(text),
            Self::Callout { text, .. } if !text.is_empty() => Some(text),
            Self::Callout { .. }
            | Self::Image { .. }
            | Self::Code { .. }
            | Self::HorizontalRule => None,
        }
    }
}

/// Parses raw markdown into blocks.
pub fn parse_blocks(text: &str) -> Vec<ContentBlock> {
    let mut parser = BlockParser::default();
    for raw_line in text.split('\n') {
        parser.push_line(raw_line.strip_suffix('\r').unwrap_or(raw_line));
    }
    parser.finish()
}

#[derive(Default)]
struct BlockParser {
    blocks: Vec<ContentBlock>,
    fence: Option<OpenFence>,
    callout: Option<OpenCallout>,
}

struct OpenFence {
    language: Option<String>,
    lines: Vec<String>,
}

struct OpenCallout {
    kind: String,
    title: Option<String>,
    body: Vec<String>,
}

impl BlockParser {
    fn push_line(&mut self, line: &str) {
        let trimmed = line.trim();

        if self.fence.is_some() {
            if trimmed.starts_with(FENCE) {
                self.close_fence();
            } else if let Some(fence) = self.fence.as_mut() {
                fence.lines.push(line.to_string());
            }
            return;
        }

        if let Some(rest) = trimmed.strip_prefix(FENCE) {
            self.close_callout();
            self.fence = Some(OpenFence {
                language: non_empty(rest.trim()),
                lines: Vec::new(),
            });
            return;
        }

        if self.callout.is_some() {
            if let Some(rest) = trimmed.strip_prefix('>') {
                if parse_callout_opener(rest).is_none() {
                    if let Some(callout) = self.callout.as_mut() {
                        callout.body.push(strip_one_space(rest).to_string());
                    }
                    return;
                }
            }
            self.close_callout();
        }

        if trimmed.is_empty() {
            return;
        }

        let block = if is_horizontal_rule(trimmed) {
            ContentBlock::HorizontalRule
        } else if let Some(task) = parse_task_line(trimmed) {
            ContentBlock::Task {
                done: task.done,
                text: task.text.to_string(),
            }
        } else if let Some(text) = list_item_text(trimmed) {
            ContentBlock::ListItem {
                text: text.to_string(),
            }
        } else if let Some((id, text)) = parse_footnote(trimmed) {
            ContentBlock::Footnote {
                id: id.to_string(),
                text: text.to_string(),
            }
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            if let Some((kind, title)) = parse_callout_opener(rest) {
                self.callout = Some(OpenCallout {
                    kind: kind.to_string(),
                    title: non_empty(title),
                    body: Vec::new(),
                });
                return;
            }
            ContentBlock::Quote {
                text: strip_one_space(rest).to_string(),
            }
        } else if let Some((level, text)) = parse_header(trimmed) {
            ContentBlock::Header {
                level,
                text: text.to_string(),
            }
        } else if let Some(path) = parse_image(trimmed) {
            ContentBlock::Image { path }
        } else {
            ContentBlock::Paragraph {
                text: trimmed.to_string(),
            }
        };
        self.blocks.push(block);
    }

    fn close_fence(&mut self) {
        if let Some(fence) = self.fence.take() {
            let body = fence.lines.join("\n");
            self.blocks.push(ContentBlock::Code {
                language: fence.language,
                text: body.trim_end_matches('\n').to_string(),
            });
        }
    }

    fn close_callout(&mut self) {
        if let Some(callout) = self.callout.take() {
            self.blocks.push(ContentBlock::Callout {
                kind: callout.kind,
                title: callout.title,
                text: callout.body.join("\n").trim_end_matches('\n').to_string(),
            });
        }
    }

    fn finish(mut self) -> Vec<ContentBlock> {
        self.close_callout();
        self.close_fence();
        self.blocks
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn strip_one_space(value: &str) -> &str {
    value.strip_prefix(' ').unwrap_or(value)
}

/// Three or more of one of `-`, `*`, `_`, optionally separated by spaces.
fn is_horizontal_rule(trimmed: &str) -> bool {
    let mut marker = None;
    let mut count = 0;
    for ch in trimmed.chars() {
        match ch {
            ' ' | '\t' => continue,
            '-' | '*' | '_' => {
                if marker.is_some_and(|existing| existing != ch) {
                    return false;
                }
                marker = Some(ch);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

fn list_item_text(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with("- [") {
        return None;
    }
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim_start)
}

/// `[^id]: text`, split on the first `]:`.
fn parse_footnote(trimmed: &str) -> Option<(&str, &str)> {
    let rest = trimmed.strip_prefix("[^")?;
    let (id, text) = rest.split_once("]:")?;
    if id.is_empty() {
        return None;
    }
    Some((id, text.trim()))
}

/// Parses the part after `>` as `[!TYPE] optional-title`.
fn parse_callout_opener(after_marker: &str) -> Option<(&str, &str)> {
    let rest = after_marker.trim_start().strip_prefix("[!")?;
    let (kind, title) = rest.split_once(']')?;
    if kind.trim().is_empty() {
        return None;
    }
    // `[!TIP]-` / `[!TIP]+` fold markers carry no title text.
    let title = title.trim_start_matches(['-', '+']).trim();
    Some((kind.trim(), title))
}

fn parse_header(trimmed: &str) -> Option<(u8, &str)> {
    let level = trimmed.chars().take_while(|ch| *ch == '#').count();
    if level == 0 || level > MAX_HEADER_LEVEL {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level as u8, rest.trim()))
}

fn parse_image(trimmed: &str) -> Option<String> {
    if let Some(caps) = WIKI_IMAGE_RE.captures(trimmed) {
        return non_empty(caps[1].trim());
    }
    let caps = MARKDOWN_IMAGE_RE.captures(trimmed)?;
    let target = caps
        .get(2)
        .and_then(|m| m.as_str().split_whitespace().next())
        .unwrap_or("");
    if !target.is_empty() {
        return Some(target.to_string());
    }
    non_empty(caps[1].trim())
}
