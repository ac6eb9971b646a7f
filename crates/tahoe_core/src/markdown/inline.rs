//! Inline span resolution for block text.
//!
//! # Responsibility
//! - Render inline markdown (emphasis, strong, strikethrough, code spans,
//!   links) into visible text plus styled byte-range runs.
//! - Layer `==highlight==` marks and `[[wiki links]]` on top of the rendered
//!   text.
//!
//! # Invariants
//! - Runs are contiguous, non-overlapping and cover `text` exactly.
//! - Highlight markers inside backtick code spans are left as literal text.
//! - Wiki links are replaced right-to-left so earlier indices stay valid.

use crate::markdown::WIKI_LINK_RE;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;

/// URL prefix carried by wiki-link annotations.
pub const WIKI_LINK_SCHEME: &str = "tahoe://note/";

// Private-use code points stand in for `==` while the text goes through the
// markdown renderer, so highlight regions land in rendered index space.
const HIGHLIGHT_START: char = '\u{E000}';
const HIGHLIGHT_END: char = '\u{E001}';

/// Visual attributes applied to one run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub highlight: bool,
    /// Link destination. Wiki links use [`WIKI_LINK_SCHEME`].
    pub link: Option<String>,
    /// Drawn with the configured accent color.
    pub accent: bool,
}

impl InlineStyle {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A styled byte range of [`StyledText::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub range: Range<usize>,
    pub style: InlineStyle,
}

/// Rendered block text with style runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    pub text: String,
    pub runs: Vec<StyledRun>,
}

impl StyledText {
    /// Returns `(visible text, target title)` for every wiki link, in order.
    pub fn wiki_links(&self) -> Vec<(&str, String)> {
        self.runs
            .iter()
            .filter_map(|run| {
                let title = link_target_title(run.style.link.as_deref()?)?;
                Some((&self.text[run.range.clone()], title))
            })
            .collect()
    }

    /// Returns the visible text of every highlighted run, in order.
    pub fn highlighted(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|run| run.style.highlight)
            .map(|run| &self.text[run.range.clone()])
            .collect()
    }

    /// Returns the style in effect at a byte offset.
    pub fn style_at(&self, offset: usize) -> Option<&InlineStyle> {
        self.runs
            .iter()
            .find(|run| run.range.contains(&offset))
            .map(|run| &run.style)
    }
}

/// Builds the link target for a wiki-link title.
pub fn wiki_link_url(title: &str) -> String {
    format!("{WIKI_LINK_SCHEME}{}", urlencoding::encode(title))
}

/// Decodes a wiki-link target back into the note title it names.
pub fn link_target_title(url: &str) -> Option<String> {
    let encoded = url.strip_prefix(WIKI_LINK_SCHEME)?;
    urlencoding::decode(encoded).ok().map(|title| title.into_owned())
}

/// Resolves one block's raw text into styled text.
pub fn resolve_inline(raw: &str) -> StyledText {
    let marked = mark_highlights(raw);
    let escaped = marked
        .split('\n')
        .map(escape_block_start)
        .collect::<Vec<_>>()
        .join("\n");

    let mut renderer = InlineRenderer::default();
    renderer.render(&escaped);
    let mut chars = renderer.chars;
    let mut links = renderer.links;
    apply_wiki_links(&mut chars, &mut links);
    coalesce(&chars, &links)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CharStyle {
    bold: bool,
    italic: bool,
    code: bool,
    strikethrough: bool,
    highlight: bool,
    link: Option<usize>,
    accent: bool,
}

#[derive(Default)]
struct InlineRenderer {
    chars: Vec<(char, CharStyle)>,
    links: Vec<String>,
    strong_depth: usize,
    emphasis_depth: usize,
    strike_depth: usize,
    link_stack: Vec<usize>,
    highlight: bool,
}

impl InlineRenderer {
    fn render(&mut self, source: &str) {
        let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
        for event in parser {
            match event {
                Event::Start(Tag::Strong) => self.strong_depth += 1,
                Event::End(TagEnd::Strong) => {
                    self.strong_depth = self.strong_depth.saturating_sub(1)
                }
                Event::Start(Tag::Emphasis) => self.emphasis_depth += 1,
                Event::End(TagEnd::Emphasis) => {
                    self.emphasis_depth = self.emphasis_depth.saturating_sub(1)
                }
                Event::Start(Tag::Strikethrough) => self.strike_depth += 1,
                Event::End(TagEnd::Strikethrough) => {
                    self.strike_depth = self.strike_depth.saturating_sub(1)
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    self.links.push(dest_url.to_string());
                    self.link_stack.push(self.links.len() - 1);
                }
                Event::End(TagEnd::Link) => {
                    self.link_stack.pop();
                }
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::BlockQuote
                    | TagEnd::CodeBlock,
                ) => self.break_line(),
                Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                    self.push_text(&text, false)
                }
                Event::Code(text) => self.push_text(&text, true),
                Event::FootnoteReference(label) => {
                    self.push_text(&format!("[^{label}]"), false)
                }
                Event::SoftBreak | Event::HardBreak => self.push_text("\n", false),
                _ => {}
            }
        }
        while self.chars.last().is_some_and(|(ch, _)| *ch == '\n') {
            self.chars.pop();
        }
    }

    fn break_line(&mut self) {
        if self.chars.last().is_some_and(|(ch, _)| *ch != '\n') {
            self.push_text("\n", false);
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        for ch in text.chars() {
            match ch {
                HIGHLIGHT_START => self.highlight = true,
                HIGHLIGHT_END => self.highlight = false,
                _ => {
                    let style = CharStyle {
                        bold: self.strong_depth > 0,
                        italic: self.emphasis_depth > 0,
                        code,
                        strikethrough: self.strike_depth > 0,
                        highlight: self.highlight,
                        link: self.link_stack.last().copied(),
                        accent: false,
                    };
                    self.chars.push((ch, style));
                }
            }
        }
    }
}

/// Replaces `==text==` with sentinel-wrapped text. Unclosed markers and markers
/// inside backtick code spans stay literal. Sentinel code points already present
/// in `raw` become U+FFFD so they cannot toggle a highlight.
fn mark_highlights(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut in_code = false;
    let mut open = false;

    while let Some(ch) = rest.chars().next() {
        if ch == '`' {
            in_code = !in_code;
        } else if !in_code && rest.starts_with("==") {
            if open {
                out.push(HIGHLIGHT_END);
                open = false;
                rest = &rest[2..];
                continue;
            }
            if has_closing_marker(&rest[2..]) {
                out.push(HIGHLIGHT_START);
                open = true;
                rest = &rest[2..];
                continue;
            }
        }
        out.push(match ch {
            HIGHLIGHT_START | HIGHLIGHT_END => char::REPLACEMENT_CHARACTER,
            other => other,
        });
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn has_closing_marker(after_open: &str) -> bool {
    match after_open.find("==") {
        Some(0) | None => false,
        Some(index) => !after_open[..index].contains('`'),
    }
}

/// Escapes a leading block marker so the renderer keeps the line inline.
fn escape_block_start(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    // Four or more columns of indent would turn the line into a code block.
    let indent = if indent_width(indent) >= 4 { "" } else { indent };

    match block_marker_offset(trimmed) {
        Some(offset) => format!("{indent}{}\\{}", &trimmed[..offset], &trimmed[offset..]),
        None => format!("{indent}{trimmed}"),
    }
}

fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|ch| if ch == '\t' { 4 } else { 1 })
        .sum()
}

/// Byte offset where a backslash neutralizes the line's block marker.
fn block_marker_offset(trimmed: &str) -> Option<usize> {
    let first = trimmed.chars().next()?;
    match first {
        '#' => {
            let hashes = trimmed.chars().take_while(|ch| *ch == '#').count();
            let opens_header = hashes <= 6
                && trimmed[hashes..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace);
            opens_header.then_some(0)
        }
        '>' => Some(0),
        '-' | '*' | '+' | '_' | '=' => {
            let list_marker = trimmed.chars().nth(1).map_or(true, char::is_whitespace);
            let rule = trimmed.chars().all(|ch| ch == first || ch == ' ');
            (list_marker || rule).then_some(0)
        }
        '0'..='9' => {
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            let after = &trimmed[digits..];
            let ordered_marker = digits <= 9
                && (after.starts_with(". ")
                    || after.starts_with(") ")
                    || after == "."
                    || after == ")");
            ordered_marker.then_some(digits)
        }
        _ => None,
    }
}

fn apply_wiki_links(chars: &mut Vec<(char, CharStyle)>, links: &mut Vec<String>) {
    let text: String = chars.iter().map(|(ch, _)| *ch).collect();
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0; text.len() + 1];
        for (char_index, (byte_index, _)) in text.char_indices().enumerate() {
            map[byte_index] = char_index;
        }
        map[text.len()] = chars.len();
        map
    };

    let matches: Vec<(Range<usize>, Range<usize>, String)> = WIKI_LINK_RE
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(1)?;
            if title.as_str().trim().is_empty() {
                return None;
            }
            Some((
                byte_to_char[whole.start()]..byte_to_char[whole.end()],
                byte_to_char[title.start()]..byte_to_char[title.end()],
                title.as_str().to_string(),
            ))
        })
        .collect();

    for (whole, inner, title) in matches.into_iter().rev() {
        links.push(wiki_link_url(&title));
        let link_index = links.len() - 1;
        let replacement: Vec<(char, CharStyle)> = chars[inner]
            .iter()
            .map(|(ch, style)| {
                (
                    *ch,
                    CharStyle {
                        link: Some(link_index),
                        accent: true,
                        ..*style
                    },
                )
            })
            .collect();
        let _replaced: Vec<_> = chars.splice(whole, replacement).collect();
    }
}

fn coalesce(chars: &[(char, CharStyle)], links: &[String]) -> StyledText {
    let mut text = String::new();
    let mut runs: Vec<StyledRun> = Vec::new();
    let mut current: Option<(usize, CharStyle)> = None;

    for (ch, style) in chars {
        match current {
            Some((_, active)) if active == *style => {}
            Some((start, active)) => {
                runs.push(to_run(start..text.len(), active, links));
                current = Some((text.len(), *style));
            }
            None => current = Some((text.len(), *style)),
        }
        text.push(*ch);
    }
    if let Some((start, active)) = current {
        runs.push(to_run(start..text.len(), active, links));
    }

    StyledText { text, runs }
}

fn to_run(range: Range<usize>, style: CharStyle, links: &[String]) -> StyledRun {
    StyledRun {
        range,
        style: InlineStyle {
            bold: style.bold,
            italic: style.italic,
            code: style.code,
            strikethrough: style.strikethrough,
            highlight: style.highlight,
            link: style.link.and_then(|index| links.get(index).cloned()),
            accent: style.accent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_block_start, link_target_title, mark_highlights, wiki_link_url};
    use super::{HIGHLIGHT_END, HIGHLIGHT_START};

    #[test]
    fn mark_highlights_skips_code_spans_and_unclosed_markers() {
        assert_eq!(
            mark_highlights("a ==b== c"),
            format!("a {HIGHLIGHT_START}b{HIGHLIGHT_END} c")
        );
        assert_eq!(mark_highlights("`x ==y== z`"), "`x ==y== z`");
        assert_eq!(mark_highlights("a == b"), "a == b");
        assert_eq!(mark_highlights("===="), "====");
    }

    #[test]
    fn mark_highlights_neutralizes_literal_sentinels() {
        let marked = mark_highlights(&format!("a{HIGHLIGHT_START}b{HIGHLIGHT_END}c"));
        assert_eq!(marked, "a\u{FFFD}b\u{FFFD}c");
    }

    #[test]
    fn escape_block_start_keeps_lines_inline() {
        assert_eq!(escape_block_start("# not a header"), "\\# not a header");
        assert_eq!(escape_block_start("1. first"), "1\\. first");
        assert_eq!(escape_block_start("- item"), "\\- item");
        assert_eq!(escape_block_start("*emphasis*"), "*emphasis*");
        assert_eq!(escape_block_start("#tag"), "#tag");
        assert_eq!(escape_block_start("    indented"), "indented");
    }

    #[test]
    fn wiki_link_url_round_trips_title() {
        let url = wiki_link_url("Road map / 2026");
        assert!(url.starts_with("tahoe://note/"));
        assert!(!url.contains(' '));
        assert_eq!(link_target_title(&url).as_deref(), Some("Road map / 2026"));
        assert_eq!(link_target_title("https://example.com"), None);
    }
}
