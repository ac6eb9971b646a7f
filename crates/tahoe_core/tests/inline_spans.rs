use tahoe_core::markdown::inline::{link_target_title, WIKI_LINK_SCHEME};
use tahoe_core::markdown::{render_document, resolve_inline, ContentBlock};

#[test]
fn plain_text_is_one_plain_run() {
    let styled = resolve_inline("just words");
    assert_eq!(styled.text, "just words");
    assert_eq!(styled.runs.len(), 1);
    assert!(styled.runs[0].style.is_plain());
}

#[test]
fn emphasis_markers_become_styles() {
    let styled = resolve_inline("a **bold** and *italic* and ~~gone~~ and `code`");
    assert_eq!(styled.text, "a bold and italic and gone and code");

    let bold_at = styled.text.find("bold").unwrap();
    assert!(styled.style_at(bold_at).unwrap().bold);

    let italic_at = styled.text.find("italic").unwrap();
    assert!(styled.style_at(italic_at).unwrap().italic);

    let gone_at = styled.text.find("gone").unwrap();
    assert!(styled.style_at(gone_at).unwrap().strikethrough);

    let code_at = styled.text.find("code").unwrap();
    assert!(styled.style_at(code_at).unwrap().code);

    assert!(styled.style_at(0).unwrap().is_plain());
}

#[test]
fn highlight_markers_are_removed_and_styled() {
    let styled = resolve_inline("keep ==this== in mind");
    assert_eq!(styled.text, "keep this in mind");
    assert_eq!(styled.highlighted(), vec!["this"]);
}

#[test]
fn highlight_inside_code_stays_literal() {
    let styled = resolve_inline("`a ==b== c`");
    assert_eq!(styled.text, "a ==b== c");
    assert!(styled.highlighted().is_empty());
}

#[test]
fn wiki_link_renders_title_with_accent_and_target() {
    let styled = resolve_inline("see [[Road Map]] next");
    assert_eq!(styled.text, "see Road Map next");

    let links = styled.wiki_links();
    assert_eq!(links, vec![("Road Map", "Road Map".to_string())]);

    let at = styled.text.find("Road").unwrap();
    let style = styled.style_at(at).unwrap();
    assert!(style.accent);
    let url = style.link.as_deref().unwrap();
    assert!(url.starts_with(WIKI_LINK_SCHEME));
    assert_eq!(link_target_title(url).as_deref(), Some("Road Map"));
}

#[test]
fn wiki_link_keeps_surrounding_emphasis() {
    let styled = resolve_inline("**[[Bold Link]]**");
    assert_eq!(styled.text, "Bold Link");
    let style = styled.style_at(0).unwrap();
    assert!(style.bold);
    assert!(style.accent);
}

#[test]
fn markdown_link_keeps_destination() {
    let styled = resolve_inline("[docs](https://example.com/docs)");
    assert_eq!(styled.text, "docs");
    let style = styled.style_at(0).unwrap();
    assert_eq!(style.link.as_deref(), Some("https://example.com/docs"));
    assert!(!style.accent);
}

#[test]
fn block_markers_inside_text_stay_literal() {
    let styled = resolve_inline("1. not a list");
    assert_eq!(styled.text, "1. not a list");
}

#[test]
fn render_document_attaches_spans_to_text_blocks() {
    let rendered = render_document("# **Plan**\n```\ncode\n```");
    assert_eq!(rendered.len(), 2);

    let header = rendered[0].spans.as_ref().unwrap();
    assert_eq!(header.text, "Plan");
    assert!(header.style_at(0).unwrap().bold);

    assert!(matches!(rendered[1].block, ContentBlock::Code { .. }));
    assert!(rendered[1].spans.is_none());
}

#[test]
fn private_use_sentinels_in_text_are_not_highlights() {
    let styled = resolve_inline("a\u{E000}b\u{E001}c");
    assert_eq!(styled.text, "a\u{FFFD}b\u{FFFD}c");
    assert!(styled.highlighted().is_empty());
    assert!(styled.runs.iter().all(|run| !run.style.highlight));
}
