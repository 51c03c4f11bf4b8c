//! Span-level parsing of the Markdown dialect

use tome_parser::ast::{Block, FootnoteLabel, LinkId, LinkTarget, Options, Span};
use tome_parser::markdown;

fn parse_spans(input: &str) -> Vec<Span> {
    let blocks = markdown::parser().parse_document(input).content;
    match blocks.into_iter().next() {
        Some(Block::Paragraph { content, .. }) => content,
        other => panic!("Expected paragraph, got {:?}", other),
    }
}

fn em(text: &str) -> Span {
    Span::Emphasized {
        content: vec![Span::text(text)],
        options: Options::new(),
    }
}

#[test]
fn plain_text() {
    assert_eq!(parse_spans("just words\n"), vec![Span::text("just words")]);
}

#[test]
fn emphasis_and_strong() {
    let spans = parse_spans("*em* and **strong**\n");
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0], em("em"));
    assert_eq!(spans[1], Span::text(" and "));
    assert_eq!(
        spans[2],
        Span::Strong {
            content: vec![Span::text("strong")],
            options: Options::new(),
        }
    );
}

#[test]
fn underscore_emphasis() {
    let spans = parse_spans("_em_\n");
    assert_eq!(spans, vec![em("em")]);
}

#[test]
fn nested_emphasis_inside_strong() {
    let spans = parse_spans("**strong with *nested* inside**\n");
    match &spans[0] {
        Span::Strong { content, .. } => {
            assert_eq!(content.len(), 3);
            assert_eq!(content[0], Span::text("strong with "));
            assert_eq!(content[1], em("nested"));
            assert_eq!(content[2], Span::text(" inside"));
        }
        other => panic!("Expected strong, got {:?}", other),
    }
}

#[test]
fn unterminated_emphasis_is_literal_text() {
    let spans = parse_spans("a *dangling start\n");
    assert_eq!(spans, vec![Span::text("a *dangling start")]);
}

#[test]
fn empty_emphasis_is_literal_text() {
    let spans = parse_spans("**\n");
    assert_eq!(spans, vec![Span::text("**")]);
}

#[test]
fn escaped_delimiters_are_literal() {
    let spans = parse_spans("\\*not em\\*\n");
    assert_eq!(spans, vec![Span::text("*not em*")]);
}

#[test]
fn escape_inside_emphasis_stays_literal() {
    let spans = parse_spans("*a \\* b*\n");
    assert_eq!(
        spans,
        vec![Span::Emphasized {
            content: vec![Span::text("a * b")],
            options: Options::new(),
        }]
    );
}

#[test]
fn code_span_is_literal() {
    let spans = parse_spans("`a *literal* span`\n");
    assert_eq!(
        spans,
        vec![Span::Literal {
            content: "a *literal* span".into(),
            options: Options::new(),
        }]
    );
}

#[test]
fn double_backtick_code_span_contains_backtick() {
    let spans = parse_spans("``a ` b``\n");
    assert_eq!(
        spans,
        vec![Span::Literal {
            content: "a ` b".into(),
            options: Options::new(),
        }]
    );
}

#[test]
fn inline_link() {
    let spans = parse_spans("[text](http://example.com \"Title\")\n");
    assert_eq!(
        spans,
        vec![Span::SpanLink {
            content: vec![Span::text("text")],
            target: LinkTarget::External("http://example.com".into()),
            title: Some("Title".into()),
            options: Options::new(),
        }]
    );
}

#[test]
fn inline_link_to_internal_path() {
    let spans = parse_spans("[other](other.md#section)\n");
    assert_eq!(
        spans,
        vec![Span::SpanLink {
            content: vec![Span::text("other")],
            target: LinkTarget::Internal {
                path: "other.md".into(),
                fragment: Some("section".into()),
            },
            title: None,
            options: Options::new(),
        }]
    );
}

#[test]
fn reference_link() {
    let spans = parse_spans("[text][ref]\n");
    assert_eq!(
        spans,
        vec![Span::LinkReference {
            content: vec![Span::text("text")],
            id: LinkId::Named("ref".into()),
            source: "[text][ref]".into(),
            options: Options::new(),
        }]
    );
}

#[test]
fn reference_ids_are_case_insensitive() {
    let spans = parse_spans("[text][Ref]\n");
    match &spans[0] {
        Span::LinkReference { id, .. } => assert_eq!(id, &LinkId::Named("ref".into())),
        other => panic!("Expected link reference, got {:?}", other),
    }
}

#[test]
fn anonymous_reference_link() {
    let spans = parse_spans("[text][]\n");
    match &spans[0] {
        Span::LinkReference { id, .. } => assert_eq!(id, &LinkId::Anonymous),
        other => panic!("Expected link reference, got {:?}", other),
    }
}

#[test]
fn shortcut_reference_uses_its_text() {
    let spans = parse_spans("See [Introduction] here\n");
    match &spans[1] {
        Span::LinkReference { id, source, .. } => {
            assert_eq!(id, &LinkId::Named("introduction".into()));
            assert_eq!(source, "[Introduction]");
        }
        other => panic!("Expected link reference, got {:?}", other),
    }
}

#[test]
fn link_text_is_span_parsed() {
    let spans = parse_spans("[*em* text](http://example.com)\n");
    match &spans[0] {
        Span::SpanLink { content, .. } => {
            assert_eq!(content[0], em("em"));
            assert_eq!(content[1], Span::text(" text"));
        }
        other => panic!("Expected link, got {:?}", other),
    }
}

#[test]
fn inline_image() {
    let spans = parse_spans("![alt text](images/logo.png)\n");
    assert_eq!(
        spans,
        vec![Span::Image {
            alt: "alt text".into(),
            target: LinkTarget::Internal {
                path: "images/logo.png".into(),
                fragment: None,
            },
            title: None,
            options: Options::new(),
        }]
    );
}

#[test]
fn image_reference() {
    let spans = parse_spans("![alt][logo]\n");
    match &spans[0] {
        Span::ImageReference { alt, id, .. } => {
            assert_eq!(alt, "alt");
            assert_eq!(id, &LinkId::Named("logo".into()));
        }
        other => panic!("Expected image reference, got {:?}", other),
    }
}

#[test]
fn footnote_references() {
    let spans = parse_spans("a[^] b[^*] c[^note] d[^7]\n");
    let labels: Vec<&FootnoteLabel> = spans
        .iter()
        .filter_map(|span| match span {
            Span::FootnoteReference { label, .. } => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            &FootnoteLabel::Autonumber,
            &FootnoteLabel::Autosymbol,
            &FootnoteLabel::Named("note".into()),
            &FootnoteLabel::Numeric(7),
        ]
    );
}

#[test]
fn citation_reference() {
    let spans = parse_spans("As shown in [@knuth84].\n");
    match &spans[1] {
        Span::CitationReference { label, source, .. } => {
            assert_eq!(label, "knuth84");
            assert_eq!(source, "[@knuth84]");
        }
        other => panic!("Expected citation reference, got {:?}", other),
    }
}

#[test]
fn adjacent_text_merges_across_failed_matches() {
    // '*' fails to open emphasis here (no closing delimiter), '[' fails to
    // open a link; both must degrade to plain text in one merged node.
    let spans = parse_spans("2 * 3 [not a link\n");
    assert_eq!(spans, vec![Span::text("2 * 3 [not a link")]);
}
