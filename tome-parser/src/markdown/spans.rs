//! Markdown span parsers
//!
//! Registration order is the precedence contract: escaped characters come
//! first so no other parser ever sees an escaped delimiter, doubled
//! delimiters (strong, double-backtick code) are registered before their
//! single-character forms, and footnote/citation references claim their `[`
//! prefix before the general link parser does.

use crate::ast::{FootnoteLabel, LinkId, LinkTarget, Options, Span};
use crate::orchestrator::RecursiveParsers;
use crate::parse::text::{delimited_by, literal, take_while, ws};
use crate::parse::{success, Parser};
use crate::registry::SpanParserSpec;

pub fn all(rec: &RecursiveParsers) -> Vec<SpanParserSpec> {
    vec![
        SpanParserSpec::new(escaped_text(rec)),
        SpanParserSpec::new(code_span("``")),
        SpanParserSpec::new(code_span("`")),
        SpanParserSpec::new(strong(rec)),
        SpanParserSpec::new(emphasis(rec)),
        SpanParserSpec::new(image(rec)),
        SpanParserSpec::new(footnote_reference()),
        SpanParserSpec::new(citation_reference()),
        SpanParserSpec::new(link(rec)),
    ]
}

/// An escaped character becomes literal text
fn escaped_text(rec: &RecursiveParsers) -> Parser<Span> {
    rec.escaped_char().map(|ch| Span::text(ch.to_string()))
}

/// Code spans are literal: no escapes, no nested markup
fn code_span(delimiter: &'static str) -> Parser<Span> {
    literal(delimiter)
        .skip_then(delimited_by(delimiter).nonempty().parser())
        .map(|content| Span::Literal {
            content,
            options: Options::new(),
        })
}

/// `**strong**` / `__strong__`
fn strong(rec: &RecursiveParsers) -> Parser<Span> {
    let rec = rec.clone();
    enclosed_in("**", &rec)
        .or(enclosed_in("__", &rec))
        .map(move |inner| Span::Strong {
            content: rec.parse_spans(&inner),
            options: Options::new(),
        })
}

/// `*emphasized*` / `_emphasized_`
fn emphasis(rec: &RecursiveParsers) -> Parser<Span> {
    let rec = rec.clone();
    enclosed_in("*", &rec)
        .or(enclosed_in("_", &rec))
        .map(move |inner| Span::Emphasized {
            content: rec.parse_spans(&inner),
            options: Options::new(),
        })
}

/// Raw text enclosed in a symmetric delimiter pair; escapes are preserved
/// for the recursive span pass over the content
fn enclosed_in(delimiter: &'static str, rec: &RecursiveParsers) -> Parser<String> {
    literal(delimiter).skip_then(
        delimited_by(delimiter)
            .nonempty()
            .with_escape_preserved(rec.escaped_char())
            .parser(),
    )
}

/// What follows the closing bracket of link or image text
#[derive(Debug, Clone)]
enum LinkSuffix {
    Inline { url: String, title: Option<String> },
    Reference(LinkId),
    Shortcut,
}

fn link_suffix() -> Parser<LinkSuffix> {
    let url = take_while(|ch| ch != ')' && ch != ' ' && ch != '\t' && ch != '\n');
    let title = ws()
        .skip_then(literal("\""))
        .skip_then(delimited_by("\"").parser());
    let inline = literal("(")
        .skip_then(ws())
        .skip_then(url)
        .then(title.opt())
        .then_skip(ws())
        .then_skip(literal(")"))
        .map(|(url, title)| LinkSuffix::Inline { url, title });

    let reference = literal("[")
        .skip_then(take_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]"))
        .map(|id| {
            if id.trim().is_empty() {
                LinkSuffix::Reference(LinkId::Anonymous)
            } else {
                LinkSuffix::Reference(LinkId::named(id.trim()))
            }
        });

    inline.or(reference).or(success(LinkSuffix::Shortcut))
}

/// Classify a parsed URI: absolute URIs stay external, everything else is a
/// tree-internal target whose path the resolver completes
pub fn uri_target(uri: &str) -> LinkTarget {
    if uri.contains("://") || uri.starts_with("mailto:") {
        LinkTarget::External(uri.to_string())
    } else {
        let (path, fragment) = match uri.split_once('#') {
            Some((path, fragment)) => (path.to_string(), Some(fragment.to_string())),
            None => (uri.to_string(), None),
        };
        LinkTarget::Internal { path, fragment }
    }
}

/// `[text](url "title")`, `[text][id]`, `[text][]`, `[text]`
fn link(rec: &RecursiveParsers) -> Parser<Span> {
    let rec = rec.clone();
    let text = literal("[").skip_then(
        delimited_by("]")
            .with_escape_preserved(rec.escaped_char())
            .parser(),
    );
    text.then(link_suffix())
        .sourced()
        .map(move |((text, suffix), source)| {
            let content = rec.parse_spans(&text);
            match suffix {
                LinkSuffix::Inline { url, title } => Span::SpanLink {
                    content,
                    target: uri_target(&url),
                    title,
                    options: Options::new(),
                },
                LinkSuffix::Reference(id) => Span::LinkReference {
                    content,
                    id,
                    source,
                    options: Options::new(),
                },
                LinkSuffix::Shortcut => Span::LinkReference {
                    content,
                    id: LinkId::named(text.trim()),
                    source,
                    options: Options::new(),
                },
            }
        })
}

/// `![alt](url "title")`, `![alt][id]`, `![alt][]`, `![alt]`
fn image(rec: &RecursiveParsers) -> Parser<Span> {
    let alt = literal("![").skip_then(
        delimited_by("]")
            .with_escape(rec.escaped_char())
            .parser(),
    );
    alt.then(link_suffix())
        .sourced()
        .map(|((alt, suffix), source)| match suffix {
            LinkSuffix::Inline { url, title } => Span::Image {
                alt,
                target: uri_target(&url),
                title,
                options: Options::new(),
            },
            LinkSuffix::Reference(id) => Span::ImageReference {
                alt,
                id,
                source,
                options: Options::new(),
            },
            LinkSuffix::Shortcut => {
                let id = LinkId::named(alt.trim());
                Span::ImageReference {
                    alt,
                    id,
                    source,
                    options: Options::new(),
                }
            }
        })
}

/// Parse a footnote label body: `` `` (autonumber), `*` (autosymbol), a
/// number, or a name
pub fn footnote_label(label: &str) -> FootnoteLabel {
    let label = label.trim();
    if label.is_empty() {
        FootnoteLabel::Autonumber
    } else if label == "*" {
        FootnoteLabel::Autosymbol
    } else if let Ok(number) = label.parse::<u32>() {
        FootnoteLabel::Numeric(number)
    } else {
        FootnoteLabel::Named(label.to_lowercase())
    }
}

/// `[^name]`, `[^]`, `[^*]`, `[^3]`
fn footnote_reference() -> Parser<Span> {
    literal("[^")
        .skip_then(take_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]"))
        .sourced()
        .map(|(label, source)| Span::FootnoteReference {
            label: footnote_label(&label),
            source,
            options: Options::new(),
        })
}

/// `[@label]`
fn citation_reference() -> Parser<Span> {
    literal("[@")
        .skip_then(take_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]"))
        .sourced()
        .map(|(label, source)| Span::CitationReference {
            label: label.trim().to_lowercase(),
            source,
            options: Options::new(),
        })
}
