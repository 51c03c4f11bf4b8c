//! Span (inline) elements

use super::message::SystemMessage;
use super::options::Options;
use serde::Serialize;

/// Resolved destination of a link or image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkTarget {
    /// An absolute URI pointing outside the document tree
    External(String),
    /// A target inside the tree: a path relative to the referring document
    /// plus an optional fragment
    Internal {
        path: String,
        fragment: Option<String>,
    },
}

/// Identifier of an unresolved link or image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkId {
    /// Reference by id; ids are matched case-insensitively, so this is
    /// stored lowercased
    Named(String),
    /// Anonymous reference, bound to the next anonymous target in document
    /// order
    Anonymous,
}

impl LinkId {
    pub fn named(id: &str) -> Self {
        LinkId::Named(id.to_lowercase())
    }
}

/// Label of a footnote definition or reference, determining its selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FootnoteLabel {
    /// `[^]` - numbered in order of occurrence
    Autonumber,
    /// `[^*]` - assigned a symbol in order of occurrence
    Autosymbol,
    /// `[^name]`
    Named(String),
    /// `[^3]` - explicit number
    Numeric(u32),
}

/// Inline elements
///
/// Reference variants are transient and must not survive the rewrite phase;
/// each carries the original source text so an unresolved reference can fall
/// back to something recognizable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Span {
    Text {
        content: String,
        options: Options,
    },
    Emphasized {
        content: Vec<Span>,
        options: Options,
    },
    Strong {
        content: Vec<Span>,
        options: Options,
    },
    Literal {
        content: String,
        options: Options,
    },
    SpanLink {
        content: Vec<Span>,
        target: LinkTarget,
        title: Option<String>,
        options: Options,
    },
    Image {
        alt: String,
        target: LinkTarget,
        title: Option<String>,
        options: Options,
    },
    /// Resolved footnote marker pointing at its definition
    FootnoteLink {
        ref_id: String,
        label: String,
        options: Options,
    },
    /// Resolved citation marker
    CitationLink {
        ref_id: String,
        label: String,
        options: Options,
    },
    LinkReference {
        content: Vec<Span>,
        id: LinkId,
        source: String,
        options: Options,
    },
    ImageReference {
        alt: String,
        id: LinkId,
        source: String,
        options: Options,
    },
    FootnoteReference {
        label: FootnoteLabel,
        source: String,
        options: Options,
    },
    CitationReference {
        label: String,
        source: String,
        options: Options,
    },
    /// A recoverable problem wrapped around fallback content
    InvalidSpan {
        message: SystemMessage,
        fallback: Box<Span>,
    },
    /// A bare message marker, rendered visibly in debug mode
    MessageSpan {
        message: SystemMessage,
        options: Options,
    },
}

impl Span {
    pub fn text(content: impl Into<String>) -> Self {
        Span::Text {
            content: content.into(),
            options: Options::new(),
        }
    }

    pub fn options(&self) -> Option<&Options> {
        match self {
            Span::Text { options, .. }
            | Span::Emphasized { options, .. }
            | Span::Strong { options, .. }
            | Span::Literal { options, .. }
            | Span::SpanLink { options, .. }
            | Span::Image { options, .. }
            | Span::FootnoteLink { options, .. }
            | Span::CitationLink { options, .. }
            | Span::LinkReference { options, .. }
            | Span::ImageReference { options, .. }
            | Span::FootnoteReference { options, .. }
            | Span::CitationReference { options, .. }
            | Span::MessageSpan { options, .. } => Some(options),
            Span::InvalidSpan { .. } => None,
        }
    }

    /// Whether this span still awaits resolution
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Span::LinkReference { .. }
                | Span::ImageReference { .. }
                | Span::FootnoteReference { .. }
                | Span::CitationReference { .. }
        )
    }

    /// Plain-text rendering of this span and its children, used for header
    /// slugs and headline matching
    pub fn extract_text(&self) -> String {
        match self {
            Span::Text { content, .. } | Span::Literal { content, .. } => content.clone(),
            Span::Emphasized { content, .. }
            | Span::Strong { content, .. }
            | Span::SpanLink { content, .. }
            | Span::LinkReference { content, .. } => extract_text(content),
            Span::Image { alt, .. } | Span::ImageReference { alt, .. } => alt.clone(),
            Span::InvalidSpan { fallback, .. } => fallback.extract_text(),
            _ => String::new(),
        }
    }
}

/// Plain-text rendering of a span sequence
pub fn extract_text(spans: &[Span]) -> String {
    spans.iter().map(Span::extract_text).collect()
}
