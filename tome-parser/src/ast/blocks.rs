//! Block elements

use super::message::SystemMessage;
use super::options::Options;
use super::spans::{extract_text, FootnoteLabel, Span};
use serde::Serialize;

/// A header with its level and inline title content
///
/// Kept as a named struct because sections embed it alongside their own
/// content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub level: u32,
    pub content: Vec<Span>,
    pub options: Options,
}

impl Header {
    pub fn new(level: u32, content: Vec<Span>) -> Self {
        Self {
            level,
            content,
            options: Options::new(),
        }
    }

    /// Plain-text title, used for slugs and headline matching
    pub fn text(&self) -> String {
        extract_text(&self.content)
    }
}

/// One item of a bullet or enumerated list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub content: Vec<Block>,
    pub options: Options,
}

impl ListItem {
    pub fn new(content: Vec<Block>) -> Self {
        Self {
            content,
            options: Options::new(),
        }
    }
}

/// Block elements
///
/// `LinkDefinition`, `FootnoteDefinition` and `Citation` define targets for
/// the reference resolver; link definitions are removed entirely during
/// rewriting while footnotes and citations are stamped with their final ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Paragraph {
        content: Vec<Span>,
        options: Options,
    },
    Header(Header),
    /// A header grouped with its subordinate content by the section builder
    Section {
        header: Header,
        content: Vec<Block>,
        options: Options,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
        options: Options,
    },
    QuotedBlock {
        content: Vec<Block>,
        options: Options,
    },
    BulletList {
        items: Vec<ListItem>,
        options: Options,
    },
    EnumList {
        items: Vec<ListItem>,
        start: u32,
        options: Options,
    },
    Rule {
        options: Options,
    },
    /// `[id]: url "title"` - target definition, removed by the resolver.
    /// An absent id marks an anonymous target bound by position.
    LinkDefinition {
        id: Option<String>,
        url: String,
        title: Option<String>,
        options: Options,
    },
    FootnoteDefinition {
        label: FootnoteLabel,
        content: Vec<Block>,
        options: Options,
    },
    /// Resolved footnote with its rendered label
    Footnote {
        label: String,
        content: Vec<Block>,
        options: Options,
    },
    Citation {
        label: String,
        content: Vec<Block>,
        options: Options,
    },
    InvalidBlock {
        message: SystemMessage,
        fallback: Box<Block>,
    },
    /// A flat sequence without semantics of its own, useful when one source
    /// construct expands to several blocks
    BlockSequence {
        content: Vec<Block>,
        options: Options,
    },
    /// Raw output text passed through untouched, e.g. the literal parts of
    /// a merged template
    RawContent {
        text: String,
        options: Options,
    },
    /// Marks document content inserted into a template
    EmbeddedRoot {
        content: Vec<Block>,
        options: Options,
    },
}

impl Block {
    pub fn paragraph(content: Vec<Span>) -> Self {
        Block::Paragraph {
            content,
            options: Options::new(),
        }
    }

    pub fn options(&self) -> Option<&Options> {
        match self {
            Block::Paragraph { options, .. }
            | Block::Section { options, .. }
            | Block::CodeBlock { options, .. }
            | Block::QuotedBlock { options, .. }
            | Block::BulletList { options, .. }
            | Block::EnumList { options, .. }
            | Block::Rule { options }
            | Block::LinkDefinition { options, .. }
            | Block::FootnoteDefinition { options, .. }
            | Block::Footnote { options, .. }
            | Block::Citation { options, .. }
            | Block::BlockSequence { options, .. }
            | Block::RawContent { options, .. }
            | Block::EmbeddedRoot { options, .. } => Some(options),
            Block::Header(header) => Some(&header.options),
            Block::InvalidBlock { .. } => None,
        }
    }
}

/// The root of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RootElement {
    pub content: Vec<Block>,
}

impl RootElement {
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_text() {
        let header = Header::new(
            2,
            vec![
                Span::text("Intro "),
                Span::Strong {
                    content: vec![Span::text("bold")],
                    options: Options::new(),
                },
            ],
        );
        assert_eq!(header.text(), "Intro bold");
    }

    #[test]
    fn test_options_accessor_covers_header() {
        let mut header = Header::new(1, vec![Span::text("Title")]);
        header.options = Options::with_id("title");
        let block = Block::Header(header);
        assert_eq!(
            block.options().and_then(|o| o.id.as_deref()),
            Some("title")
        );
    }
}
