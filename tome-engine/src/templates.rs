//! Template parsing and merging
//!
//! Templates are ordinary inputs classified as `Template` by the driver.
//! They parse into a flat [`TemplateRoot`]: literal text runs interleaved
//! with placeholder nodes - `{{document.content}}` marks where the
//! document's main content goes, `{{fragment.<name>}}` pulls in a named
//! fragment. Merging is a single-pass substitution over that flat list,
//! not a rewrite rule: placeholders are found by a direct scan, the
//! document content lands wrapped in an `EmbeddedRoot` marker, and a
//! missing fragment degrades to a warning span instead of failing the run.
//!
//! Template selection walks the directory chain from the document upward;
//! the nearest directory that declares a template wins, with
//! `default.template.html` preferred when a directory declares several.

use crate::document::{Document, DocumentTree};
use crate::path::VirtualPath;
use tome_parser::ast::{Block, Options, RootElement, Span, SystemMessage};
use tome_parser::parse::text::{literal, take_some_while, ws};
use tome_parser::parse::{Parsed, Parser, SourceFragment};

/// One node of a parsed template
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Literal output text, passed through verbatim
    Literal(String),
    /// `{{document.content}}` - the insertion point for the document
    ContentReference,
    /// `{{fragment.<name>}}` - the insertion point for a named fragment
    FragmentReference(String),
}

/// A parsed template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateRoot {
    pub nodes: Vec<TemplateNode>,
}

/// A template attached to a directory of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDocument {
    pub path: VirtualPath,
    pub root: TemplateRoot,
}

impl TemplateDocument {
    pub fn parse(path: VirtualPath, text: &str) -> Self {
        Self {
            path,
            root: parse_template(text),
        }
    }
}

/// The default template name preferred during selection
pub const DEFAULT_TEMPLATE: &str = "default.template.html";

fn placeholder() -> Parser<TemplateNode> {
    literal("{{")
        .skip_then(ws())
        .skip_then(take_some_while(|ch: char| {
            ch.is_alphanumeric() || ch == '.' || ch == '-' || ch == '_'
        }))
        .then_skip(ws())
        .then_skip(literal("}}"))
        .sourced()
        .map(|(name, source)| {
            if name == "document.content" {
                TemplateNode::ContentReference
            } else if let Some(fragment) = name.strip_prefix("fragment.") {
                TemplateNode::FragmentReference(fragment.to_string())
            } else {
                // Unknown directives stay in the output verbatim
                TemplateNode::Literal(source)
            }
        })
}

/// Parse template text into literal runs and placeholders
pub fn parse_template(text: &str) -> TemplateRoot {
    let src = SourceFragment::new(text);
    let placeholder = placeholder();
    let mut nodes: Vec<TemplateNode> = Vec::new();
    let mut buffer = String::new();
    let mut pos = 0;

    while let Some(ch) = src.char_at(pos) {
        if ch == '{' {
            if let Parsed::Success { value, next } = placeholder.parse_at(&src, pos) {
                if !buffer.is_empty() {
                    nodes.push(TemplateNode::Literal(std::mem::take(&mut buffer)));
                }
                nodes.push(value);
                pos = next;
                continue;
            }
        }
        buffer.push(ch);
        pos += ch.len_utf8();
    }
    if !buffer.is_empty() {
        nodes.push(TemplateNode::Literal(buffer));
    }
    TemplateRoot { nodes }
}

/// Substitute a resolved document into a template
pub fn merge(template: &TemplateRoot, doc: &Document) -> RootElement {
    let mut blocks: Vec<Block> = Vec::new();
    for node in &template.nodes {
        match node {
            TemplateNode::Literal(text) => blocks.push(Block::RawContent {
                text: text.clone(),
                options: Options::new(),
            }),
            TemplateNode::ContentReference => blocks.push(Block::EmbeddedRoot {
                content: doc.content.content.clone(),
                options: Options::new(),
            }),
            TemplateNode::FragmentReference(name) => match doc.fragments.get(name) {
                Some(fragment) => blocks.push(fragment.clone()),
                None => blocks.push(Block::Paragraph {
                    content: vec![Span::MessageSpan {
                        message: SystemMessage::warning(format!("missing fragment: {}", name)),
                        options: Options::new(),
                    }],
                    options: Options::new(),
                }),
            },
        }
    }
    RootElement::new(blocks)
}

/// Pick the template for a document: nearest directory first, preferring
/// the default template name within a directory
pub fn select_template<'a>(scopes: &[&'a DocumentTree]) -> Option<&'a TemplateDocument> {
    for tree in scopes {
        if let Some(preferred) = tree
            .templates
            .iter()
            .find(|template| template.path.name() == DEFAULT_TEMPLATE)
        {
            return Some(preferred);
        }
        if let Some(first) = tree.templates.first() {
            return Some(first);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_parser::ast::RootElement;

    #[test]
    fn test_parse_literals_and_placeholders() {
        let root = parse_template("<html>{{document.content}}</html>");
        assert_eq!(
            root.nodes,
            vec![
                TemplateNode::Literal("<html>".into()),
                TemplateNode::ContentReference,
                TemplateNode::Literal("</html>".into()),
            ]
        );
    }

    #[test]
    fn test_parse_fragment_reference_with_whitespace() {
        let root = parse_template("{{ fragment.sidebar }}");
        assert_eq!(
            root.nodes,
            vec![TemplateNode::FragmentReference("sidebar".into())]
        );
    }

    #[test]
    fn test_unknown_directive_stays_literal() {
        let root = parse_template("{{unknown.thing}}");
        assert_eq!(
            root.nodes,
            vec![TemplateNode::Literal("{{unknown.thing}}".into())]
        );
    }

    #[test]
    fn test_unclosed_braces_stay_literal() {
        let root = parse_template("a {{ b");
        assert_eq!(root.nodes, vec![TemplateNode::Literal("a {{ b".into())]);
    }

    #[test]
    fn test_merge_wraps_content_in_embedded_root() {
        let template = parse_template("<body>{{document.content}}</body>");
        let doc = Document::new(
            VirtualPath::parse("/a.md"),
            RootElement::new(vec![Block::paragraph(vec![Span::text("hello")])]),
        );
        let merged = merge(&template, &doc);

        assert_eq!(merged.content.len(), 3);
        match &merged.content[1] {
            Block::EmbeddedRoot { content, .. } => assert_eq!(content.len(), 1),
            other => panic!("Expected embedded root, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_missing_fragment_degrades_to_warning() {
        let template = parse_template("{{fragment.sidebar}}");
        let doc = Document::new(VirtualPath::parse("/a.md"), RootElement::default());
        let merged = merge(&template, &doc);

        match &merged.content[0] {
            Block::Paragraph { content, .. } => match &content[0] {
                Span::MessageSpan { message, .. } => {
                    assert!(message.content.contains("sidebar"));
                }
                other => panic!("Expected message span, got {:?}", other),
            },
            other => panic!("Expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_present_fragment() {
        let template = parse_template("{{fragment.note}}");
        let mut doc = Document::new(VirtualPath::parse("/a.md"), RootElement::default());
        doc.fragments.insert(
            "note".to_string(),
            Block::paragraph(vec![Span::text("from fragment")]),
        );
        let merged = merge(&template, &doc);
        assert_eq!(
            merged.content[0],
            Block::paragraph(vec![Span::text("from fragment")])
        );
    }
}
