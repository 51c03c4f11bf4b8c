//! The built-in Markdown dialect
//!
//! Covers ATX and setext headers, fenced and indented code blocks,
//! blockquotes, bullet and enumerated lists, rules, link/footnote/citation
//! definitions, and the usual inline set (strong, emphasis, code spans,
//! links, images, footnote and citation references). Anonymous link
//! references are written `[text][]` with `[]: url` targets; footnotes use
//! `[^]` (autonumber), `[^*]` (autosymbol), `[^name]` and `[^3]` labels.
//!
//! A document may start with a YAML front matter block delimited by `---`
//! lines; [`extract_front_matter`] splits it off before block parsing.

pub mod blocks;
pub mod spans;

use crate::orchestrator::{MarkupFormat, RecursiveParsers, RootParser};
use crate::registry::{BlockParserSpec, SpanParserSpec};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub struct Markdown;

impl MarkupFormat for Markdown {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn block_parsers(&self, rec: &RecursiveParsers) -> Vec<BlockParserSpec> {
        blocks::all(rec)
    }

    fn span_parsers(&self, rec: &RecursiveParsers) -> Vec<SpanParserSpec> {
        spans::all(rec)
    }
}

static MARKDOWN: Lazy<Arc<RootParser>> = Lazy::new(|| RootParser::new(&Markdown));

/// The shared, lazily built Markdown parser
pub fn parser() -> Arc<RootParser> {
    Arc::clone(&MARKDOWN)
}

/// Split a leading YAML front matter block off the document body
///
/// The block must start on the first line with `---` and end with a `---`
/// line; without a closing fence the document is treated as having no front
/// matter at all.
pub fn extract_front_matter(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("---\n") else {
        return (None, text);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Span};

    #[test]
    fn test_front_matter_extraction() {
        let input = "---\ntitle: Intro\n---\n# Heading\n";
        let (front, body) = extract_front_matter(input);
        assert_eq!(front, Some("title: Intro\n"));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let input = "---\ntitle: Intro\n";
        let (front, body) = extract_front_matter(input);
        assert_eq!(front, None);
        assert_eq!(body, input);
    }

    #[test]
    fn test_rule_not_front_matter() {
        let input = "some text\n---\n";
        let (front, _) = extract_front_matter(input);
        assert_eq!(front, None);
    }

    #[test]
    fn test_shared_parser_parses_paragraph() {
        let root = parser().parse_document("just one line\n");
        assert_eq!(root.content.len(), 1);
        match &root.content[0] {
            Block::Paragraph { content, .. } => {
                assert_eq!(content, &vec![Span::text("just one line")]);
            }
            other => panic!("Expected paragraph, got {:?}", other),
        }
    }
}
