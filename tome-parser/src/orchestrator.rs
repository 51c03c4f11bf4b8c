//! Recursive descent orchestration
//!
//! The orchestrator drives the multi-pass parse: pass one walks the document
//! line by line and splits it into blocks via the block dispatcher; container
//! blocks capture their decorated line region and re-enter block parsing
//! recursively; leaf text regions then go through the span dispatcher, which
//! itself recurses for spans nested inside spans.
//!
//! Dialect parsers need access to the dispatchers that are being built from
//! them - a span parser for emphasis re-parses its delimited content as
//! spans. The cycle is broken with a weak handle: [`RootParser::new`] builds
//! the dispatch structures inside `Arc::new_cyclic`, handing each dialect a
//! [`RecursiveParsers`] value whose methods resolve the shared parser at
//! parse time.

use crate::ast::{Block, RootElement, Span};
use crate::parse::text::{any_char, blank_line, literal};
use crate::parse::{Parsed, Parser, SourceFragment};
use crate::registry::{BlockParserSpec, Dispatcher, SpanParserSpec};
use std::sync::{Arc, Weak};

/// A markup dialect: ordered block and span parsers plus escape handling
///
/// Registration order is precedence order. The default escape accepts any
/// single character after a backslash.
pub trait MarkupFormat {
    fn name(&self) -> &'static str;

    fn block_parsers(&self, rec: &RecursiveParsers) -> Vec<BlockParserSpec>;

    fn span_parsers(&self, rec: &RecursiveParsers) -> Vec<SpanParserSpec>;

    fn escaped_char(&self) -> Parser<char> {
        literal("\\").skip_then(any_char())
    }
}

/// The compiled parser for one dialect
pub struct RootParser {
    blocks: Dispatcher<Block>,
    spans: Dispatcher<Span>,
    escape: Parser<char>,
}

/// Handle through which dialect parsers re-enter the orchestrator
///
/// Holds a weak reference to the [`RootParser`] under construction; upgraded
/// lazily at parse time, when construction has long finished.
#[derive(Clone)]
pub struct RecursiveParsers {
    inner: Weak<RootParser>,
    escape: Parser<char>,
}

impl RecursiveParsers {
    fn root(&self) -> Arc<RootParser> {
        self.inner.upgrade().expect("root parser dropped mid-parse")
    }

    /// Parse a captured text region as spans
    pub fn parse_spans(&self, text: &str) -> Vec<Span> {
        let src = SourceFragment::new(text);
        self.root().parse_spans_from(&src, 0)
    }

    /// Recursively parse a captured (de-decorated) region as blocks
    pub fn parse_blocks(&self, text: &str) -> Vec<Block> {
        let src = SourceFragment::new(text);
        self.root().parse_blocks_from(&src, 0)
    }

    /// Whether a non-fallback block parser matches at `offset`; paragraph
    /// parsers use this to decide interruption
    pub fn block_starts_here(&self, src: &SourceFragment, offset: usize) -> bool {
        let root = self.root();
        let ch = match src.char_at(offset) {
            Some(ch) => ch,
            None => return false,
        };
        let matched = root
            .blocks
            .primary_candidates(ch)
            .any(|parser| parser.parse_at(src, offset).is_success());
        matched
    }

    /// The dialect's escape parser, for escape-aware text runs
    pub fn escaped_char(&self) -> Parser<char> {
        self.escape.clone()
    }
}

impl RootParser {
    pub fn new(format: &dyn MarkupFormat) -> Arc<RootParser> {
        Arc::new_cyclic(|weak| {
            let escape = format.escaped_char();
            let rec = RecursiveParsers {
                inner: weak.clone(),
                escape: escape.clone(),
            };
            let blocks = format
                .block_parsers(&rec)
                .into_iter()
                .map(|spec| (spec.parser, spec.precedence))
                .collect();
            let spans = format
                .span_parsers(&rec)
                .into_iter()
                .map(|spec| (spec.parser, spec.precedence))
                .collect();
            RootParser {
                blocks: Dispatcher::new(blocks),
                spans: Dispatcher::new(spans),
                escape,
            }
        })
    }

    /// Parse a whole document into its root element
    pub fn parse_document(&self, text: &str) -> RootElement {
        let src = SourceFragment::new(text);
        RootElement::new(self.parse_blocks_from(&src, 0))
    }

    /// Pass one: split the input into blocks, starting at `offset`
    ///
    /// Blank lines separate blocks and belong to none of them. Every
    /// non-blank line must be claimed by some block parser; the dialect's
    /// low-precedence fallback (the paragraph parser) claims anything the
    /// others reject. A line no parser claims is skipped - this cannot
    /// happen with a complete dialect but must not loop forever with an
    /// incomplete one.
    pub fn parse_blocks_from(&self, src: &SourceFragment, offset: usize) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pos = offset;
        let blank = blank_line();
        loop {
            while let Parsed::Success { next, .. } = blank.parse_at(src, pos) {
                pos = next;
            }
            if src.at_end(pos) {
                break;
            }
            match self.blocks.parse_at(src, pos) {
                Some((block, next)) => {
                    blocks.push(block);
                    pos = next;
                }
                None => {
                    let line_len = src.line_at(pos).len();
                    pos += line_len.max(1);
                }
            }
        }
        blocks
    }

    /// Pass two: parse a text region into spans
    ///
    /// At every offset the span dispatcher is consulted; when no registered
    /// parser matches, the character at that offset becomes literal text.
    /// Adjacent literal text is merged into a single node.
    pub fn parse_spans_from(&self, src: &SourceFragment, offset: usize) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let mut text = String::new();
        let mut pos = offset;

        while let Some(ch) = src.char_at(pos) {
            match self.spans.parse_at(src, pos) {
                Some((span, next)) => {
                    flush_text(&mut text, &mut spans);
                    push_span(&mut spans, span);
                    pos = next;
                }
                None => {
                    text.push(ch);
                    pos += ch.len_utf8();
                }
            }
        }
        flush_text(&mut text, &mut spans);
        spans
    }

    pub fn span_dispatcher(&self) -> &Dispatcher<Span> {
        &self.spans
    }
}

fn flush_text(text: &mut String, spans: &mut Vec<Span>) {
    if text.is_empty() {
        return;
    }
    let content = std::mem::take(text);
    push_span(spans, Span::text(content));
}

/// Append a span, merging consecutive plain text nodes
fn push_span(spans: &mut Vec<Span>, span: Span) {
    if let Span::Text {
        content,
        options,
    } = &span
    {
        if options == &crate::ast::Options::new() {
            if let Some(Span::Text {
                content: existing,
                options: last_options,
            }) = spans.last_mut()
            {
                if *last_options == crate::ast::Options::new() {
                    existing.push_str(content);
                    return;
                }
            }
        }
    }
    spans.push(span);
}
