//! Parser registries and prefix dispatch
//!
//! A markup dialect registers ordered lists of block and span parsers. Span
//! dispatch is one of the hottest paths in the engine - it runs at every
//! character offset of every text region - so parsers carrying a prefix hint
//! are indexed by start character into a lookup table. At a given offset the
//! dispatcher consults only the candidates registered for the character at
//! that offset, in registration order, followed by unprefixed parsers, with
//! low-precedence parsers last. Registration order is a user-visible
//! contract: when two parsers could match the same prefix (one vs two
//! identical delimiter characters), the more specific one must be registered
//! first; the dispatcher never reorders.

use crate::ast::{Block, Span};
use crate::parse::{Parsed, Parser, SourceFragment};
use std::collections::HashMap;

/// Relative trial position among parsers matching at the same offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    Normal,
    /// Tried only after all normal-precedence candidates failed; fallback
    /// parsers such as the paragraph parser register this way
    Low,
}

/// A registered block parser
pub struct BlockParserSpec {
    pub parser: Parser<Block>,
    pub precedence: Precedence,
}

impl BlockParserSpec {
    pub fn new(parser: Parser<Block>) -> Self {
        Self {
            parser,
            precedence: Precedence::Normal,
        }
    }

    pub fn low(parser: Parser<Block>) -> Self {
        Self {
            parser,
            precedence: Precedence::Low,
        }
    }
}

/// A registered span parser
pub struct SpanParserSpec {
    pub parser: Parser<Span>,
    pub precedence: Precedence,
}

impl SpanParserSpec {
    pub fn new(parser: Parser<Span>) -> Self {
        Self {
            parser,
            precedence: Precedence::Normal,
        }
    }

    pub fn low(parser: Parser<Span>) -> Self {
        Self {
            parser,
            precedence: Precedence::Low,
        }
    }
}

/// Character-indexed dispatch over an ordered parser list
///
/// Shared by span and block dispatch; the generic parameter is the produced
/// node type.
pub struct Dispatcher<T> {
    by_char: HashMap<char, Vec<usize>>,
    unprefixed: Vec<usize>,
    low: Vec<usize>,
    parsers: Vec<Parser<T>>,
}

impl<T: 'static> Dispatcher<T> {
    pub fn new(specs: Vec<(Parser<T>, Precedence)>) -> Self {
        let mut by_char: HashMap<char, Vec<usize>> = HashMap::new();
        let mut unprefixed = Vec::new();
        let mut low = Vec::new();
        let mut parsers = Vec::new();

        for (parser, precedence) in specs {
            let index = parsers.len();
            match precedence {
                Precedence::Low => low.push(index),
                Precedence::Normal => match parser.prefix() {
                    Some(prefix) => {
                        for ch in prefix.chars() {
                            by_char.entry(ch).or_default().push(index);
                        }
                    }
                    None => unprefixed.push(index),
                },
            }
            parsers.push(parser);
        }

        Self {
            by_char,
            unprefixed,
            low,
            parsers,
        }
    }

    /// Candidate parsers for input starting with `ch`, in trial order
    pub fn candidates(&self, ch: char) -> impl Iterator<Item = &Parser<T>> {
        let prefixed = self.by_char.get(&ch).map(|v| v.as_slice()).unwrap_or(&[]);
        prefixed
            .iter()
            .chain(self.unprefixed.iter())
            .chain(self.low.iter())
            .map(move |&i| &self.parsers[i])
    }

    /// Candidates excluding low-precedence fallbacks; used for "would
    /// another block start here" interruption checks
    pub fn primary_candidates(&self, ch: char) -> impl Iterator<Item = &Parser<T>> {
        let prefixed = self.by_char.get(&ch).map(|v| v.as_slice()).unwrap_or(&[]);
        prefixed
            .iter()
            .chain(self.unprefixed.iter())
            .map(move |&i| &self.parsers[i])
    }

    /// Try all candidates at `offset`; first success wins. Zero-width
    /// successes are skipped - a parser that consumed nothing cannot
    /// contribute a node.
    pub fn parse_at(&self, src: &SourceFragment, offset: usize) -> Option<(T, usize)> {
        let ch = src.char_at(offset)?;
        for parser in self.candidates(ch) {
            if let Parsed::Success { value, next } = parser.parse_at(src, offset) {
                if next > offset {
                    return Some((value, next));
                }
            }
        }
        None
    }

    /// All registered parsers in registration order, for equivalence testing
    /// against the naive sequential trial
    pub fn all_parsers(&self) -> &[Parser<T>] {
        &self.parsers
    }
}
