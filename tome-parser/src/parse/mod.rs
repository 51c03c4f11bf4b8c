//! Parser combinator core
//!
//! The combinators in this module are the foundation every markup dialect is
//! built from. A [`Parser<T>`] consumes a prefix of a [`SourceFragment`]
//! starting at a given offset and produces a [`Parsed<T>`]: either
//! `Success { value, next }` with the offset advanced past the consumed
//! input, or `Failure { message, offset }` without consuming anything.
//!
//! Failure is the normal backtracking signal, not an error. Alternation
//! retries the next alternative from the original offset, and the
//! orchestrator decides fallback behavior (typically: treat an unparseable
//! span start as literal text). Nothing in this module panics or returns
//! `Err` for a non-match.
//!
//! ## Prefix hints
//!
//! A parser that can only ever succeed when the next character is in a known
//! set declares that set as its [`PrefixSet`]. The span dispatcher builds a
//! character-indexed table from these hints so that, at every text offset,
//! only the candidates that can possibly match are tried - an O(1) dispatch
//! instead of a linear trial of all registered alternatives. Combinators
//! propagate hints conservatively: `a.then(b)` keeps `a`'s hint, `a.or(b)`
//! unions both hints (and drops the hint entirely if either side has none),
//! `map` keeps the hint unchanged.

pub mod source;
pub mod text;

pub use source::{Position, Range, SourceFragment};

use std::collections::BTreeSet;
use std::sync::Arc;

/// Result of applying a parser at an offset
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The parser matched; `next` is the first unconsumed offset
    Success { value: T, next: usize },
    /// The parser did not match; no input was consumed
    Failure { message: String, offset: usize },
}

impl<T> Parsed<T> {
    pub fn success(value: T, next: usize) -> Self {
        Parsed::Success { value, next }
    }

    pub fn failure(message: impl Into<String>, offset: usize) -> Self {
        Parsed::Failure {
            message: message.into(),
            offset,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Parsed::Success { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        match self {
            Parsed::Success { value, next } => Parsed::Success {
                value: f(value),
                next,
            },
            Parsed::Failure { message, offset } => Parsed::Failure { message, offset },
        }
    }

    /// The value and next offset on success, `None` on failure
    pub fn into_option(self) -> Option<(T, usize)> {
        match self {
            Parsed::Success { value, next } => Some((value, next)),
            Parsed::Failure { .. } => None,
        }
    }
}

/// The set of characters a parser can start with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSet {
    chars: BTreeSet<char>,
}

impl PrefixSet {
    pub fn of(chars: impl IntoIterator<Item = char>) -> Self {
        Self {
            chars: chars.into_iter().collect(),
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn union(&self, other: &PrefixSet) -> PrefixSet {
        Self {
            chars: self.chars.union(&other.chars).copied().collect(),
        }
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

type RunFn<T> = dyn Fn(&SourceFragment, usize) -> Parsed<T> + Send + Sync;

/// A composable parser producing values of type `T`
///
/// Parsers are cheap to clone (the implementation is reference-counted) and
/// are built once per dialect, then applied many times.
pub struct Parser<T> {
    run: Arc<RunFn<T>>,
    prefix: Option<PrefixSet>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
            prefix: self.prefix.clone(),
        }
    }
}

impl<T: 'static> Parser<T> {
    pub fn new(f: impl Fn(&SourceFragment, usize) -> Parsed<T> + Send + Sync + 'static) -> Self {
        Self {
            run: Arc::new(f),
            prefix: None,
        }
    }

    /// Attach a prefix hint: this parser only succeeds when the next
    /// character is in `set`
    pub fn prefixed_by(mut self, set: PrefixSet) -> Self {
        self.prefix = Some(set);
        self
    }

    pub fn prefix(&self) -> Option<&PrefixSet> {
        self.prefix.as_ref()
    }

    /// Apply this parser at `offset`
    pub fn parse_at(&self, src: &SourceFragment, offset: usize) -> Parsed<T> {
        (self.run)(src, offset)
    }

    /// Apply this parser at the start of the fragment
    pub fn parse(&self, src: &SourceFragment) -> Parsed<T> {
        self.parse_at(src, 0)
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Parser<U> {
        let run = self.run;
        Parser {
            run: Arc::new(move |src, offset| run(src, offset).map(&f)),
            prefix: self.prefix,
        }
    }

    /// Sequencing: succeed only if `self` then `next` succeed, in order
    pub fn then<U: 'static>(self, next: Parser<U>) -> Parser<(T, U)> {
        let first = self.run;
        let second = next.run;
        Parser {
            run: Arc::new(move |src, offset| match first(src, offset) {
                Parsed::Success { value: a, next } => match second(src, next) {
                    Parsed::Success { value: b, next } => Parsed::success((a, b), next),
                    Parsed::Failure { message, offset } => Parsed::failure(message, offset),
                },
                Parsed::Failure { message, offset } => Parsed::failure(message, offset),
            }),
            prefix: self.prefix,
        }
    }

    /// Sequencing that drops the left value
    pub fn skip_then<U: 'static>(self, next: Parser<U>) -> Parser<U> {
        self.then(next).map(|(_, b)| b)
    }

    /// Sequencing that drops the right value
    pub fn then_skip<U: 'static>(self, next: Parser<U>) -> Parser<T> {
        self.then(next).map(|(a, _)| a)
    }

    /// Alternation: try `self`; on failure, try `alt` from the original offset
    pub fn or(self, alt: Parser<T>) -> Parser<T> {
        let prefix = match (&self.prefix, &alt.prefix) {
            (Some(a), Some(b)) => Some(a.union(b)),
            _ => None,
        };
        let first = self.run;
        let second = alt.run;
        Parser {
            run: Arc::new(move |src, offset| match first(src, offset) {
                success @ Parsed::Success { .. } => success,
                Parsed::Failure { .. } => second(src, offset),
            }),
            prefix,
        }
    }

    /// Make this parser optional; never fails
    pub fn opt(self) -> Parser<Option<T>> {
        let run = self.run;
        Parser {
            run: Arc::new(move |src, offset| match run(src, offset) {
                Parsed::Success { value, next } => Parsed::success(Some(value), next),
                Parsed::Failure { .. } => Parsed::success(None, offset),
            }),
            prefix: None,
        }
    }

    /// Repetition builder; defaults to zero or more matches
    pub fn repeated(self) -> Repeat<T> {
        Repeat {
            item: self,
            min: 0,
            max: None,
        }
    }

    /// Zero or more matches
    pub fn rep(self) -> Parser<Vec<T>> {
        self.repeated().parser()
    }

    /// Capture the consumed source text alongside the value
    pub fn sourced(self) -> Parser<(T, String)> {
        let run = self.run;
        Parser {
            run: Arc::new(move |src, offset| match run(src, offset) {
                Parsed::Success { value, next } => {
                    let consumed = src.text()[offset..next].to_string();
                    Parsed::success((value, consumed), next)
                }
                Parsed::Failure { message, offset } => Parsed::failure(message, offset),
            }),
            prefix: self.prefix,
        }
    }
}

/// Repetition with optional lower and upper bounds
///
/// Succeeds with the longest matching sequence. Never fails once the lower
/// bound is satisfied; an item failure simply ends the repetition.
pub struct Repeat<T> {
    item: Parser<T>,
    min: usize,
    max: Option<usize>,
}

impl<T: 'static> Repeat<T> {
    pub fn min(mut self, n: usize) -> Self {
        self.min = n;
        self
    }

    pub fn max(mut self, n: usize) -> Self {
        self.max = Some(n);
        self
    }

    pub fn parser(self) -> Parser<Vec<T>> {
        let item = self.item.run;
        let prefix = if self.min > 0 { self.item.prefix } else { None };
        let (min, max) = (self.min, self.max);
        Parser {
            run: Arc::new(move |src, offset| {
                let mut values = Vec::new();
                let mut pos = offset;
                loop {
                    if let Some(max) = max {
                        if values.len() >= max {
                            break;
                        }
                    }
                    match item(src, pos) {
                        Parsed::Success { value, next } => {
                            // A zero-width success would loop forever
                            if next == pos {
                                break;
                            }
                            values.push(value);
                            pos = next;
                        }
                        Parsed::Failure { .. } => break,
                    }
                }
                if values.len() < min {
                    Parsed::failure(format!("expected at least {} matches", min), offset)
                } else {
                    Parsed::success(values, pos)
                }
            }),
            prefix,
        }
    }
}

/// A parser that always succeeds with `value` without consuming input
pub fn success<T: Clone + Send + Sync + 'static>(value: T) -> Parser<T> {
    Parser::new(move |_, offset| Parsed::success(value.clone(), offset))
}

/// A parser that always fails with `message`
pub fn failure<T: 'static>(message: &str) -> Parser<T> {
    let message = message.to_string();
    Parser::new(move |_, offset| Parsed::failure(message.clone(), offset))
}

/// Succeed or fail as `inner` would, but never consume input
pub fn look_ahead<T: 'static>(inner: Parser<T>) -> Parser<T> {
    let prefix = inner.prefix().cloned();
    let run = move |src: &SourceFragment, offset: usize| match inner.parse_at(src, offset) {
        Parsed::Success { value, .. } => Parsed::success(value, offset),
        Parsed::Failure { message, offset } => Parsed::failure(message, offset),
    };
    let parser = Parser::new(run);
    match prefix {
        Some(set) => parser.prefixed_by(set),
        None => parser,
    }
}

/// Negative lookahead: succeed (consuming nothing) only if `inner` fails
pub fn not<T: 'static>(inner: Parser<T>) -> Parser<()> {
    Parser::new(move |src, offset| match inner.parse_at(src, offset) {
        Parsed::Success { .. } => Parsed::failure("unexpected match", offset),
        Parsed::Failure { .. } => Parsed::success((), offset),
    })
}

/// Succeed only at the end of input
pub fn eof() -> Parser<()> {
    Parser::new(|src, offset| {
        if src.at_end(offset) {
            Parsed::success((), offset)
        } else {
            Parsed::failure("expected end of input", offset)
        }
    })
}
