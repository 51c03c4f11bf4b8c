//! Text-level parser primitives
//!
//! Character matchers, literals, whitespace and line helpers, and the
//! [`delimited_by`] builder for "consume until delimiter" runs with optional
//! escape handling. Parsers that match a fixed set of starting characters
//! declare a prefix hint so the span dispatcher can index them.

use super::{Parsed, Parser, PrefixSet};

/// Match any single character
pub fn any_char() -> Parser<char> {
    Parser::new(|src, offset| match src.char_at(offset) {
        Some(ch) => Parsed::success(ch, offset + ch.len_utf8()),
        None => Parsed::failure("unexpected end of input", offset),
    })
}

/// Match a single character satisfying `pred`
pub fn char_matching(
    pred: impl Fn(char) -> bool + Send + Sync + 'static,
) -> Parser<char> {
    Parser::new(move |src, offset| match src.char_at(offset) {
        Some(ch) if pred(ch) => Parsed::success(ch, offset + ch.len_utf8()),
        Some(ch) => Parsed::failure(format!("unexpected character '{}'", ch), offset),
        None => Parsed::failure("unexpected end of input", offset),
    })
}

/// Match any one character out of `chars`; prefix-hinted
pub fn one_of(chars: &str) -> Parser<char> {
    let set: Vec<char> = chars.chars().collect();
    let prefix = PrefixSet::of(set.iter().copied());
    let parser = Parser::new(move |src, offset| match src.char_at(offset) {
        Some(ch) if set.contains(&ch) => Parsed::success(ch, offset + ch.len_utf8()),
        Some(ch) => Parsed::failure(format!("unexpected character '{}'", ch), offset),
        None => Parsed::failure("unexpected end of input", offset),
    });
    parser.prefixed_by(prefix)
}

/// Match the exact string `s`; prefix-hinted by its first character
pub fn literal(s: &str) -> Parser<String> {
    let expected = s.to_string();
    let prefix = expected.chars().next().map(|ch| PrefixSet::of([ch]));
    let parser = Parser::new(move |src, offset| {
        if src.remaining(offset).starts_with(&expected) {
            Parsed::success(expected.clone(), offset + expected.len())
        } else {
            Parsed::failure(format!("expected '{}'", expected), offset)
        }
    });
    match prefix {
        Some(set) => parser.prefixed_by(set),
        None => parser,
    }
}

/// Consume the longest (possibly empty) run of characters satisfying `pred`
pub fn take_while(pred: impl Fn(char) -> bool + Send + Sync + 'static) -> Parser<String> {
    Parser::new(move |src, offset| {
        let rest = src.remaining(offset);
        let end = rest
            .char_indices()
            .find(|(_, ch)| !pred(*ch))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        Parsed::success(rest[..end].to_string(), offset + end)
    })
}

/// Consume a non-empty run of characters satisfying `pred`
pub fn take_some_while(
    pred: impl Fn(char) -> bool + Send + Sync + 'static,
) -> Parser<String> {
    Parser::new(move |src, offset| {
        let rest = src.remaining(offset);
        let end = rest
            .char_indices()
            .find(|(_, ch)| !pred(*ch))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if end == 0 {
            Parsed::failure("expected at least one matching character", offset)
        } else {
            Parsed::success(rest[..end].to_string(), offset + end)
        }
    })
}

/// Consume spaces and tabs (possibly none)
pub fn ws() -> Parser<String> {
    take_while(|ch| ch == ' ' || ch == '\t')
}

/// Consume the rest of the current line including its terminator; the value
/// excludes the terminator. At end of input the (possibly empty) remainder
/// counts as a line only if non-empty.
pub fn rest_of_line() -> Parser<String> {
    Parser::new(|src, offset| {
        let rest = src.remaining(offset);
        match rest.find('\n') {
            Some(nl) => Parsed::success(rest[..nl].to_string(), offset + nl + 1),
            None if rest.is_empty() => Parsed::failure("unexpected end of input", offset),
            None => Parsed::success(rest.to_string(), offset + rest.len()),
        }
    })
}

/// Match a line consisting only of spaces and tabs
pub fn blank_line() -> Parser<()> {
    Parser::new(|src, offset| {
        let rest = src.remaining(offset);
        if rest.is_empty() {
            return Parsed::failure("unexpected end of input", offset);
        }
        let line_end = rest.find('\n').unwrap_or(rest.len());
        if rest[..line_end].chars().all(|ch| ch == ' ' || ch == '\t') {
            let consumed = if line_end < rest.len() {
                line_end + 1
            } else {
                line_end
            };
            Parsed::success((), offset + consumed)
        } else {
            Parsed::failure("expected blank line", offset)
        }
    })
}

/// Builder for "consume until delimiter" runs
///
/// Consumes characters up to the first match of the delimiter; the delimiter
/// itself is consumed but excluded from the value unless `keep_delimiter` is
/// set. Fails if the delimiter never occurs, unless `accept_eof` is set. An
/// escape parser, when configured, is tried at every position and its value
/// is appended verbatim, so escaped delimiter characters never terminate the
/// run.
pub struct DelimitedBy {
    delimiter: String,
    keep_delimiter: bool,
    accept_eof: bool,
    nonempty: bool,
    escape: Option<Parser<char>>,
    preserve_escape: bool,
}

/// Start building a run delimited by `delimiter`
pub fn delimited_by(delimiter: &str) -> DelimitedBy {
    DelimitedBy {
        delimiter: delimiter.to_string(),
        keep_delimiter: false,
        accept_eof: false,
        nonempty: false,
        escape: None,
        preserve_escape: false,
    }
}

impl DelimitedBy {
    /// Include the delimiter in the returned value
    pub fn keep_delimiter(mut self) -> Self {
        self.keep_delimiter = true;
        self
    }

    /// Treat end of input as a valid terminator
    pub fn accept_eof(mut self) -> Self {
        self.accept_eof = true;
        self
    }

    /// Fail on an empty run
    pub fn nonempty(mut self) -> Self {
        self.nonempty = true;
        self
    }

    /// Handle escapes: wherever `escape` matches, its value is appended and
    /// the run continues past the escaped characters
    pub fn with_escape(mut self, escape: Parser<char>) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Like `with_escape`, but the escape sequence is kept verbatim in the
    /// value. Used when the captured text is re-parsed recursively, so the
    /// inner pass still sees (and unescapes) the sequences itself.
    pub fn with_escape_preserved(mut self, escape: Parser<char>) -> Self {
        self.escape = Some(escape);
        self.preserve_escape = true;
        self
    }

    pub fn parser(self) -> Parser<String> {
        let DelimitedBy {
            delimiter,
            keep_delimiter,
            accept_eof,
            nonempty,
            escape,
            preserve_escape,
        } = self;
        Parser::new(move |src, offset| {
            let text = src.text();
            let mut out = String::new();
            let mut pos = offset;
            loop {
                if pos >= text.len() {
                    if accept_eof {
                        break;
                    }
                    return Parsed::failure(
                        format!("expected delimiter '{}' before end of input", delimiter),
                        offset,
                    );
                }
                if let Some(escape) = &escape {
                    if let Parsed::Success { value, next } = escape.parse_at(src, pos) {
                        if preserve_escape {
                            out.push_str(&text[pos..next]);
                        } else {
                            out.push(value);
                        }
                        pos = next;
                        continue;
                    }
                }
                let rest = &text[pos..];
                if rest.starts_with(delimiter.as_str()) {
                    pos += delimiter.len();
                    if keep_delimiter {
                        out.push_str(&delimiter);
                    }
                    break;
                }
                let ch = rest.chars().next().expect("non-empty remainder");
                out.push(ch);
                pos += ch.len_utf8();
            }
            if nonempty && out.is_empty() {
                Parsed::failure("expected non-empty delimited text", offset)
            } else {
                Parsed::success(out, pos)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SourceFragment;

    fn src(text: &str) -> SourceFragment {
        SourceFragment::new(text)
    }

    #[test]
    fn test_one_of_declares_prefix() {
        let parser = one_of("*_");
        let prefix = parser.prefix().expect("expected prefix hint");
        assert!(prefix.contains('*'));
        assert!(prefix.contains('_'));
        assert!(!prefix.contains('x'));
    }

    #[test]
    fn test_literal_matches_exactly() {
        let parser = literal("**");
        assert_eq!(parser.parse(&src("**x")), Parsed::success("**".into(), 2));
        assert!(!parser.parse(&src("*x")).is_success());
    }

    #[test]
    fn test_take_while_can_be_empty() {
        let parser = take_while(|ch| ch.is_ascii_digit());
        assert_eq!(parser.parse(&src("abc")), Parsed::success("".into(), 0));
        assert_eq!(parser.parse(&src("12a")), Parsed::success("12".into(), 2));
    }

    #[test]
    fn test_take_some_while_requires_one() {
        let parser = take_some_while(|ch| ch.is_ascii_digit());
        assert!(!parser.parse(&src("abc")).is_success());
    }

    #[test]
    fn test_rest_of_line_consumes_terminator() {
        let parser = rest_of_line();
        assert_eq!(
            parser.parse(&src("first\nsecond")),
            Parsed::success("first".into(), 6)
        );
        assert_eq!(parser.parse(&src("last")), Parsed::success("last".into(), 4));
    }

    #[test]
    fn test_blank_line() {
        assert!(blank_line().parse(&src("   \nnext")).is_success());
        assert!(blank_line().parse(&src("\t\n")).is_success());
        assert!(!blank_line().parse(&src("  x\n")).is_success());
    }

    #[test]
    fn test_delimited_by_excludes_delimiter() {
        let parser = delimited_by("*").parser();
        assert_eq!(
            parser.parse(&src("text*rest")),
            Parsed::success("text".into(), 5)
        );
    }

    #[test]
    fn test_delimited_by_keep_delimiter() {
        let parser = delimited_by("*").keep_delimiter().parser();
        assert_eq!(
            parser.parse(&src("text*rest")),
            Parsed::success("text*".into(), 5)
        );
    }

    #[test]
    fn test_delimited_by_fails_without_delimiter() {
        let parser = delimited_by("*").parser();
        assert!(!parser.parse(&src("no delimiter")).is_success());
    }

    #[test]
    fn test_delimited_by_accept_eof() {
        let parser = delimited_by("*").accept_eof().parser();
        assert_eq!(
            parser.parse(&src("no delimiter")),
            Parsed::success("no delimiter".into(), 12)
        );
    }

    #[test]
    fn test_delimited_by_nonempty() {
        let parser = delimited_by("*").nonempty().parser();
        assert!(!parser.parse(&src("*rest")).is_success());
    }

    #[test]
    fn test_delimited_by_with_escape() {
        let escape = literal("\\").skip_then(any_char());
        let parser = delimited_by("*").with_escape(escape).parser();
        assert_eq!(
            parser.parse(&src("a\\*b*rest")),
            Parsed::success("a*b".into(), 5)
        );
    }

    #[test]
    fn test_multi_char_delimiter() {
        let parser = delimited_by("**").parser();
        assert_eq!(
            parser.parse(&src("bold**rest")),
            Parsed::success("bold".into(), 6)
        );
    }
}
