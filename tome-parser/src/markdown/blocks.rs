//! Markdown block parsers
//!
//! Block parsers are tried at line starts. Most of them work line-wise:
//! they claim one or more whole source lines, and container blocks
//! (blockquotes, list items) strip their decoration and re-enter block
//! parsing recursively through the [`RecursiveParsers`] handle.
//!
//! Registration order resolves prefix overlaps: rules before bullet lists
//! (`---` vs `- item`), footnote and citation definitions before link
//! definitions (all start with `[`), and the paragraph parser last, at low
//! precedence, as the fallback that claims any non-blank line.

use super::spans::footnote_label;
use crate::ast::{Block, Header, ListItem, Options};
use crate::orchestrator::RecursiveParsers;
use crate::parse::text::{delimited_by, literal, one_of, rest_of_line, take_some_while, take_while, ws};
use crate::parse::{Parsed, Parser, SourceFragment};
use crate::registry::BlockParserSpec;

pub fn all(rec: &RecursiveParsers) -> Vec<BlockParserSpec> {
    vec![
        BlockParserSpec::new(atx_header(rec)),
        BlockParserSpec::new(fenced_code_block()),
        BlockParserSpec::new(blockquote(rec)),
        BlockParserSpec::new(rule()),
        BlockParserSpec::new(bullet_list(rec)),
        BlockParserSpec::new(enum_list(rec)),
        BlockParserSpec::new(footnote_definition(rec)),
        BlockParserSpec::new(citation_definition(rec)),
        BlockParserSpec::new(link_definition()),
        BlockParserSpec::new(indented_code_block()),
        BlockParserSpec::low(paragraph(rec)),
    ]
}

/// Offset of the line start following the line at `pos`
fn next_line_start(src: &SourceFragment, pos: usize) -> usize {
    let end = pos + src.line_at(pos).len();
    if end < src.len() {
        end + 1
    } else {
        end
    }
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|ch| ch == ' ' || ch == '\t')
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|ch| *ch == ' ').count()
}

/// Consume the line terminator, or succeed at end of input
fn eol() -> Parser<()> {
    Parser::new(|src, offset| {
        if src.at_end(offset) {
            Parsed::success((), offset)
        } else if src.char_at(offset) == Some('\n') {
            Parsed::success((), offset + 1)
        } else {
            Parsed::failure("expected end of line", offset)
        }
    })
}

/// `# Title` through `###### Title`
fn atx_header(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    one_of("#")
        .repeated()
        .min(1)
        .max(6)
        .parser()
        .then_skip(literal(" "))
        .then(rest_of_line())
        .map(move |(hashes, text)| {
            let text = text.trim().trim_end_matches('#').trim_end();
            Block::Header(Header::new(
                hashes.len() as u32,
                rec.parse_spans(text),
            ))
        })
}

/// ``` fenced code, optionally tagged with a language
fn fenced_code_block() -> Parser<Block> {
    let parser = Parser::new(|src: &SourceFragment, offset| {
        let first = src.line_at(offset);
        let info = match first.strip_prefix("```") {
            Some(info) => info.trim(),
            None => return Parsed::failure("expected code fence", offset),
        };
        let language = if info.is_empty() {
            None
        } else {
            Some(info.to_string())
        };
        let mut pos = next_line_start(src, offset);
        let mut lines: Vec<String> = Vec::new();
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            pos = next_line_start(src, pos);
            if line.trim_end() == "```" {
                break;
            }
            lines.push(line.to_string());
        }
        Parsed::success(
            Block::CodeBlock {
                language,
                content: lines.join("\n"),
                options: Options::new(),
            },
            pos,
        )
    });
    parser.prefixed_by(crate::parse::PrefixSet::of(['`']))
}

/// `>` quoted blocks; the stripped region is block-parsed recursively
fn blockquote(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    let parser = Parser::new(move |src: &SourceFragment, offset| {
        let mut lines: Vec<String> = Vec::new();
        let mut pos = offset;
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            match line.strip_prefix('>') {
                Some(rest) => {
                    lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                    pos = next_line_start(src, pos);
                }
                None => break,
            }
        }
        if lines.is_empty() {
            return Parsed::failure("expected quoted block", offset);
        }
        Parsed::success(
            Block::QuotedBlock {
                content: rec.parse_blocks(&lines.join("\n")),
                options: Options::new(),
            },
            pos,
        )
    });
    parser.prefixed_by(crate::parse::PrefixSet::of(['>']))
}

/// A horizontal rule: three or more of the same marker, spaces allowed
fn rule() -> Parser<Block> {
    let parser = Parser::new(|src: &SourceFragment, offset| {
        let line = src.line_at(offset).trim_end();
        let marker = match line.chars().next() {
            Some(ch @ ('*' | '-' | '_')) => ch,
            _ => return Parsed::failure("expected rule", offset),
        };
        let count = line.chars().filter(|ch| *ch == marker).count();
        let uniform = line.chars().all(|ch| ch == marker || ch == ' ');
        if uniform && count >= 3 {
            Parsed::success(
                Block::Rule {
                    options: Options::new(),
                },
                next_line_start(src, offset),
            )
        } else {
            Parsed::failure("expected rule", offset)
        }
    });
    parser.prefixed_by(crate::parse::PrefixSet::of(['*', '-', '_']))
}

/// Collect the lines of one list item starting past its marker line
///
/// Continuation rules: indented lines (two or more spaces) continue the
/// item with their indent stripped; a blank line continues it only when
/// followed by an indented line (multi-paragraph items) or a new marker
/// line (loose lists - the blank is consumed, the item ends); any other
/// non-blank line continues the item lazily unless a non-fallback block
/// starts there.
fn collect_item_lines(
    rec: &RecursiveParsers,
    src: &SourceFragment,
    first: String,
    start: usize,
    is_marker: &dyn Fn(&str) -> bool,
) -> (Vec<String>, usize) {
    let mut lines = vec![first];
    let mut pos = start;
    while !src.at_end(pos) {
        let line = src.line_at(pos);
        if is_blank(line) {
            let mut peek = next_line_start(src, pos);
            while !src.at_end(peek) && is_blank(src.line_at(peek)) {
                peek = next_line_start(src, peek);
            }
            if src.at_end(peek) {
                break;
            }
            let peeked = src.line_at(peek);
            if leading_spaces(peeked) >= 2 {
                lines.push(String::new());
                pos = next_line_start(src, pos);
                continue;
            }
            if is_marker(peeked) {
                pos = peek;
            }
            break;
        }
        if is_marker(line) {
            break;
        }
        let indent = leading_spaces(line);
        if indent >= 2 {
            lines.push(line[indent.min(2)..].to_string());
            pos = next_line_start(src, pos);
            continue;
        }
        if !rec.block_starts_here(src, pos) {
            lines.push(line.to_string());
            pos = next_line_start(src, pos);
            continue;
        }
        break;
    }
    (lines, pos)
}

/// `- item` / `* item` / `+ item`; one marker character per list
fn bullet_list(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    let parser = Parser::new(move |src: &SourceFragment, offset| {
        let first = src.line_at(offset);
        let marker = match first.chars().next() {
            Some(ch @ ('-' | '*' | '+')) => ch,
            _ => return Parsed::failure("expected bullet list", offset),
        };
        let marker_prefix: String = format!("{} ", marker);
        let is_marker = |line: &str| line.starts_with(&marker_prefix);
        if !is_marker(first) {
            return Parsed::failure("expected bullet list", offset);
        }

        let mut items = Vec::new();
        let mut pos = offset;
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            if !is_marker(line) {
                break;
            }
            let content = line[2..].to_string();
            let after_marker = next_line_start(src, pos);
            let (lines, next) =
                collect_item_lines(&rec, src, content, after_marker, &is_marker);
            items.push(ListItem::new(rec.parse_blocks(&lines.join("\n"))));
            pos = next;
        }
        if items.is_empty() {
            return Parsed::failure("expected bullet list", offset);
        }
        Parsed::success(
            Block::BulletList {
                items,
                options: Options::new(),
            },
            pos,
        )
    });
    parser.prefixed_by(crate::parse::PrefixSet::of(['-', '*', '+']))
}

/// `1. item` enumerated lists; the first number sets the start
fn enum_list(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();

    fn marker_width(line: &str) -> Option<usize> {
        let digits = line.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 && line[digits..].starts_with(". ") {
            Some(digits + 2)
        } else {
            None
        }
    }

    let parser = Parser::new(move |src: &SourceFragment, offset| {
        let is_marker = |line: &str| marker_width(line).is_some();
        let first = src.line_at(offset);
        let width = match marker_width(first) {
            Some(width) => width,
            None => return Parsed::failure("expected enumerated list", offset),
        };
        let start: u32 = first[..width - 2].parse().unwrap_or(1);

        let mut items = Vec::new();
        let mut pos = offset;
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            let width = match marker_width(line) {
                Some(width) => width,
                None => break,
            };
            let content = line[width..].to_string();
            let after_marker = next_line_start(src, pos);
            let (lines, next) =
                collect_item_lines(&rec, src, content, after_marker, &is_marker);
            items.push(ListItem::new(rec.parse_blocks(&lines.join("\n"))));
            pos = next;
        }
        if items.is_empty() {
            return Parsed::failure("expected enumerated list", offset);
        }
        Parsed::success(
            Block::EnumList {
                items,
                start,
                options: Options::new(),
            },
            pos,
        )
    });
    parser.prefixed_by(crate::parse::PrefixSet::of([
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    ]))
}

/// `[id]: url "title"` - also the anonymous form `[]: url`
fn link_definition() -> Parser<Block> {
    let title = ws()
        .skip_then(literal("\""))
        .skip_then(delimited_by("\"").parser());
    literal("[")
        .skip_then(take_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]:"))
        .then_skip(ws())
        .then(take_some_while(|ch| !ch.is_whitespace()))
        .then(title.opt())
        .then_skip(ws())
        .then_skip(eol())
        .map(|((id, url), title)| {
            let id = id.trim();
            Block::LinkDefinition {
                id: if id.is_empty() {
                    None
                } else {
                    Some(id.to_lowercase())
                },
                url,
                title,
                options: Options::new(),
            }
        })
}

/// `[^label]: content` - footnote target definitions
fn footnote_definition(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    literal("[^")
        .skip_then(take_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]:"))
        .then_skip(ws())
        .then(rest_of_line().opt())
        .map(move |(label, text)| {
            let text = text.unwrap_or_default();
            Block::FootnoteDefinition {
                label: footnote_label(&label),
                content: vec![Block::paragraph(rec.parse_spans(text.trim_end()))],
                options: Options::new(),
            }
        })
}

/// `[@label]: content` - citation target definitions
fn citation_definition(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    literal("[@")
        .skip_then(take_some_while(|ch| ch != ']' && ch != '\n'))
        .then_skip(literal("]:"))
        .then_skip(ws())
        .then(rest_of_line().opt())
        .map(move |(label, text)| {
            let text = text.unwrap_or_default();
            Block::Citation {
                label: label.trim().to_lowercase(),
                content: vec![Block::paragraph(rec.parse_spans(text.trim_end()))],
                options: Options::new(),
            }
        })
}

/// Code blocks indented by four spaces
fn indented_code_block() -> Parser<Block> {
    let parser = Parser::new(|src: &SourceFragment, offset| {
        let mut lines: Vec<String> = Vec::new();
        let mut pos = offset;
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            match line.strip_prefix("    ") {
                Some(rest) => {
                    lines.push(rest.to_string());
                    pos = next_line_start(src, pos);
                }
                None => break,
            }
        }
        if lines.is_empty() {
            return Parsed::failure("expected indented code", offset);
        }
        Parsed::success(
            Block::CodeBlock {
                language: None,
                content: lines.join("\n"),
                options: Options::new(),
            },
            pos,
        )
    });
    parser.prefixed_by(crate::parse::PrefixSet::of([' ']))
}

/// Whether a line under a paragraph turns it into a setext header
fn setext_level(line: &str) -> Option<u32> {
    let line = line.trim_end();
    if line.is_empty() {
        None
    } else if line.chars().all(|ch| ch == '=') {
        Some(1)
    } else if line.chars().all(|ch| ch == '-') {
        Some(2)
    } else {
        None
    }
}

/// The fallback block: consumes lines until a blank line or an interrupting
/// block start. Performs the setext lookahead - a line of only `=` or `-`
/// directly under paragraph text turns the whole group into a header, which
/// wins over the rule interpretation of `---`.
fn paragraph(rec: &RecursiveParsers) -> Parser<Block> {
    let rec = rec.clone();
    Parser::new(move |src: &SourceFragment, offset| {
        let mut lines: Vec<&str> = Vec::new();
        let mut pos = offset;
        while !src.at_end(pos) {
            let line = src.line_at(pos);
            if is_blank(line) {
                break;
            }
            if !lines.is_empty() {
                if let Some(level) = setext_level(line) {
                    let text = lines.join("\n");
                    return Parsed::success(
                        Block::Header(Header::new(level, rec.parse_spans(text.trim()))),
                        next_line_start(src, pos),
                    );
                }
                if rec.block_starts_here(src, pos) {
                    break;
                }
            }
            lines.push(line);
            pos = next_line_start(src, pos);
        }
        if lines.is_empty() {
            return Parsed::failure("expected paragraph", offset);
        }
        let text = lines.join("\n");
        Parsed::success(
            Block::paragraph(rec.parse_spans(text.trim_end())),
            pos,
        )
    })
}
