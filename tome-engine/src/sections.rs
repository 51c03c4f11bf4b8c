//! Section building and autonumbering
//!
//! Parsing leaves headers as flat siblings of their content. The section
//! builder groups them: a header at level L closes every open section at
//! level >= L and opens a new one; content attaches to the innermost open
//! section. The algorithm is an explicit stack, not recursion per level,
//! because header levels may skip arbitrarily - a level-1 header can be
//! followed directly by a level-4 one, and the level-4 section must close
//! as soon as any header at level <= 4 appears.
//!
//! Autonumbering is config-driven and purely positional: the label of a
//! section is its 1-based index path within the document, prefixed by the
//! document's tree position when documents are numbered too. Labels are
//! deterministic from tree child order and section nesting alone, so
//! repeated runs produce identical numbers.

use crate::document::TreePosition;
use crate::error::EngineError;
use tome_config::Config;
use tome_parser::ast::{Block, Header, Options, RootElement, Span};

/// What gets numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberScope {
    All,
    Documents,
    Sections,
    None,
}

/// Style name carried by injected number labels; also the idempotence
/// guard - a header already starting with a label span is left alone
const NUMBER_STYLE: &str = "section-number";

/// Group a flat block sequence into nested sections
pub fn build_sections(blocks: Vec<Block>) -> Vec<Block> {
    let mut result: Vec<Block> = Vec::new();
    let mut stack: Vec<(Header, Vec<Block>)> = Vec::new();

    for block in blocks {
        match block {
            Block::Header(header) => {
                while stack
                    .last()
                    .map(|(open, _)| open.level >= header.level)
                    .unwrap_or(false)
                {
                    close_top(&mut stack, &mut result);
                }
                stack.push((header, Vec::new()));
            }
            other => match stack.last_mut() {
                Some((_, content)) => content.push(other),
                None => result.push(other),
            },
        }
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut result);
    }
    result
}

fn close_top(stack: &mut Vec<(Header, Vec<Block>)>, result: &mut Vec<Block>) {
    let (header, content) = stack.pop().expect("close_top on non-empty stack");
    let section = Block::Section {
        header,
        content,
        options: Options::new(),
    };
    match stack.last_mut() {
        Some((_, parent)) => parent.push(section),
        None => result.push(section),
    }
}

/// Read and validate the autonumbering configuration
///
/// An unusable value is a fatal error: the rule cannot guess what the user
/// meant, and silently skipping numbering would hide the mistake.
pub fn autonumber_config(config: &Config) -> Result<(NumberScope, usize), EngineError> {
    let scope = match config.get_str("autonumbering.scope") {
        None | Some("none") => NumberScope::None,
        Some("all") => NumberScope::All,
        Some("documents") => NumberScope::Documents,
        Some("sections") => NumberScope::Sections,
        Some(other) => {
            return Err(EngineError::InvalidConfigValue {
                key: "autonumbering.scope".to_string(),
                message: format!("unknown scope '{}'", other),
            })
        }
    };
    let depth = match config.get_int("autonumbering.depth") {
        None => 0,
        Some(depth) if depth >= 0 => depth as usize,
        Some(depth) => {
            return Err(EngineError::InvalidConfigValue {
                key: "autonumbering.depth".to_string(),
                message: format!("depth must not be negative, got {}", depth),
            })
        }
    };
    Ok((scope, depth))
}

/// Inject number labels into a document's section tree
pub fn number_sections(
    root: RootElement,
    position: &TreePosition,
    config: &Config,
) -> Result<RootElement, EngineError> {
    let (scope, depth) = autonumber_config(config)?;
    let content = match scope {
        NumberScope::None => root.content,
        NumberScope::Sections => number_walk(root.content, &[], depth),
        NumberScope::All => number_walk(root.content, position.indices(), depth),
        NumberScope::Documents => number_document_title(root.content, position),
    };
    Ok(RootElement::new(content))
}

fn label_span(indices: &[usize]) -> Span {
    let label: Vec<String> = indices.iter().map(usize::to_string).collect();
    Span::Text {
        content: format!("{} ", label.join(".")),
        options: Options::with_style(NUMBER_STYLE),
    }
}

fn has_label(header: &Header) -> bool {
    matches!(
        header.content.first(),
        Some(Span::Text { options, .. }) if options.styles.iter().any(|s| s == NUMBER_STYLE)
    )
}

fn numbered_header(header: Header, indices: &[usize]) -> Header {
    if has_label(&header) {
        return header;
    }
    let mut content = vec![label_span(indices)];
    content.extend(header.content);
    Header { content, ..header }
}

fn number_walk(blocks: Vec<Block>, prefix: &[usize], depth: usize) -> Vec<Block> {
    let mut section_index = 0;
    blocks
        .into_iter()
        .map(|block| match block {
            Block::Section {
                header,
                content,
                options,
            } => {
                section_index += 1;
                let mut indices = prefix.to_vec();
                indices.push(section_index);
                let header = if depth == 0 || indices.len() <= depth {
                    numbered_header(header, &indices)
                } else {
                    header
                };
                Block::Section {
                    header,
                    content: number_walk(content, &indices, depth),
                    options,
                }
            }
            other => other,
        })
        .collect()
}

/// Document-only numbering: the tree position label goes on the first
/// top-level section title
fn number_document_title(blocks: Vec<Block>, position: &TreePosition) -> Vec<Block> {
    if position.indices().is_empty() {
        return blocks;
    }
    let mut numbered = false;
    blocks
        .into_iter()
        .map(|block| match block {
            Block::Section {
                header,
                content,
                options,
            } if !numbered => {
                numbered = true;
                Block::Section {
                    header: numbered_header(header, position.indices()),
                    content,
                    options,
                }
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_parser::ast::Span;

    fn header(level: u32, text: &str) -> Block {
        Block::Header(Header::new(level, vec![Span::text(text)]))
    }

    fn para(text: &str) -> Block {
        Block::paragraph(vec![Span::text(text)])
    }

    fn section_at<'a>(blocks: &'a [Block], index: usize) -> (&'a Header, &'a Vec<Block>) {
        match &blocks[index] {
            Block::Section {
                header, content, ..
            } => (header, content),
            other => panic!("Expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_basic_nesting() {
        let result = build_sections(vec![
            header(1, "One"),
            para("a"),
            header(2, "Two"),
            para("b"),
        ]);
        assert_eq!(result.len(), 1);
        let (h1, content) = section_at(&result, 0);
        assert_eq!(h1.level, 1);
        assert_eq!(content.len(), 2);
        let (h2, inner) = section_at(content, 1);
        assert_eq!(h2.level, 2);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_skipped_levels_close_on_geq() {
        // Levels [1, 4, 2]: the level-4 section closes when the level-2
        // header appears; level 2 becomes a sibling of level 4 inside
        // level 1.
        let result = build_sections(vec![
            header(1, "One"),
            para("a"),
            header(4, "Four"),
            para("b"),
            header(2, "Two"),
            para("c"),
        ]);
        assert_eq!(result.len(), 1);
        let (h1, content) = section_at(&result, 0);
        assert_eq!(h1.level, 1);
        // para("a"), Section(level 4), Section(level 2)
        assert_eq!(content.len(), 3);
        let (h4, four_content) = section_at(content, 1);
        assert_eq!(h4.level, 4);
        assert_eq!(four_content.len(), 1);
        let (h2, two_content) = section_at(content, 2);
        assert_eq!(h2.level, 2);
        assert_eq!(two_content.len(), 1);
    }

    #[test]
    fn test_equal_level_closes() {
        let result = build_sections(vec![header(2, "A"), header(2, "B")]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_content_before_first_header_stays_top_level() {
        let result = build_sections(vec![para("intro"), header(1, "One")]);
        assert_eq!(result.len(), 2);
        assert!(matches!(result[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_build_is_idempotent() {
        let once = build_sections(vec![header(1, "One"), para("a"), header(2, "Two")]);
        let twice = build_sections(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_section_numbering() {
        let config = Config::from_yaml_str("autonumbering:\n  scope: sections\n").unwrap();
        let sections = build_sections(vec![
            header(1, "One"),
            header(2, "Nested"),
            header(1, "Two"),
        ]);
        let root = number_sections(RootElement::new(sections), &TreePosition::root(), &config)
            .unwrap();

        let (h1, content) = section_at(&root.content, 0);
        assert_eq!(h1.content[0], label_span(&[1]));
        let (nested, _) = section_at(content, 0);
        assert_eq!(nested.content[0], label_span(&[1, 1]));
        let (h2, _) = section_at(&root.content, 1);
        assert_eq!(h2.content[0], label_span(&[2]));
    }

    #[test]
    fn test_numbering_respects_depth() {
        let config =
            Config::from_yaml_str("autonumbering:\n  scope: sections\n  depth: 1\n").unwrap();
        let sections = build_sections(vec![header(1, "One"), header(2, "Nested")]);
        let root = number_sections(RootElement::new(sections), &TreePosition::root(), &config)
            .unwrap();

        let (h1, content) = section_at(&root.content, 0);
        assert!(has_label(h1));
        let (nested, _) = section_at(content, 0);
        assert!(!has_label(nested));
    }

    #[test]
    fn test_numbering_with_document_prefix() {
        let config = Config::from_yaml_str("autonumbering:\n  scope: all\n").unwrap();
        let sections = build_sections(vec![header(1, "One")]);
        let position = TreePosition::root().child(2).child(1);
        let root = number_sections(RootElement::new(sections), &position, &config).unwrap();

        let (h1, _) = section_at(&root.content, 0);
        assert_eq!(h1.content[0], label_span(&[2, 1, 1]));
    }

    #[test]
    fn test_numbering_is_idempotent() {
        let config = Config::from_yaml_str("autonumbering:\n  scope: sections\n").unwrap();
        let sections = build_sections(vec![header(1, "One")]);
        let once =
            number_sections(RootElement::new(sections), &TreePosition::root(), &config).unwrap();
        let twice = number_sections(once.clone(), &TreePosition::root(), &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_invalid_scope_is_fatal() {
        let config = Config::from_yaml_str("autonumbering:\n  scope: sideways\n").unwrap();
        match autonumber_config(&config) {
            Err(EngineError::InvalidConfigValue { key, .. }) => {
                assert_eq!(key, "autonumbering.scope")
            }
            other => panic!("Expected fatal config error, got {:?}", other),
        }
    }
}
