//! Collecting embedded messages
//!
//! After rewriting, recoverable problems live inside the AST as
//! `SystemMessage` values (wrapped in invalid nodes or bare message spans).
//! The driver decides the policy: by default any message at Error severity
//! or above fails the run with the collected list, while a debug-oriented
//! policy renders them in place instead. This module provides the
//! collection walk that policy decision needs.

use tome_parser::ast::{Block, ListItem, MessageFilter, RootElement, Span, SystemMessage};

/// All messages embedded anywhere in a document, in source order
pub fn collect_messages(root: &RootElement) -> Vec<SystemMessage> {
    let mut out = Vec::new();
    collect_blocks(&root.content, &mut out);
    out
}

/// The messages a filter considers failures
pub fn failing_messages(root: &RootElement, filter: MessageFilter) -> Vec<SystemMessage> {
    collect_messages(root)
        .into_iter()
        .filter(|message| filter.matches(message))
        .collect()
}

fn collect_blocks(blocks: &[Block], out: &mut Vec<SystemMessage>) {
    for block in blocks {
        collect_block(block, out);
    }
}

fn collect_items(items: &[ListItem], out: &mut Vec<SystemMessage>) {
    for item in items {
        collect_blocks(&item.content, out);
    }
}

fn collect_block(block: &Block, out: &mut Vec<SystemMessage>) {
    match block {
        Block::InvalidBlock { message, fallback } => {
            out.push(message.clone());
            collect_block(fallback, out);
        }
        Block::Paragraph { content, .. } => collect_spans(content, out),
        Block::Header(header) => collect_spans(&header.content, out),
        Block::Section {
            header, content, ..
        } => {
            collect_spans(&header.content, out);
            collect_blocks(content, out);
        }
        Block::QuotedBlock { content, .. }
        | Block::BlockSequence { content, .. }
        | Block::EmbeddedRoot { content, .. }
        | Block::FootnoteDefinition { content, .. }
        | Block::Footnote { content, .. }
        | Block::Citation { content, .. } => collect_blocks(content, out),
        Block::BulletList { items, .. } | Block::EnumList { items, .. } => {
            collect_items(items, out)
        }
        _ => {}
    }
}

fn collect_spans(spans: &[Span], out: &mut Vec<SystemMessage>) {
    for span in spans {
        match span {
            Span::InvalidSpan { message, fallback } => {
                out.push(message.clone());
                collect_spans(std::slice::from_ref(fallback), out);
            }
            Span::MessageSpan { message, .. } => out.push(message.clone()),
            Span::Emphasized { content, .. }
            | Span::Strong { content, .. }
            | Span::SpanLink { content, .. }
            | Span::LinkReference { content, .. } => collect_spans(content, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_parser::ast::{MessageLevel, Options};

    #[test]
    fn test_collects_nested_messages() {
        let root = RootElement::new(vec![Block::paragraph(vec![Span::Emphasized {
            content: vec![Span::InvalidSpan {
                message: SystemMessage::error("unresolved link reference: foo"),
                fallback: Box::new(Span::text("[foo]")),
            }],
            options: Options::new(),
        }])]);

        let messages = collect_messages(&root);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, MessageLevel::Error);
    }

    #[test]
    fn test_filter_separates_warnings_from_errors() {
        let root = RootElement::new(vec![Block::paragraph(vec![
            Span::MessageSpan {
                message: SystemMessage::warning("missing fragment: sidebar"),
                options: Options::new(),
            },
            Span::InvalidSpan {
                message: SystemMessage::error("boom"),
                fallback: Box::new(Span::text("x")),
            },
        ])]);

        assert_eq!(collect_messages(&root).len(), 2);
        assert_eq!(failing_messages(&root, MessageFilter::default()).len(), 1);
        assert_eq!(failing_messages(&root, MessageFilter::none()).len(), 0);
    }
}
