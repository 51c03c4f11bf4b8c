//! Generic AST rewriting
//!
//! A [`RewriteRule`] maps each visited node to keep / replace / remove. The
//! traversal is depth-first in document source order: the rule is applied to
//! a node first, then to the children of whatever survived. Rules only
//! implement the hooks they care about; every container variant routes its
//! children through the generic helpers here, so a rule written against a
//! handful of node kinds traverses all others untouched.
//!
//! Rules take `&mut self` so that bookkeeping built in a pre-pass (for
//! example positional target queues) can be consumed during the traversal;
//! the traversal itself never mutates the input tree - it builds replacement
//! values.

use super::blocks::{Block, Header, ListItem, RootElement};
use super::spans::Span;

/// Decision for one visited node
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteAction<T> {
    Keep,
    Replace(T),
    Remove,
}

/// A node-kind-dispatched rewrite
pub trait RewriteRule {
    fn rewrite_block(&mut self, _block: &Block) -> RewriteAction<Block> {
        RewriteAction::Keep
    }

    fn rewrite_span(&mut self, _span: &Span) -> RewriteAction<Span> {
        RewriteAction::Keep
    }
}

/// Rewrite a whole document root
pub fn rewrite_root(root: &RootElement, rule: &mut dyn RewriteRule) -> RootElement {
    RootElement::new(rewrite_blocks(&root.content, rule))
}

/// Rewrite a block sequence in source order
pub fn rewrite_blocks(blocks: &[Block], rule: &mut dyn RewriteRule) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match rule.rewrite_block(block) {
            RewriteAction::Keep => out.push(rewrite_block_children(block.clone(), rule)),
            RewriteAction::Replace(replacement) => {
                out.push(rewrite_block_children(replacement, rule))
            }
            RewriteAction::Remove => {}
        }
    }
    out
}

/// Rewrite a span sequence in source order
pub fn rewrite_spans(spans: &[Span], rule: &mut dyn RewriteRule) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        match rule.rewrite_span(span) {
            RewriteAction::Keep => out.push(rewrite_span_children(span.clone(), rule)),
            RewriteAction::Replace(replacement) => {
                out.push(rewrite_span_children(replacement, rule))
            }
            RewriteAction::Remove => {}
        }
    }
    out
}

fn rewrite_header(header: Header, rule: &mut dyn RewriteRule) -> Header {
    Header {
        content: rewrite_spans(&header.content, rule),
        ..header
    }
}

fn rewrite_items(items: Vec<ListItem>, rule: &mut dyn RewriteRule) -> Vec<ListItem> {
    items
        .into_iter()
        .map(|item| ListItem {
            content: rewrite_blocks(&item.content, rule),
            options: item.options,
        })
        .collect()
}

fn rewrite_block_children(block: Block, rule: &mut dyn RewriteRule) -> Block {
    match block {
        Block::Paragraph { content, options } => Block::Paragraph {
            content: rewrite_spans(&content, rule),
            options,
        },
        Block::Header(header) => Block::Header(rewrite_header(header, rule)),
        Block::Section {
            header,
            content,
            options,
        } => Block::Section {
            header: rewrite_header(header, rule),
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::QuotedBlock { content, options } => Block::QuotedBlock {
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::BulletList { items, options } => Block::BulletList {
            items: rewrite_items(items, rule),
            options,
        },
        Block::EnumList {
            items,
            start,
            options,
        } => Block::EnumList {
            items: rewrite_items(items, rule),
            start,
            options,
        },
        Block::FootnoteDefinition {
            label,
            content,
            options,
        } => Block::FootnoteDefinition {
            label,
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::Footnote {
            label,
            content,
            options,
        } => Block::Footnote {
            label,
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::Citation {
            label,
            content,
            options,
        } => Block::Citation {
            label,
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::BlockSequence { content, options } => Block::BlockSequence {
            content: rewrite_blocks(&content, rule),
            options,
        },
        Block::EmbeddedRoot { content, options } => Block::EmbeddedRoot {
            content: rewrite_blocks(&content, rule),
            options,
        },
        // Leaf blocks and already-degraded nodes pass through unchanged
        other => other,
    }
}

fn rewrite_span_children(span: Span, rule: &mut dyn RewriteRule) -> Span {
    match span {
        Span::Emphasized { content, options } => Span::Emphasized {
            content: rewrite_spans(&content, rule),
            options,
        },
        Span::Strong { content, options } => Span::Strong {
            content: rewrite_spans(&content, rule),
            options,
        },
        Span::SpanLink {
            content,
            target,
            title,
            options,
        } => Span::SpanLink {
            content: rewrite_spans(&content, rule),
            target,
            title,
            options,
        },
        Span::LinkReference {
            content,
            id,
            source,
            options,
        } => Span::LinkReference {
            content: rewrite_spans(&content, rule),
            id,
            source,
            options,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::options::Options;

    struct UppercaseText;

    impl RewriteRule for UppercaseText {
        fn rewrite_span(&mut self, span: &Span) -> RewriteAction<Span> {
            match span {
                Span::Text { content, options } => RewriteAction::Replace(Span::Text {
                    content: content.to_uppercase(),
                    options: options.clone(),
                }),
                _ => RewriteAction::Keep,
            }
        }
    }

    struct DropRules;

    impl RewriteRule for DropRules {
        fn rewrite_block(&mut self, block: &Block) -> RewriteAction<Block> {
            match block {
                Block::Rule { .. } => RewriteAction::Remove,
                _ => RewriteAction::Keep,
            }
        }
    }

    fn sample_root() -> RootElement {
        RootElement::new(vec![
            Block::paragraph(vec![
                Span::text("plain "),
                Span::Emphasized {
                    content: vec![Span::text("nested")],
                    options: Options::new(),
                },
            ]),
            Block::Rule {
                options: Options::new(),
            },
        ])
    }

    #[test]
    fn test_span_rule_reaches_nested_spans() {
        let rewritten = rewrite_root(&sample_root(), &mut UppercaseText);
        match &rewritten.content[0] {
            Block::Paragraph { content, .. } => {
                assert_eq!(content[0], Span::text("PLAIN "));
                match &content[1] {
                    Span::Emphasized { content, .. } => {
                        assert_eq!(content[0], Span::text("NESTED"));
                    }
                    other => panic!("Unexpected span: {:?}", other),
                }
            }
            other => panic!("Unexpected block: {:?}", other),
        }
    }

    #[test]
    fn test_remove_drops_node() {
        let rewritten = rewrite_root(&sample_root(), &mut DropRules);
        assert_eq!(rewritten.content.len(), 1);
    }

    #[test]
    fn test_noop_rule_is_identity() {
        struct Noop;
        impl RewriteRule for Noop {}

        let root = sample_root();
        assert_eq!(rewrite_root(&root, &mut Noop), root);
    }
}
