//! Link and reference resolution
//!
//! This is the rewrite pass that eliminates every reference node: named and
//! anonymous link references, image references, footnote and citation
//! references, and the target-defining nodes feeding them. Targets are
//! stamped with their final ids (or removed - link definitions leave no
//! trace), references become resolved links, and anything that cannot be
//! resolved becomes an explicit error span carrying a message and the
//! original source text as fallback, so the document still renders
//! something recognizable.
//!
//! Resolution order for a named reference: the document's own targets
//! first; then, for globally addressable names, each ancestor directory
//! scope walking up to the root; a `path:name` qualified id jumps straight
//! to the named document. An ambiguous or duplicated match stops the walk
//! with an error - the resolver never picks a winner arbitrarily.

use crate::cursor::DocumentCursor;
use crate::document::{Document, DocumentTree};
use crate::ids::slug;
use crate::path::VirtualPath;
use crate::targets::{
    resolve_in_scope, scan_document, DocumentTargets, Resolution, Selector, TargetKind,
    TargetResolver,
};
use std::collections::{BTreeMap, VecDeque};
use tome_parser::ast::{
    Block, FootnoteLabel, LinkId, LinkTarget, RewriteAction, RewriteRule, Span, SystemMessage,
};
use tome_parser::markdown::spans::uri_target;

/// Pre-scanned targets for every document in the project
///
/// Built once after tree assembly; shared read-only by every document's
/// rewrite.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    by_doc: BTreeMap<VirtualPath, DocumentTargets>,
}

impl ProjectIndex {
    pub fn scan(tree: &DocumentTree) -> Self {
        let mut by_doc = BTreeMap::new();
        for doc in tree.documents() {
            by_doc.insert(doc.path.clone(), scan_document(doc));
        }
        Self { by_doc }
    }

    pub fn targets_for(&self, path: &VirtualPath) -> Option<&DocumentTargets> {
        self.by_doc.get(path)
    }

    /// Targets of every document inside `tree`, in tree order
    fn docs_in(&self, tree: &DocumentTree) -> Vec<&DocumentTargets> {
        tree.documents()
            .into_iter()
            .filter_map(|doc| self.by_doc.get(&doc.path))
            .collect()
    }
}

/// The rewrite rule resolving one document's references
///
/// All mutable state - the positional queues and the id map - was built by
/// the pre-scan; the rule consumes it in document order and consults the
/// shared [`ProjectIndex`] for everything cross-document.
pub struct LinkResolver<'a> {
    origin: VirtualPath,
    index: &'a ProjectIndex,
    scopes: Vec<&'a DocumentTree>,
    own: DocumentTargets,
    anonymous_refs: VecDeque<TargetResolver>,
    autonumber_refs: VecDeque<TargetResolver>,
    autosymbol_refs: VecDeque<TargetResolver>,
    autonumber_defs: VecDeque<TargetResolver>,
    autosymbol_defs: VecDeque<TargetResolver>,
}

impl<'a> LinkResolver<'a> {
    pub fn new(cursor: &DocumentCursor<'a>, index: &'a ProjectIndex) -> Self {
        Self::for_document(cursor.document, cursor.scope_chain(), index)
    }

    /// Build a resolver from explicit parts; useful for single-document
    /// rewriting without a surrounding tree
    pub fn for_document(
        doc: &Document,
        scopes: Vec<&'a DocumentTree>,
        index: &'a ProjectIndex,
    ) -> Self {
        let own = scan_document(doc);
        let anonymous_refs = own.anonymous.clone();
        let autonumber_refs = own.autonumber.clone();
        let autosymbol_refs = own.autosymbol.clone();
        let autonumber_defs = own.autonumber.clone();
        let autosymbol_defs = own.autosymbol.clone();
        Self {
            origin: doc.path.clone(),
            index,
            scopes,
            own,
            anonymous_refs,
            autonumber_refs,
            autosymbol_refs,
            autonumber_defs,
            autosymbol_defs,
        }
    }

    /// Turn a reference name into its selector: a `path:name` qualified id
    /// becomes a path selector (relative paths resolve against the
    /// referring document's directory), anything else a unique id.
    fn selector_for(&self, name: &str) -> Selector {
        match name.split_once(':') {
            Some((path_part, target_name)) => Selector::PathSelector {
                path: if path_part.starts_with('/') {
                    VirtualPath::parse(path_part)
                } else {
                    self.origin.parent().join(path_part)
                },
                name: target_name.to_string(),
            },
            None => Selector::UniqueId(name.to_string()),
        }
    }

    fn resolve_named(&self, name: &str) -> Resolution<'_> {
        match self.selector_for(name) {
            Selector::PathSelector { path, name } => match self.index.targets_for(&path) {
                Some(targets) => resolve_in_scope(&name, &[targets], true),
                None => Resolution::NotFound,
            },
            _ => {
                match resolve_in_scope(name, &[&self.own], false) {
                    Resolution::NotFound => {}
                    other => return other,
                }
                for tree in &self.scopes {
                    let docs = self.index.docs_in(tree);
                    match resolve_in_scope(name, &docs, true) {
                        Resolution::NotFound => continue,
                        other => return other,
                    }
                }
                Resolution::NotFound
            }
        }
    }

    /// Turn a matched target into the resolved link span
    fn make_link(
        &self,
        resolver: &TargetResolver,
        content: Vec<Span>,
        options: tome_parser::ast::Options,
    ) -> Span {
        match &resolver.kind {
            TargetKind::LinkDefinition { url, title } => Span::SpanLink {
                content,
                target: self.definition_target(resolver, url),
                title: title.clone(),
                options,
            },
            TargetKind::Header { .. } | TargetKind::BlockId => Span::SpanLink {
                content,
                target: self.fragment_target(resolver),
                title: None,
                options,
            },
            TargetKind::Footnote { label } => Span::FootnoteLink {
                ref_id: resolver.render_id.clone(),
                label: label.clone(),
                options,
            },
            TargetKind::Citation => {
                let label = match &resolver.selector {
                    crate::targets::Selector::UniqueId(name) => name.clone(),
                    _ => resolver.render_id.clone(),
                };
                Span::CitationLink {
                    ref_id: resolver.render_id.clone(),
                    label,
                    options,
                }
            }
        }
    }

    /// The target for a link definition: external URIs pass through,
    /// internal ones resolve against the defining document and render
    /// relative to the referring one
    fn definition_target(&self, resolver: &TargetResolver, url: &str) -> LinkTarget {
        match uri_target(url) {
            LinkTarget::Internal { path, fragment } if !path.is_empty() => {
                let absolute = resolver.path.parent().join(&path);
                LinkTarget::Internal {
                    path: absolute.relative_to(&self.origin),
                    fragment,
                }
            }
            other => other,
        }
    }

    /// The target for an id-carrying node: its document plus fragment
    fn fragment_target(&self, resolver: &TargetResolver) -> LinkTarget {
        let path = if resolver.path == self.origin {
            String::new()
        } else {
            resolver.path.relative_to(&self.origin)
        };
        LinkTarget::Internal {
            path,
            fragment: Some(resolver.render_id.clone()),
        }
    }

    /// Normalize an internal target written inline: resolve it against the
    /// referring document's directory so `./` and `../` disappear
    fn normalize_inline(&self, target: &LinkTarget) -> Option<LinkTarget> {
        match target {
            LinkTarget::Internal { path, fragment } if !path.is_empty() => {
                let absolute = self.origin.parent().join(path);
                Some(LinkTarget::Internal {
                    path: absolute.relative_to(&self.origin),
                    fragment: fragment.clone(),
                })
            }
            _ => None,
        }
    }
}

fn invalid_span(message: String, source: &str) -> Span {
    Span::InvalidSpan {
        message: SystemMessage::error(message),
        fallback: Box::new(Span::text(source)),
    }
}

fn invalid_block(message: String, fallback: Block) -> Block {
    Block::InvalidBlock {
        message: SystemMessage::error(message),
        fallback: Box::new(fallback),
    }
}

impl<'a> RewriteRule for LinkResolver<'a> {
    fn rewrite_block(&mut self, block: &Block) -> RewriteAction<Block> {
        match block {
            Block::LinkDefinition { .. } => RewriteAction::Remove,
            Block::FootnoteDefinition {
                label,
                content,
                options,
            } => {
                let resolver = match label {
                    FootnoteLabel::Autonumber => self.autonumber_defs.pop_front(),
                    FootnoteLabel::Autosymbol => self.autosymbol_defs.pop_front(),
                    FootnoteLabel::Named(name) => {
                        self.own.lookup_definition(name, false).cloned()
                    }
                    FootnoteLabel::Numeric(number) => {
                        self.own.lookup_definition(&number.to_string(), false).cloned()
                    }
                };
                match resolver {
                    Some(resolver) if resolver.duplicate => RewriteAction::Replace(invalid_block(
                        format!("duplicate target id: {}", resolver.render_id),
                        block.clone(),
                    )),
                    Some(resolver) => {
                        let label = match &resolver.kind {
                            TargetKind::Footnote { label } => label.clone(),
                            _ => resolver.render_id.clone(),
                        };
                        RewriteAction::Replace(Block::Footnote {
                            label,
                            content: content.clone(),
                            options: options.set_id(resolver.render_id.clone()),
                        })
                    }
                    None => RewriteAction::Replace(invalid_block(
                        "orphaned footnote definition".to_string(),
                        block.clone(),
                    )),
                }
            }
            Block::Citation {
                label,
                content,
                options,
            } if options.id.is_none() => {
                match self.own.lookup_definition(label, false) {
                    Some(resolver) if resolver.duplicate => RewriteAction::Replace(invalid_block(
                        format!("duplicate target id: {}", label),
                        block.clone(),
                    )),
                    Some(resolver) => RewriteAction::Replace(Block::Citation {
                        label: label.clone(),
                        content: content.clone(),
                        options: options.set_id(resolver.render_id.clone()),
                    }),
                    None => RewriteAction::Keep,
                }
            }
            Block::Header(header) if header.options.id.is_none() => {
                let suggestion = slug(&header.text());
                match self.own.id_map.next_for(&suggestion) {
                    Some(final_id) => {
                        let mut stamped = header.clone();
                        stamped.options = stamped.options.set_id(final_id);
                        RewriteAction::Replace(Block::Header(stamped))
                    }
                    None => RewriteAction::Keep,
                }
            }
            _ => RewriteAction::Keep,
        }
    }

    fn rewrite_span(&mut self, span: &Span) -> RewriteAction<Span> {
        match span {
            Span::LinkReference {
                content,
                id,
                source,
                options,
            } => {
                let resolution = match id {
                    LinkId::Named(name) => self.resolve_named(name),
                    LinkId::Anonymous => {
                        return match self.anonymous_refs.pop_front() {
                            Some(resolver) => RewriteAction::Replace(self.make_link(
                                &resolver,
                                content.clone(),
                                options.clone(),
                            )),
                            None => RewriteAction::Replace(invalid_span(
                                "too many anonymous link references".to_string(),
                                source,
                            )),
                        };
                    }
                };
                let replacement = match resolution {
                    Resolution::Target(resolver) => {
                        let resolver = resolver.clone();
                        self.make_link(&resolver, content.clone(), options.clone())
                    }
                    Resolution::Duplicate(name) => {
                        invalid_span(format!("duplicate target id: {}", name), source)
                    }
                    Resolution::Ambiguous(name) => {
                        invalid_span(format!("ambiguous link reference: {}", name), source)
                    }
                    Resolution::NotFound => {
                        let name = match id {
                            LinkId::Named(name) => name.clone(),
                            LinkId::Anonymous => String::new(),
                        };
                        invalid_span(format!("unresolved link reference: {}", name), source)
                    }
                };
                RewriteAction::Replace(replacement)
            }
            Span::ImageReference {
                alt,
                id,
                source,
                options,
            } => {
                let resolution = match id {
                    LinkId::Named(name) => self.resolve_named(name),
                    LinkId::Anonymous => match self.anonymous_refs.pop_front() {
                        Some(resolver) => {
                            let resolver = resolver.clone();
                            return RewriteAction::Replace(self.image_from(
                                &resolver, alt, source, options,
                            ));
                        }
                        None => {
                            return RewriteAction::Replace(invalid_span(
                                "too many anonymous link references".to_string(),
                                source,
                            ))
                        }
                    },
                };
                let replacement = match resolution {
                    Resolution::Target(resolver) => {
                        let resolver = resolver.clone();
                        self.image_from(&resolver, alt, source, options)
                    }
                    Resolution::Duplicate(name) => {
                        invalid_span(format!("duplicate target id: {}", name), source)
                    }
                    Resolution::Ambiguous(name) => {
                        invalid_span(format!("ambiguous link reference: {}", name), source)
                    }
                    Resolution::NotFound => {
                        let name = match id {
                            LinkId::Named(name) => name.clone(),
                            LinkId::Anonymous => String::new(),
                        };
                        invalid_span(format!("unresolved image reference: {}", name), source)
                    }
                };
                RewriteAction::Replace(replacement)
            }
            Span::FootnoteReference {
                label,
                source,
                options,
            } => {
                let resolver = match label {
                    FootnoteLabel::Autonumber => self.autonumber_refs.pop_front(),
                    FootnoteLabel::Autosymbol => self.autosymbol_refs.pop_front(),
                    FootnoteLabel::Named(name) => {
                        self.own.lookup_definition(name, false).cloned()
                    }
                    FootnoteLabel::Numeric(number) => {
                        self.own.lookup_definition(&number.to_string(), false).cloned()
                    }
                };
                let replacement = match resolver {
                    Some(resolver) => match &resolver.kind {
                        TargetKind::Footnote { label } => Span::FootnoteLink {
                            ref_id: resolver.render_id.clone(),
                            label: label.clone(),
                            options: options.clone(),
                        },
                        _ => invalid_span("unresolved footnote reference".to_string(), source),
                    },
                    None => {
                        let message = match label {
                            FootnoteLabel::Autonumber => {
                                "too many autonumber footnote references".to_string()
                            }
                            FootnoteLabel::Autosymbol => {
                                "too many autosymbol footnote references".to_string()
                            }
                            FootnoteLabel::Named(name) => {
                                format!("unresolved footnote reference: {}", name)
                            }
                            FootnoteLabel::Numeric(number) => {
                                format!("unresolved footnote reference: {}", number)
                            }
                        };
                        invalid_span(message, source)
                    }
                };
                RewriteAction::Replace(replacement)
            }
            Span::CitationReference {
                label,
                source,
                options,
            } => {
                let replacement = match self.own.lookup_definition(label, false) {
                    Some(resolver) if matches!(resolver.kind, TargetKind::Citation) => {
                        Span::CitationLink {
                            ref_id: resolver.render_id.clone(),
                            label: label.clone(),
                            options: options.clone(),
                        }
                    }
                    _ => invalid_span(
                        format!("unresolved citation reference: {}", label),
                        source,
                    ),
                };
                RewriteAction::Replace(replacement)
            }
            Span::Image {
                alt,
                target,
                title,
                options,
            } => match self.normalize_inline(target) {
                Some(normalized) => RewriteAction::Replace(Span::Image {
                    alt: alt.clone(),
                    target: normalized,
                    title: title.clone(),
                    options: options.clone(),
                }),
                None => RewriteAction::Keep,
            },
            Span::SpanLink {
                content,
                target,
                title,
                options,
            } => match self.normalize_inline(target) {
                Some(normalized) => RewriteAction::Replace(Span::SpanLink {
                    content: content.clone(),
                    target: normalized,
                    title: title.clone(),
                    options: options.clone(),
                }),
                None => RewriteAction::Keep,
            },
            _ => RewriteAction::Keep,
        }
    }
}

impl<'a> LinkResolver<'a> {
    fn image_from(
        &self,
        resolver: &TargetResolver,
        alt: &str,
        source: &str,
        options: &tome_parser::ast::Options,
    ) -> Span {
        match &resolver.kind {
            TargetKind::LinkDefinition { url, title } => Span::Image {
                alt: alt.to_string(),
                target: self.definition_target(resolver, url),
                title: title.clone(),
                options: options.clone(),
            },
            _ => invalid_span(
                format!("unresolved image reference: {}", resolver.render_id),
                source,
            ),
        }
    }
}
