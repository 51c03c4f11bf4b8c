//! Target collection: the resolver pre-scan
//!
//! Before any reference is rewritten, each document is scanned once, in
//! source order, for target-defining nodes: link definitions, footnote
//! definitions, citations, headers, and any node carrying an explicit id.
//! The scan assigns final ids (deduplicating collisions through the
//! [`IdGenerator`]/[`IdMap`] pair), sorts targets into unique-id maps and
//! positional queues, and produces an immutable [`DocumentTargets`] value.
//! All mutable bookkeeping lives here, in the pre-scan; the rewrite rule
//! itself only consults the precomputed structure (and pops the positional
//! queues it was handed).
//!
//! Global targets (headers, link definitions, explicit ids) are visible to
//! other documents; footnotes and citations resolve only within their own
//! document. A duplicated global id does not pick a winner: lookups answer
//! "duplicate", and every reference to it becomes an error node.

use crate::ids::{slug, IdGenerator, IdMap};
use crate::path::VirtualPath;
use std::collections::{HashMap, VecDeque};
use tome_parser::ast::{Block, FootnoteLabel, ListItem};

use crate::document::Document;

/// The key used to match a reference to its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A unique id within its scope
    UniqueId(String),
    /// A target in another document, addressed as `path:name`
    PathSelector { path: VirtualPath, name: String },
    /// The Nth anonymous target, matched by position
    Anonymous(u32),
    /// The Nth autonumber footnote, matched by position
    Autonumber(u32),
    /// The Nth autosymbol footnote, matched by position
    Autosymbol(u32),
}

/// What kind of node defined a target
#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind {
    LinkDefinition { url: String, title: Option<String> },
    Header { level: u32, headline: String },
    Footnote { label: String },
    Citation,
    BlockId,
}

/// A collected target: its selector, assigned render id, and enough
/// information to rewrite both the target node and any reference to it
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResolver {
    pub selector: Selector,
    pub kind: TargetKind,
    /// The document that defined the target
    pub path: VirtualPath,
    /// The finally assigned id the rendered output will carry
    pub render_id: String,
    /// Whether the target is reachable from other documents
    pub global: bool,
    /// Set when the same unique id was defined more than once; every
    /// reference then fails instead of picking one arbitrarily
    pub duplicate: bool,
}

/// The outcome of a scoped lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Target(&'a TargetResolver),
    /// The id is defined more than once in the scope
    Duplicate(String),
    /// Two headers with the same headline at the same level
    Ambiguous(String),
    NotFound,
}

/// All targets of one document, plus the id map for target stamping
#[derive(Debug)]
pub struct DocumentTargets {
    pub path: VirtualPath,
    definitions: HashMap<String, TargetResolver>,
    headers: Vec<TargetResolver>,
    pub anonymous: VecDeque<TargetResolver>,
    pub autonumber: VecDeque<TargetResolver>,
    pub autosymbol: VecDeque<TargetResolver>,
    pub id_map: IdMap,
}

impl DocumentTargets {
    /// Unique-id lookup over non-header targets. Cross-document lookups see
    /// only global targets.
    pub fn lookup_definition(&self, name: &str, cross_doc: bool) -> Option<&TargetResolver> {
        let resolver = self.definitions.get(&name.to_lowercase())?;
        if cross_doc && !resolver.global {
            return None;
        }
        Some(resolver)
    }

    /// All headers whose headline text matches `name` (case-insensitive)
    pub fn headline_candidates(&self, name: &str) -> Vec<&TargetResolver> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .filter(|resolver| match &resolver.kind {
                TargetKind::Header { headline, .. } => headline == &name,
                _ => false,
            })
            .collect()
    }

    /// Header lookup by assigned slug id
    pub fn lookup_header_slug(&self, name: &str) -> Option<&TargetResolver> {
        self.headers
            .iter()
            .find(|resolver| resolver.render_id == name)
    }
}

/// Footnote display symbols, doubling after each full cycle
pub fn footnote_symbol(index: usize) -> String {
    const SYMBOLS: [char; 5] = ['*', '\u{2020}', '\u{2021}', '\u{00a7}', '\u{00b6}'];
    let symbol = SYMBOLS[index % SYMBOLS.len()];
    let repeat = index / SYMBOLS.len() + 1;
    symbol.to_string().repeat(repeat)
}

/// Scan one document and collect its targets
pub fn scan_document(doc: &Document) -> DocumentTargets {
    let mut scan = Scan {
        targets: DocumentTargets {
            path: doc.path.clone(),
            definitions: HashMap::new(),
            headers: Vec::new(),
            anonymous: VecDeque::new(),
            autonumber: VecDeque::new(),
            autosymbol: VecDeque::new(),
            id_map: IdMap::new(),
        },
        generator: IdGenerator::new(),
        pending_autonumber: Vec::new(),
        max_numeric: 0,
    };
    scan.blocks(&doc.content.content);
    scan.finish()
}

struct Scan {
    targets: DocumentTargets,
    generator: IdGenerator,
    /// Positions reserved for autonumber footnotes, resolved once the
    /// highest explicit number is known
    pending_autonumber: Vec<u32>,
    max_numeric: u32,
}

impl Scan {
    fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.block(block);
        }
    }

    fn items(&mut self, items: &[ListItem]) {
        for item in items {
            self.blocks(&item.content);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::LinkDefinition {
                id: Some(id),
                url,
                title,
                ..
            } => {
                self.define(
                    id,
                    TargetKind::LinkDefinition {
                        url: url.clone(),
                        title: title.clone(),
                    },
                    id.clone(),
                    true,
                );
            }
            Block::LinkDefinition {
                id: None,
                url,
                title,
                ..
            } => {
                let position = self.targets.anonymous.len() as u32 + 1;
                self.targets.anonymous.push_back(TargetResolver {
                    selector: Selector::Anonymous(position),
                    kind: TargetKind::LinkDefinition {
                        url: url.clone(),
                        title: title.clone(),
                    },
                    path: self.targets.path.clone(),
                    render_id: String::new(),
                    global: false,
                    duplicate: false,
                });
            }
            Block::FootnoteDefinition { label, content, .. } => {
                self.footnote(label);
                self.blocks(content);
            }
            Block::Footnote { label, content, .. } => {
                // Already-resolved footnotes keep their id addressable
                let render_id = block
                    .options()
                    .and_then(|o| o.id.clone())
                    .unwrap_or_else(|| format!("fn-{}", slug(label)));
                self.define(
                    label,
                    TargetKind::Footnote {
                        label: label.clone(),
                    },
                    render_id,
                    false,
                );
                self.blocks(content);
            }
            Block::Citation { label, content, .. } => {
                let render_id = block
                    .options()
                    .and_then(|o| o.id.clone())
                    .unwrap_or_else(|| self.generator.generate(&format!("citation-{}", slug(label))));
                self.define(label, TargetKind::Citation, render_id, false);
                self.blocks(content);
            }
            Block::Header(header) => {
                self.header(header.level, &header.text(), header.options.id.as_deref());
            }
            Block::Section {
                header, content, ..
            } => {
                self.header(header.level, &header.text(), header.options.id.as_deref());
                self.blocks(content);
            }
            Block::QuotedBlock { content, .. }
            | Block::BlockSequence { content, .. }
            | Block::EmbeddedRoot { content, .. } => self.blocks(content),
            Block::BulletList { items, .. } | Block::EnumList { items, .. } => self.items(items),
            other => {
                // Any other node carrying an explicit id is addressable
                if let Some(id) = other.options().and_then(|o| o.id.clone()) {
                    self.define(&id, TargetKind::BlockId, id.clone(), true);
                }
            }
        }
    }

    fn header(&mut self, level: u32, text: &str, existing_id: Option<&str>) {
        let suggestion = match existing_id {
            Some(id) => id.to_string(),
            None => slug(text),
        };
        let final_id = self.generator.generate(&suggestion);
        self.targets.id_map.register(&suggestion, final_id.clone());
        self.targets.headers.push(TargetResolver {
            selector: Selector::UniqueId(final_id.clone()),
            kind: TargetKind::Header {
                level,
                headline: text.to_lowercase(),
            },
            path: self.targets.path.clone(),
            render_id: final_id,
            global: true,
        duplicate: false,
        });
    }

    fn footnote(&mut self, label: &FootnoteLabel) {
        match label {
            FootnoteLabel::Named(name) => {
                let render_id = self.generator.generate(&format!("fn-{}", slug(name)));
                self.define(
                    name,
                    TargetKind::Footnote {
                        label: name.clone(),
                    },
                    render_id,
                    false,
                );
            }
            FootnoteLabel::Numeric(number) => {
                self.max_numeric = self.max_numeric.max(*number);
                let render_id = self.generator.generate(&format!("fn-{}", number));
                self.define(
                    &number.to_string(),
                    TargetKind::Footnote {
                        label: number.to_string(),
                    },
                    render_id,
                    false,
                );
            }
            FootnoteLabel::Autonumber => {
                let position = self.pending_autonumber.len() as u32 + 1;
                self.pending_autonumber.push(position);
            }
            FootnoteLabel::Autosymbol => {
                let index = self.targets.autosymbol.len();
                let symbol = footnote_symbol(index);
                self.targets.autosymbol.push_back(TargetResolver {
                    selector: Selector::Autosymbol(index as u32 + 1),
                    kind: TargetKind::Footnote { label: symbol },
                    path: self.targets.path.clone(),
                    render_id: format!("fnsym-{}", index + 1),
                    global: false,
                    duplicate: false,
                });
            }
        }
    }

    fn define(&mut self, name: &str, kind: TargetKind, render_id: String, global: bool) {
        let key = name.to_lowercase();
        match self.targets.definitions.get_mut(&key) {
            Some(existing) => existing.duplicate = true,
            None => {
                self.targets.definitions.insert(
                    key.clone(),
                    TargetResolver {
                        selector: Selector::UniqueId(key),
                        kind,
                        path: self.targets.path.clone(),
                        render_id,
                        global,
                        duplicate: false,
                    },
                );
            }
        }
    }

    fn finish(mut self) -> DocumentTargets {
        // Autonumber footnotes continue past the highest explicit number.
        let start = self.max_numeric + 1;
        for (offset, position) in self.pending_autonumber.iter().enumerate() {
            let number = start + offset as u32;
            self.targets.autonumber.push_back(TargetResolver {
                selector: Selector::Autonumber(*position),
                kind: TargetKind::Footnote {
                    label: number.to_string(),
                },
                path: self.targets.path.clone(),
                render_id: format!("fn-{}", number),
                global: false,
                duplicate: false,
            });
        }
        self.targets
    }
}

/// Resolve a name against a set of documents forming one scope
///
/// Lookup order inside a scope: unique non-header ids first, then headers
/// by headline text (the shallower level wins; a tie is ambiguous), then
/// headers by assigned slug. More than one unique-id match is a duplicate,
/// never a silent pick.
pub fn resolve_in_scope<'a>(
    name: &str,
    docs: &[&'a DocumentTargets],
    cross_doc: bool,
) -> Resolution<'a> {
    let definitions: Vec<&TargetResolver> = docs
        .iter()
        .filter_map(|targets| targets.lookup_definition(name, cross_doc))
        .collect();
    if definitions.iter().any(|resolver| resolver.duplicate) || definitions.len() > 1 {
        return Resolution::Duplicate(name.to_string());
    }
    if let Some(resolver) = definitions.first() {
        return Resolution::Target(resolver);
    }

    let slugs: Vec<&TargetResolver> = docs
        .iter()
        .filter_map(|targets| targets.lookup_header_slug(name))
        .collect();

    let headline: Vec<&TargetResolver> = docs
        .iter()
        .flat_map(|targets| targets.headline_candidates(name))
        .collect();
    if !headline.is_empty() {
        let min_level = headline
            .iter()
            .map(|resolver| match &resolver.kind {
                TargetKind::Header { level, .. } => *level,
                _ => u32::MAX,
            })
            .min()
            .expect("non-empty candidate list");
        let at_min: Vec<&TargetResolver> = headline
            .into_iter()
            .filter(|resolver| {
                matches!(&resolver.kind, TargetKind::Header { level, .. } if *level == min_level)
            })
            .collect();
        if at_min.len() == 1 {
            return Resolution::Target(at_min[0]);
        }
        // Same headline at the same level. Deduplicated slugs can still
        // single out one header (two "Intro" headers in one document get
        // "intro" and "intro-1"); across documents the slugs collide too
        // and the reference stays a hard error.
        return match slugs.len() {
            1 => Resolution::Target(slugs[0]),
            _ => Resolution::Ambiguous(name.to_string()),
        };
    }

    match slugs.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Target(slugs[0]),
        _ => Resolution::Duplicate(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use tome_parser::ast::{Block, Header, Options, RootElement, Span};

    fn doc_with(path: &str, blocks: Vec<Block>) -> Document {
        Document::new(VirtualPath::parse(path), RootElement::new(blocks))
    }

    fn header(level: u32, text: &str) -> Block {
        Block::Header(Header::new(level, vec![Span::text(text)]))
    }

    #[test]
    fn test_header_id_collision_dedupes() {
        let doc = doc_with(
            "/a.md",
            vec![header(1, "Intro"), header(2, "Intro")],
        );
        let targets = scan_document(&doc);

        assert!(targets.lookup_header_slug("intro").is_some());
        assert!(targets.lookup_header_slug("intro-1").is_some());

        let mut id_map = targets.id_map;
        assert_eq!(id_map.next_for("intro").as_deref(), Some("intro"));
        assert_eq!(id_map.next_for("intro").as_deref(), Some("intro-1"));
    }

    #[test]
    fn test_duplicate_link_definition_fails_lookup() {
        let doc = doc_with(
            "/a.md",
            vec![
                Block::LinkDefinition {
                    id: Some("ref".into()),
                    url: "http://one.example".into(),
                    title: None,
                    options: Options::new(),
                },
                Block::LinkDefinition {
                    id: Some("ref".into()),
                    url: "http://two.example".into(),
                    title: None,
                    options: Options::new(),
                },
            ],
        );
        let targets = scan_document(&doc);
        match resolve_in_scope("ref", &[&targets], false) {
            Resolution::Duplicate(name) => assert_eq!(name, "ref"),
            other => panic!("Expected duplicate, got {:?}", other),
        }
    }

    #[test]
    fn test_headline_level_disambiguation() {
        // Level 1 and level 3 share a headline in the same document; the
        // shallower one wins.
        let doc = doc_with(
            "/a.md",
            vec![header(3, "Introduction"), header(1, "Introduction")],
        );
        let targets = scan_document(&doc);
        match resolve_in_scope("Introduction", &[&targets], false) {
            Resolution::Target(resolver) => match &resolver.kind {
                TargetKind::Header { level, .. } => assert_eq!(*level, 1),
                other => panic!("Expected header, got {:?}", other),
            },
            other => panic!("Expected target, got {:?}", other),
        }
    }

    #[test]
    fn test_same_level_headline_is_ambiguous() {
        let one = doc_with("/a.md", vec![header(2, "Introduction")]);
        let two = doc_with("/b.md", vec![header(2, "Introduction")]);
        let targets_one = scan_document(&one);
        let targets_two = scan_document(&two);

        match resolve_in_scope("Introduction", &[&targets_one, &targets_two], true) {
            Resolution::Ambiguous(name) => assert_eq!(name, "Introduction"),
            other => panic!("Expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_autonumber_continues_past_explicit_numbers() {
        let doc = doc_with(
            "/a.md",
            vec![
                Block::FootnoteDefinition {
                    label: tome_parser::ast::FootnoteLabel::Numeric(4),
                    content: vec![],
                    options: Options::new(),
                },
                Block::FootnoteDefinition {
                    label: tome_parser::ast::FootnoteLabel::Autonumber,
                    content: vec![],
                    options: Options::new(),
                },
            ],
        );
        let targets = scan_document(&doc);
        let first = targets.autonumber.front().expect("autonumber target");
        match &first.kind {
            TargetKind::Footnote { label } => assert_eq!(label, "5"),
            other => panic!("Expected footnote, got {:?}", other),
        }
    }

    #[test]
    fn test_footnote_symbols_cycle_and_double() {
        assert_eq!(footnote_symbol(0), "*");
        assert_eq!(footnote_symbol(4), "\u{00b6}");
        assert_eq!(footnote_symbol(5), "**");
    }
}
