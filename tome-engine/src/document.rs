//! Documents and document trees
//!
//! A [`Document`] is one parsed markup file: its path, root AST, named
//! fragments, config (chained to its directory's config), and its position
//! in the tree. Rewrite passes never mutate a document - they produce a new
//! value that replaces it in a rebuilt tree.
//!
//! A [`DocumentTree`] mirrors the directory structure: documents and
//! subtrees as ordered children, directory-level config, and the templates
//! declared at that level. Trees are built bottom-up once all documents have
//! been parsed; only after that may cross-document rewriting begin.

use crate::path::VirtualPath;
use crate::templates::TemplateDocument;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tome_config::Config;
use tome_parser::ast::{Block, RootElement};

/// Classification of one input, supplied by the driver layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markup,
    Template,
    Config,
    Static,
    Ignored,
}

/// One input handed to the engine: a virtual path, the raw text, and its
/// classification
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub path: VirtualPath,
    pub text: String,
    pub kind: DocumentKind,
}

impl DocumentInput {
    pub fn new(path: &str, text: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            path: VirtualPath::parse(path),
            text: text.into(),
            kind,
        }
    }

    pub fn markup(path: &str, text: impl Into<String>) -> Self {
        Self::new(path, text, DocumentKind::Markup)
    }
}

/// A document's position in the tree: 1-based child indices from the root
///
/// Positions order documents depth-first and provide the digits for
/// document-level autonumbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TreePosition(Vec<usize>);

impl TreePosition {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for TreePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", index)?;
            first = false;
        }
        Ok(())
    }
}

/// One parsed markup document
#[derive(Debug, Clone)]
pub struct Document {
    pub path: VirtualPath,
    pub content: RootElement,
    pub fragments: BTreeMap<String, Block>,
    pub config: Arc<Config>,
    pub position: TreePosition,
}

impl Document {
    pub fn new(path: VirtualPath, content: RootElement) -> Self {
        Self {
            path,
            content,
            fragments: BTreeMap::new(),
            config: Arc::new(Config::empty()),
            position: TreePosition::root(),
        }
    }

    /// A new value with the content replaced; everything else carries over
    pub fn with_content(&self, content: RootElement) -> Self {
        Self {
            content,
            ..self.clone()
        }
    }

    /// The document's title: the first top-level header or section header
    pub fn title(&self) -> Option<String> {
        self.content.content.iter().find_map(|block| match block {
            Block::Header(header) => Some(header.text()),
            Block::Section { header, .. } => Some(header.text()),
            _ => None,
        })
    }
}

/// A child of a document tree: a document or a nested subtree
#[derive(Debug, Clone)]
pub enum TreeNode {
    Doc(Document),
    Tree(DocumentTree),
}

/// One directory level of the project
#[derive(Debug, Clone)]
pub struct DocumentTree {
    pub path: VirtualPath,
    pub children: Vec<TreeNode>,
    pub config: Arc<Config>,
    pub templates: Vec<TemplateDocument>,
    pub position: TreePosition,
}

impl DocumentTree {
    pub fn new(path: VirtualPath) -> Self {
        Self {
            path,
            children: Vec::new(),
            config: Arc::new(Config::empty()),
            templates: Vec::new(),
            position: TreePosition::root(),
        }
    }

    /// Find a document anywhere under this tree by its exact path
    pub fn select_document(&self, path: &VirtualPath) -> Option<&Document> {
        for child in &self.children {
            match child {
                TreeNode::Doc(doc) if &doc.path == path => return Some(doc),
                TreeNode::Tree(tree) if path.is_under(&tree.path) => {
                    if let Some(found) = tree.select_document(path) {
                        return Some(found);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// All documents under this tree, depth-first in child order
    pub fn documents(&self) -> Vec<&Document> {
        let mut docs = Vec::new();
        self.collect_documents(&mut docs);
        docs
    }

    fn collect_documents<'a>(&'a self, out: &mut Vec<&'a Document>) {
        for child in &self.children {
            match child {
                TreeNode::Doc(doc) => out.push(doc),
                TreeNode::Tree(tree) => tree.collect_documents(out),
            }
        }
    }
}
