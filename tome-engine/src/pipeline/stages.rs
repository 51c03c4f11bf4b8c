//! The standard pipeline stages
//!
//! `ParseDocuments` turns classified inputs into parsed documents,
//! templates and directory configs; `AssembleTree` builds the document tree
//! bottom-up, wiring config fallback chains and assigning tree positions;
//! `RewriteTree` runs the cursor-driven rewrite passes (reference
//! resolution, section building, autonumbering) per document;
//! `ApplyTemplates` merges each rewritten document into its nearest
//! template. Per-document fatal errors are collected per path and carried
//! through - a failing document never blocks its siblings.

use crate::cursor::{DocumentCursor, TreeCursor};
use crate::document::{
    Document, DocumentInput, DocumentKind, DocumentTree, TreeNode, TreePosition,
};
use crate::error::PathError;
use crate::path::VirtualPath;
use crate::pipeline::{Runnable, Transform, TransformError};
use crate::report::collect_messages;
use crate::resolver::{LinkResolver, ProjectIndex};
use crate::sections::{build_sections, number_sections};
use crate::templates::{merge, select_template, TemplateDocument};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Arc;
use tome_config::Config;
use tome_parser::ast::{rewrite_root, RootElement, SystemMessage};
use tome_parser::markdown;

/// Output of the parse stage
pub struct ParsedProject {
    pub documents: Vec<Document>,
    pub templates: Vec<TemplateDocument>,
    pub dir_configs: BTreeMap<VirtualPath, Config>,
    pub errors: Vec<PathError>,
}

/// Parse every classified input with the Markdown dialect
pub struct ParseDocuments;

impl Runnable<Vec<DocumentInput>, ParsedProject> for ParseDocuments {
    fn run(&self, inputs: Vec<DocumentInput>) -> Result<ParsedProject, TransformError> {
        let parser = markdown::parser();
        let mut project = ParsedProject {
            documents: Vec::new(),
            templates: Vec::new(),
            dir_configs: BTreeMap::new(),
            errors: Vec::new(),
        };

        for input in inputs {
            let DocumentInput { path, text, kind } = input;
            match kind {
                DocumentKind::Markup => {
                    let (front, body) = markdown::extract_front_matter(&text);
                    let config = match front.map(Config::from_yaml_str).transpose() {
                        Ok(config) => config.unwrap_or_else(Config::empty),
                        Err(err) => {
                            project.errors.push(PathError::new(path, err));
                            continue;
                        }
                    };
                    let mut doc = Document::new(path, parser.parse_document(body));
                    doc.config = Arc::new(config);
                    project.documents.push(doc);
                }
                DocumentKind::Template => {
                    project.templates.push(TemplateDocument::parse(path, &text));
                }
                DocumentKind::Config => match Config::from_yaml_str(&text) {
                    Ok(config) => {
                        project.dir_configs.insert(path.parent(), config);
                    }
                    Err(err) => project.errors.push(PathError::new(path, err)),
                },
                DocumentKind::Static | DocumentKind::Ignored => {}
            }
        }
        Ok(project)
    }
}

/// A built tree plus the errors collected so far
pub struct ProjectTree {
    pub tree: DocumentTree,
    pub errors: Vec<PathError>,
}

/// Assemble the document tree bottom-up
pub struct AssembleTree;

impl Runnable<ParsedProject, ProjectTree> for AssembleTree {
    fn run(&self, mut project: ParsedProject) -> Result<ProjectTree, TransformError> {
        let root = build_tree(
            &VirtualPath::root(),
            project.documents,
            &project.templates,
            &mut project.dir_configs,
            None,
            TreePosition::root(),
        );
        Ok(ProjectTree {
            tree: root,
            errors: project.errors,
        })
    }
}

enum Entry {
    Doc(Document),
    Dir(String, Vec<Document>),
}

fn build_tree(
    dir: &VirtualPath,
    docs: Vec<Document>,
    templates: &[TemplateDocument],
    dir_configs: &mut BTreeMap<VirtualPath, Config>,
    parent_config: Option<Arc<Config>>,
    position: TreePosition,
) -> DocumentTree {
    let own_config = dir_configs.remove(dir).unwrap_or_else(Config::empty);
    let config = Arc::new(match parent_config {
        Some(parent) => own_config.with_fallback(parent),
        None => own_config,
    });

    // Children keep the input order of first appearance; documents and
    // subdirectories share one index sequence for tree positions.
    let mut entries: Vec<Entry> = Vec::new();
    for doc in docs {
        if doc.path.parent() == *dir {
            entries.push(Entry::Doc(doc));
            continue;
        }
        let segment = match doc.path.segment_after(dir) {
            Some(segment) => segment.to_string(),
            None => continue,
        };
        match entries.iter_mut().find_map(|entry| match entry {
            Entry::Dir(name, docs) if *name == segment => Some(docs),
            _ => None,
        }) {
            Some(bucket) => bucket.push(doc),
            None => entries.push(Entry::Dir(segment, vec![doc])),
        }
    }

    let mut children = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let child_position = position.child(index + 1);
        match entry {
            Entry::Doc(mut doc) => {
                doc.position = child_position;
                let front = (*doc.config).clone();
                doc.config = Arc::new(front.with_fallback(Arc::clone(&config)));
                children.push(TreeNode::Doc(doc));
            }
            Entry::Dir(name, docs) => {
                let child_dir = dir.join(&name);
                let subtree = build_tree(
                    &child_dir,
                    docs,
                    templates,
                    dir_configs,
                    Some(Arc::clone(&config)),
                    child_position,
                );
                children.push(TreeNode::Tree(subtree));
            }
        }
    }

    let own_templates: Vec<TemplateDocument> = templates
        .iter()
        .filter(|template| template.path.parent() == *dir)
        .cloned()
        .collect();

    DocumentTree {
        path: dir.clone(),
        children,
        config,
        templates: own_templates,
        position,
    }
}

/// Run the rewrite phase over every document
///
/// Requires the fully assembled tree: reference resolution reads sibling
/// and ancestor documents through the cursor. Each document's rewrite only
/// writes its own replacement value.
pub struct RewriteTree;

impl Runnable<ProjectTree, ProjectTree> for RewriteTree {
    fn run(&self, project: ProjectTree) -> Result<ProjectTree, TransformError> {
        let index = ProjectIndex::scan(&project.tree);
        let mut errors = project.errors;
        let cursor = TreeCursor::root(&project.tree);
        let tree = rewrite_level(&cursor, &index, &mut errors);
        Ok(ProjectTree { tree, errors })
    }
}

fn rewrite_level(
    cursor: &TreeCursor<'_>,
    index: &ProjectIndex,
    errors: &mut Vec<PathError>,
) -> DocumentTree {
    let source = cursor.tree;
    let mut children = Vec::with_capacity(source.children.len());
    for child in &source.children {
        match child {
            TreeNode::Doc(doc) => {
                let doc_cursor = DocumentCursor {
                    document: doc,
                    parent: cursor.clone(),
                };
                children.push(TreeNode::Doc(rewrite_document(&doc_cursor, index, errors)));
            }
            TreeNode::Tree(subtree) => {
                let child_cursor = cursor.child(subtree);
                children.push(TreeNode::Tree(rewrite_level(&child_cursor, index, errors)));
            }
        }
    }
    DocumentTree {
        path: source.path.clone(),
        children,
        config: Arc::clone(&source.config),
        templates: source.templates.clone(),
        position: source.position.clone(),
    }
}

fn rewrite_document(
    cursor: &DocumentCursor<'_>,
    index: &ProjectIndex,
    errors: &mut Vec<PathError>,
) -> Document {
    let doc = cursor.document;
    let mut rule = LinkResolver::new(cursor, index);
    let resolved = rewrite_root(&doc.content, &mut rule);
    let sectioned = RootElement::new(build_sections(resolved.content));
    let content = match number_sections(sectioned.clone(), &doc.position, &doc.config) {
        Ok(numbered) => numbered,
        Err(err) => {
            // Numbering failed fatally for this document; its resolved but
            // unnumbered content still flows on.
            errors.push(PathError::new(doc.path.clone(), err));
            sectioned
        }
    };
    doc.with_content(content)
}

/// The final output: the rewritten tree, per-document merged ASTs, and all
/// collected diagnostics
pub struct TransformedTree {
    pub tree: DocumentTree,
    pub merged: BTreeMap<VirtualPath, RootElement>,
    pub errors: Vec<PathError>,
    pub messages: Vec<(VirtualPath, SystemMessage)>,
}

/// Merge every document into its nearest template
pub struct ApplyTemplates;

impl Runnable<ProjectTree, TransformedTree> for ApplyTemplates {
    fn run(&self, project: ProjectTree) -> Result<TransformedTree, TransformError> {
        let mut merged = BTreeMap::new();
        let mut messages = Vec::new();
        let cursor = TreeCursor::root(&project.tree);
        for doc_cursor in cursor.documents() {
            let doc = doc_cursor.document;
            let output = match select_template(&doc_cursor.scope_chain()) {
                Some(template) => merge(&template.root, doc),
                None => doc.content.clone(),
            };
            for message in collect_messages(&output) {
                messages.push((doc.path.clone(), message));
            }
            merged.insert(doc.path.clone(), output);
        }
        Ok(TransformedTree {
            tree: project.tree,
            merged,
            errors: project.errors,
            messages,
        })
    }
}

/// The standard whole-project pipeline
pub static STANDARD: Lazy<Transform<Vec<DocumentInput>, TransformedTree>> = Lazy::new(|| {
    Transform::from_fn(Ok)
        .then(ParseDocuments)
        .then(AssembleTree)
        .then(RewriteTree)
        .then(ApplyTemplates)
});

/// Transform a whole project through the standard pipeline
pub fn transform_project(inputs: Vec<DocumentInput>) -> Result<TransformedTree, TransformError> {
    STANDARD.run(inputs)
}
