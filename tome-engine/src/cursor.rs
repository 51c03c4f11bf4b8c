//! Cursors: ephemeral parent-aware views
//!
//! The AST and the document tree store no parent pointers. When a rewrite
//! pass needs to look outward - "search my parent directory, then walk up
//! to the root" - it navigates through a cursor: a lightweight value holding
//! the current node plus a chain to its ancestors. Cursors are constructed
//! freshly for each traversal and navigation returns new cursor values;
//! nothing hands out a mutable view into another document's tree.

use crate::document::{Document, DocumentTree, TreeNode};

/// A view of one tree node plus the chain to its ancestors
#[derive(Clone)]
pub struct TreeCursor<'a> {
    pub tree: &'a DocumentTree,
    parent: Option<Box<TreeCursor<'a>>>,
}

impl<'a> TreeCursor<'a> {
    /// A cursor at the root of a tree
    pub fn root(tree: &'a DocumentTree) -> Self {
        Self { tree, parent: None }
    }

    pub fn parent(&self) -> Option<&TreeCursor<'a>> {
        self.parent.as_deref()
    }

    /// Cursor for a child subtree of this node
    pub fn child(&self, tree: &'a DocumentTree) -> TreeCursor<'a> {
        TreeCursor {
            tree,
            parent: Some(Box::new(self.clone())),
        }
    }

    /// The scopes visible from here: this tree, then each ancestor up to
    /// the root
    pub fn scope_chain(&self) -> Vec<&'a DocumentTree> {
        let mut scopes = vec![self.tree];
        let mut current = self.parent();
        while let Some(cursor) = current {
            scopes.push(cursor.tree);
            current = cursor.parent();
        }
        scopes
    }

    /// Cursors for every document in this subtree, depth-first
    pub fn documents(&self) -> Vec<DocumentCursor<'a>> {
        let mut out = Vec::new();
        self.collect_documents(&mut out);
        out
    }

    fn collect_documents(&self, out: &mut Vec<DocumentCursor<'a>>) {
        for child in &self.tree.children {
            match child {
                TreeNode::Doc(doc) => out.push(DocumentCursor {
                    document: doc,
                    parent: self.clone(),
                }),
                TreeNode::Tree(subtree) => self.child(subtree).collect_documents(out),
            }
        }
    }
}

/// A view of one document plus the tree it sits in
#[derive(Clone)]
pub struct DocumentCursor<'a> {
    pub document: &'a Document,
    pub parent: TreeCursor<'a>,
}

impl<'a> DocumentCursor<'a> {
    /// The scopes searched for cross-document references: the document's
    /// own directory first, then each ancestor directory up to the root
    pub fn scope_chain(&self) -> Vec<&'a DocumentTree> {
        self.parent.scope_chain()
    }

    /// The root of the whole project tree
    pub fn root_tree(&self) -> &'a DocumentTree {
        *self
            .scope_chain()
            .last()
            .expect("scope chain always contains at least the parent tree")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentTree, TreeNode};
    use crate::path::VirtualPath;
    use tome_parser::ast::RootElement;

    fn tree_with_nested_doc() -> DocumentTree {
        let doc = Document::new(VirtualPath::parse("/a/b/leaf.md"), RootElement::default());
        let mut inner = DocumentTree::new(VirtualPath::parse("/a/b"));
        inner.children.push(TreeNode::Doc(doc));
        let mut mid = DocumentTree::new(VirtualPath::parse("/a"));
        mid.children.push(TreeNode::Tree(inner));
        let mut root = DocumentTree::new(VirtualPath::root());
        root.children.push(TreeNode::Tree(mid));
        root
    }

    #[test]
    fn test_scope_chain_walks_to_root() {
        let root = tree_with_nested_doc();
        let cursors = TreeCursor::root(&root).documents();
        assert_eq!(cursors.len(), 1);

        let scopes = cursors[0].scope_chain();
        let paths: Vec<String> = scopes.iter().map(|tree| tree.path.to_string()).collect();
        assert_eq!(paths, vec!["/a/b", "/a", "/"]);
    }

    #[test]
    fn test_root_tree() {
        let root = tree_with_nested_doc();
        let cursors = TreeCursor::root(&root).documents();
        assert_eq!(cursors[0].root_tree().path, VirtualPath::root());
    }
}
