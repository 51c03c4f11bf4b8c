//! JSON snapshots of the AST
//!
//! Inspect tooling and tests want a stable, diffable rendering of a parsed
//! tree. The AST derives `Serialize`, so a snapshot is just the
//! pretty-printed JSON form.

use super::blocks::RootElement;

/// Pretty-printed JSON snapshot of a document root
pub fn to_json(root: &RootElement) -> String {
    serde_json::to_string_pretty(root).unwrap_or_else(|err| format!("<serialize error: {}>", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Span};

    #[test]
    fn test_snapshot_contains_node_kinds() {
        let root = RootElement::new(vec![Block::paragraph(vec![Span::text("hi")])]);
        let json = to_json(&root);
        assert!(json.contains("Paragraph"));
        assert!(json.contains("hi"));
    }
}
