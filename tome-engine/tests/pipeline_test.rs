//! Whole-project pipeline behavior
//!
//! Exercises the standard parse -> assemble -> rewrite -> merge pipeline:
//! tree assembly with positions and config fallback, autonumbering driven
//! by directory config, template selection and merging, and the error
//! collection contract (one broken document never blocks its siblings).

use rstest::rstest;
use tome_engine::pipeline::stages::transform_project;
use tome_engine::{DocumentInput, DocumentKind, VirtualPath};
use tome_parser::ast::{Block, MessageLevel, Span};

fn config_input(path: &str, text: &str) -> DocumentInput {
    DocumentInput::new(path, text, DocumentKind::Config)
}

fn first_section_label(content: &[Block]) -> Option<String> {
    content.iter().find_map(|block| match block {
        Block::Section { header, .. } => match header.content.first() {
            Some(Span::Text { content, options })
                if options.styles.iter().any(|s| s == "section-number") =>
            {
                Some(content.clone())
            }
            _ => None,
        },
        _ => None,
    })
}

#[test]
fn documents_get_tree_positions_in_input_order() {
    let result = transform_project(vec![
        DocumentInput::markup("/one.md", "# One\n"),
        DocumentInput::markup("/sub/nested.md", "# Nested\n"),
        DocumentInput::markup("/two.md", "# Two\n"),
    ])
    .expect("pipeline");

    let positions: Vec<(String, String)> = result
        .tree
        .documents()
        .iter()
        .map(|doc| (doc.path.to_string(), doc.position.to_string()))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("/one.md".to_string(), "1".to_string()),
            ("/sub/nested.md".to_string(), "2.1".to_string()),
            ("/two.md".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn directory_config_drives_autonumbering() {
    let result = transform_project(vec![
        config_input("/directory.conf", "autonumbering:\n  scope: all\n"),
        DocumentInput::markup("/one.md", "# Alpha\n\n## Alpha Sub\n"),
        DocumentInput::markup("/two.md", "# Beta\n"),
    ])
    .expect("pipeline");

    let docs = result.tree.documents();
    assert_eq!(
        first_section_label(&docs[0].content.content).as_deref(),
        Some("1.1 ")
    );
    assert_eq!(
        first_section_label(&docs[1].content.content).as_deref(),
        Some("2.1 ")
    );

    // The nested section carries the full dotted path.
    match &docs[0].content.content[0] {
        Block::Section { content, .. } => {
            assert_eq!(first_section_label(content).as_deref(), Some("1.1.1 "));
        }
        other => panic!("Expected section, got {:?}", other),
    }
}

#[rstest]
#[case("none")]
#[case("documents")]
fn scopes_without_section_numbers_leave_sections_unlabeled(#[case] scope: &str) {
    let result = transform_project(vec![
        config_input(
            "/directory.conf",
            &format!("autonumbering:\n  scope: {}\n", scope),
        ),
        DocumentInput::markup("/a.md", "intro\n\n# Alpha\n\n## Sub\n"),
    ])
    .expect("pipeline");

    let doc = &result.tree.documents()[0];
    // Sections below the document title never get labels in these scopes.
    match &doc.content.content[1] {
        Block::Section { content, .. } => assert_eq!(first_section_label(content), None),
        other => panic!("Expected section, got {:?}", other),
    }
}

#[test]
fn front_matter_overrides_directory_config() {
    let result = transform_project(vec![
        config_input("/directory.conf", "autonumbering:\n  scope: all\n"),
        DocumentInput::markup(
            "/quiet.md",
            "---\nautonumbering:\n  scope: none\n---\n# Quiet\n",
        ),
        DocumentInput::markup("/loud.md", "# Loud\n"),
    ])
    .expect("pipeline");

    let docs = result.tree.documents();
    assert_eq!(first_section_label(&docs[0].content.content), None);
    assert!(first_section_label(&docs[1].content.content).is_some());
}

#[test]
fn template_merge_wraps_document_content() {
    let result = transform_project(vec![
        DocumentInput::new(
            "/default.template.html",
            "<html><body>{{document.content}}</body></html>",
            DocumentKind::Template,
        ),
        DocumentInput::markup("/page.md", "# Page\n"),
    ])
    .expect("pipeline");

    let merged = result
        .merged
        .get(&VirtualPath::parse("/page.md"))
        .expect("merged output");
    assert_eq!(merged.content.len(), 3);
    match (&merged.content[0], &merged.content[1], &merged.content[2]) {
        (
            Block::RawContent { text: before, .. },
            Block::EmbeddedRoot { content, .. },
            Block::RawContent { text: after, .. },
        ) => {
            assert_eq!(before, "<html><body>");
            assert!(matches!(content[0], Block::Section { .. }));
            assert_eq!(after, "</body></html>");
        }
        other => panic!("Expected template sandwich, got {:?}", other),
    }
}

#[test]
fn nearest_template_wins() {
    let result = transform_project(vec![
        DocumentInput::new(
            "/default.template.html",
            "root: {{document.content}}",
            DocumentKind::Template,
        ),
        DocumentInput::new(
            "/sub/default.template.html",
            "sub: {{document.content}}",
            DocumentKind::Template,
        ),
        DocumentInput::markup("/sub/page.md", "text\n"),
        DocumentInput::markup("/top.md", "text\n"),
    ])
    .expect("pipeline");

    let sub = result
        .merged
        .get(&VirtualPath::parse("/sub/page.md"))
        .expect("merged output");
    match &sub.content[0] {
        Block::RawContent { text, .. } => assert_eq!(text, "sub: "),
        other => panic!("Expected raw content, got {:?}", other),
    }

    let top = result
        .merged
        .get(&VirtualPath::parse("/top.md"))
        .expect("merged output");
    match &top.content[0] {
        Block::RawContent { text, .. } => assert_eq!(text, "root: "),
        other => panic!("Expected raw content, got {:?}", other),
    }
}

#[test]
fn documents_without_template_pass_through() {
    let result = transform_project(vec![DocumentInput::markup("/solo.md", "plain\n")])
        .expect("pipeline");
    let merged = result
        .merged
        .get(&VirtualPath::parse("/solo.md"))
        .expect("merged output");
    assert!(matches!(merged.content[0], Block::Paragraph { .. }));
}

#[test]
fn broken_front_matter_does_not_block_siblings() {
    let result = transform_project(vec![
        DocumentInput::markup("/broken.md", "---\na: [unclosed\n---\nbody\n"),
        DocumentInput::markup("/healthy.md", "# Fine\n"),
    ])
    .expect("pipeline");

    // The broken document is reported with its path and dropped; the
    // sibling is fully processed.
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, VirtualPath::parse("/broken.md"));
    assert!(result
        .tree
        .select_document(&VirtualPath::parse("/healthy.md"))
        .is_some());
    assert!(result
        .tree
        .select_document(&VirtualPath::parse("/broken.md"))
        .is_none());
}

#[test]
fn invalid_autonumbering_config_is_a_per_document_fatal() {
    let result = transform_project(vec![
        DocumentInput::markup(
            "/bad.md",
            "---\nautonumbering:\n  scope: sideways\n---\n# Title\n",
        ),
        DocumentInput::markup("/good.md", "# Fine\n"),
    ])
    .expect("pipeline");

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, VirtualPath::parse("/bad.md"));
    // The document itself still flows through, resolved but unnumbered.
    let bad = result
        .tree
        .select_document(&VirtualPath::parse("/bad.md"))
        .expect("document present");
    assert!(matches!(bad.content.content[0], Block::Section { .. }));
}

#[test]
fn unresolved_references_surface_in_collected_messages() {
    let result = transform_project(vec![DocumentInput::markup(
        "/doc.md",
        "See [missing].\n",
    )])
    .expect("pipeline");

    assert_eq!(result.messages.len(), 1);
    let (path, message) = &result.messages[0];
    assert_eq!(path, &VirtualPath::parse("/doc.md"));
    assert_eq!(message.level, MessageLevel::Error);
    assert_eq!(message.content, "unresolved link reference: missing");
}

#[test]
fn static_and_ignored_inputs_are_skipped() {
    let result = transform_project(vec![
        DocumentInput::new("/style.css", "body {}", DocumentKind::Static),
        DocumentInput::new("/notes.txt", "scratch", DocumentKind::Ignored),
        DocumentInput::markup("/doc.md", "text\n"),
    ])
    .expect("pipeline");

    assert_eq!(result.tree.documents().len(), 1);
    assert_eq!(result.merged.len(), 1);
}
