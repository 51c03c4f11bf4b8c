//! # tome-engine
//!
//! The cross-document half of the tome engine: virtual paths, document
//! trees assembled from classified inputs, cursor-based navigation, the
//! link/reference resolver, section building with autonumbering, template
//! merging, and the composable pipeline tying the stages together.
//!
//! The split from `tome-parser` mirrors the coordination boundary: parsing
//! is pure per document and needs no knowledge of the tree; everything in
//! this crate runs after all documents are parsed, reads the assembled
//! tree through immutable cursors, and writes only per-document
//! replacement values.

pub mod cursor;
pub mod document;
pub mod error;
pub mod ids;
pub mod path;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod sections;
pub mod targets;
pub mod templates;

pub use document::{Document, DocumentInput, DocumentKind, DocumentTree, TreeNode, TreePosition};
pub use error::{EngineError, PathError};
pub use path::VirtualPath;
pub use pipeline::stages::{transform_project, TransformedTree};
