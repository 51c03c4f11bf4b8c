//! # tome-parser
//!
//! Markup parser core for the tome document engine: a parser combinator
//! library with prefix-hinted dispatch, the format-agnostic document AST,
//! pluggable block/span parser registries, the recursive descent
//! orchestrator driving the multi-pass parse, and the built-in Markdown
//! dialect.
//!
//! Parsing one document is pure and side-effect-free: a [`parse::SourceFragment`]
//! plus a dialect's [`orchestrator::RootParser`] produce a
//! [`ast::RootElement`] with no shared mutable state, so independent
//! documents can be parsed concurrently without coordination. Everything
//! cross-document (reference resolution, section numbering, templates)
//! lives in the `tome-engine` crate on top of this one.

pub mod ast;
pub mod markdown;
pub mod orchestrator;
pub mod parse;
pub mod registry;
