//! The document AST
//!
//! A parsed document is a tree of typed nodes in two shape families:
//! [`Block`] elements start on their own visual line, [`Span`] elements are
//! inline. Orthogonally, a node either contains child nodes (a container)
//! or a raw text leaf. Every node carries an [`Options`] value (optional id
//! plus style names) used for id-based lookup during rewriting; parsing
//! never touches it.
//!
//! Node identity is structural: two nodes are equal when their values are
//! equal. No node stores a pointer to its parent - parent navigation exists
//! only through the ephemeral cursors built for the rewrite phase.
//!
//! Reference nodes ([`Span::LinkReference`], [`Span::ImageReference`],
//! [`Span::FootnoteReference`], [`Span::CitationReference`], and the
//! target-defining blocks that feed them) are transient: the rewrite phase
//! must replace or remove all of them. A reference node surviving rewriting
//! is a defect and is surfaced as an invalid node rather than rendered.

pub mod blocks;
pub mod message;
pub mod options;
pub mod rewrite;
pub mod snapshot;
pub mod spans;

pub use blocks::{Block, Header, ListItem, RootElement};
pub use message::{MessageFilter, MessageLevel, SystemMessage};
pub use options::Options;
pub use rewrite::{rewrite_blocks, rewrite_root, rewrite_spans, RewriteAction, RewriteRule};
pub use spans::{FootnoteLabel, LinkId, LinkTarget, Span};
