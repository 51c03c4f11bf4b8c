//! System messages: the recoverable error tier
//!
//! Recoverable problems (unresolved references, duplicate target ids,
//! ambiguous matches) never abort a transformation on their own. They are
//! embedded into the AST as [`SystemMessage`] values inside invalid nodes,
//! each with a severity level. A [`MessageFilter`] is the policy knob that
//! decides which embedded messages fail the overall run and which are merely
//! rendered in place for debugging.

use serde::Serialize;
use std::fmt;

/// Severity of an embedded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MessageLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageLevel::Debug => "debug",
            MessageLevel::Info => "info",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
            MessageLevel::Fatal => "fatal",
        };
        write!(f, "{}", name)
    }
}

/// A message embedded in the AST, carrying severity and human-readable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl SystemMessage {
    pub fn new(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, content)
    }
}

impl fmt::Display for SystemMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.content)
    }
}

/// Policy for which embedded messages fail a transformation
///
/// The default fails on `Error` and above. `MessageFilter::none()` renders
/// everything in place instead, for visual debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageFilter {
    threshold: Option<MessageLevel>,
}

impl MessageFilter {
    /// Fail on messages at `level` or above
    pub fn at_least(level: MessageLevel) -> Self {
        Self {
            threshold: Some(level),
        }
    }

    /// Never fail; messages stay embedded in the output
    pub fn none() -> Self {
        Self { threshold: None }
    }

    pub fn matches(&self, message: &SystemMessage) -> bool {
        match self.threshold {
            Some(threshold) => message.level >= threshold,
            None => false,
        }
    }
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self::at_least(MessageLevel::Error)
    }
}
