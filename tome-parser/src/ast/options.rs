//! Per-node options: identifier and style names

use serde::Serialize;

/// Optional metadata carried by every AST node
///
/// The id is the hook for reference resolution and target lookup; styles are
/// opaque names a renderer may map to classes. Parsing leaves options
/// untouched except where the markup explicitly assigns them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    pub id: Option<String>,
    pub styles: Vec<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            styles: Vec::new(),
        }
    }

    pub fn with_style(style: impl Into<String>) -> Self {
        Self {
            id: None,
            styles: vec![style.into()],
        }
    }

    /// Return a copy with the id replaced
    pub fn set_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            styles: self.styles.clone(),
        }
    }

    pub fn add_style(&mut self, style: impl Into<String>) {
        self.styles.push(style.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_id_keeps_styles() {
        let mut options = Options::with_style("warning");
        options.add_style("inline");

        let stamped = options.set_id("note-1");
        assert_eq!(stamped.id.as_deref(), Some("note-1"));
        assert_eq!(stamped.styles, vec!["warning", "inline"]);
    }
}
