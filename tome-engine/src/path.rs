//! Virtual paths
//!
//! Documents live at rooted, `/`-separated virtual paths (`/guide/intro.md`)
//! supplied by the driver layer; nothing here touches the real filesystem.
//! Cross-document links render as paths relative to the referring document,
//! computed with `pathdiff` over the virtual path strings.

use std::fmt;
use std::path::Path;

/// A rooted virtual path inside one document tree
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The tree root, `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path; leading slashes and empty segments are
    /// ignored, `.` and `..` are resolved
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_string()),
            }
        }
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, or empty for the root
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn parent(&self) -> VirtualPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Append a relative path
    pub fn join(&self, relative: &str) -> VirtualPath {
        let mut joined = self.clone();
        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    joined.segments.pop();
                }
                other => joined.segments.push(other.to_string()),
            }
        }
        joined
    }

    /// For a path under `dir`, the name of the next segment below `dir`
    ///
    /// `/a/b/c.md`.segment_after(`/a`) is `b`; used by tree assembly to
    /// discover the immediate subdirectories of a level.
    pub fn segment_after(&self, dir: &VirtualPath) -> Option<&str> {
        if !self.is_under(dir) {
            return None;
        }
        self.segments.get(dir.segments.len()).map(String::as_str)
    }

    /// Whether `self` lies inside the directory `dir`
    pub fn is_under(&self, dir: &VirtualPath) -> bool {
        self.segments.len() >= dir.segments.len()
            && self.segments[..dir.segments.len()] == dir.segments[..]
    }

    /// Render this path relative to the directory of the document at `from`
    ///
    /// This is what cross-document links embed: the target as seen from the
    /// referring document.
    pub fn relative_to(&self, from: &VirtualPath) -> String {
        let target = self.to_string();
        let base = from.parent().to_string();
        match pathdiff::diff_paths(Path::new(&target), Path::new(&base)) {
            Some(diff) => diff.to_string_lossy().into_owned(),
            None => target,
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            for segment in &self.segments {
                write!(f, "/{}", segment)?;
            }
            Ok(())
        }
    }
}
