//! Identifier generation and collision handling
//!
//! Targets suggest their own ids (a header suggests the slug of its title).
//! Suggestions collide; final ids must not. The [`IdGenerator`] deduplicates
//! by suffixing (`foo`, `foo-1`, `foo-2`), and the [`IdMap`] records, per
//! suggestion, the ordered sequence of final ids actually assigned. The
//! target-stamping rewrite later visits targets in the same document order
//! the pre-scan used, so popping the queue for a suggestion always yields
//! the id that was assigned to exactly that occurrence.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

/// Derive an identifier suggestion from display text
pub fn slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced = NON_SLUG.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches('-');
    if trimmed.is_empty() {
        "id".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hands out unique final ids for possibly-colliding suggestions
#[derive(Debug, Default)]
pub struct IdGenerator {
    used: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The suggestion itself when free, otherwise the first free
    /// `suggestion-N`
    pub fn generate(&mut self, suggestion: &str) -> String {
        if self.used.insert(suggestion.to_string()) {
            return suggestion.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{}-{}", suggestion, counter);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Suggested id -> ordered queue of assigned final ids
#[derive(Debug, Default)]
pub struct IdMap {
    queues: HashMap<String, VecDeque<String>>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `final_id` was assigned for `suggestion`
    pub fn register(&mut self, suggestion: &str, final_id: String) {
        self.queues
            .entry(suggestion.to_string())
            .or_default()
            .push_back(final_id);
    }

    /// Consume the next assigned id for `suggestion`, in assignment order
    pub fn next_for(&mut self, suggestion: &str) -> Option<String> {
        self.queues.get_mut(suggestion)?.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_normalizes() {
        assert_eq!(slug("Some Title!"), "some-title");
        assert_eq!(slug("  Weird -- Spacing  "), "weird-spacing");
        assert_eq!(slug("???"), "id");
    }

    #[test]
    fn test_generator_dedupes() {
        let mut generator = IdGenerator::new();
        assert_eq!(generator.generate("foo"), "foo");
        assert_eq!(generator.generate("foo"), "foo-1");
        assert_eq!(generator.generate("foo"), "foo-2");
        assert_eq!(generator.generate("bar"), "bar");
    }

    #[test]
    fn test_generator_skips_taken_suffix() {
        let mut generator = IdGenerator::new();
        assert_eq!(generator.generate("foo-1"), "foo-1");
        assert_eq!(generator.generate("foo"), "foo");
        // "foo-1" is taken by the explicit suggestion above.
        assert_eq!(generator.generate("foo"), "foo-2");
    }

    #[test]
    fn test_id_map_consumed_in_order() {
        let mut map = IdMap::new();
        map.register("foo", "foo".into());
        map.register("foo", "foo-1".into());

        assert_eq!(map.next_for("foo").as_deref(), Some("foo"));
        assert_eq!(map.next_for("foo").as_deref(), Some("foo-1"));
        assert_eq!(map.next_for("foo"), None);
        assert_eq!(map.next_for("bar"), None);
    }
}
