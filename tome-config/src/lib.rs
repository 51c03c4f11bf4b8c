//! Shared configuration lookup for the tome toolchain.
//!
//! The engine does not own a configuration file syntax; the driver layer
//! hands over already-classified config text (YAML-shaped - document front
//! matter uses the same value model). What this crate owns is the lookup
//! contract: dotted-path keys (`autonumbering.depth`) resolved against a
//! [`Config`], with an *explicit* fallback chain - each config optionally
//! points at its parent scope (document -> directory -> root), and a miss
//! walks the chain. The chain is built by the tree assembly step, so the
//! fallback order is visible and testable rather than implicit.

use serde_yaml::Value;
use std::fmt;
use std::sync::Arc;

/// Errors raised while reading configuration text
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The text is not valid YAML
    InvalidSyntax(String),
    /// The top level is not a key-value mapping
    NotAMapping,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSyntax(msg) => write!(f, "Invalid config syntax: {}", msg),
            ConfigError::NotAMapping => write!(f, "Config root must be a key-value mapping"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A key-value scope with an optional fallback to its parent scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Value,
    fallback: Option<Arc<Config>>,
}

impl Config {
    /// A config with no values of its own; lookups go straight to the
    /// fallback, if any
    pub fn empty() -> Self {
        Self {
            values: Value::Null,
            fallback: None,
        }
    }

    /// Parse YAML-shaped config text. Empty text yields an empty config; a
    /// non-mapping top level is an error.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let values: Value = serde_yaml::from_str(text)
            .map_err(|err| ConfigError::InvalidSyntax(err.to_string()))?;
        match values {
            Value::Mapping(_) | Value::Null => Ok(Self {
                values,
                fallback: None,
            }),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// Attach the parent scope this config falls back to
    pub fn with_fallback(mut self, fallback: Arc<Config>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Look up a dotted-path key, walking the fallback chain on a miss
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.get_local(key) {
            Some(value) => Some(value),
            None => self.fallback.as_deref().and_then(|parent| parent.get(key)),
        }
    }

    fn get_local(&self, key: &str) -> Option<&Value> {
        let mut current = &self.values;
        for segment in key.split('.') {
            match current {
                Value::Mapping(map) => {
                    current = map.get(Value::String(segment.to_string()))?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}
