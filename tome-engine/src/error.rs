//! Fatal error types
//!
//! These are the unrecoverable tier: conditions a whole-document or
//! whole-tree operation cannot proceed past. They are returned as values,
//! always attached to the path of the unit that failed, and never abort
//! the processing of sibling documents - the pipeline collects them
//! alongside the successful results. Everything recoverable travels inside
//! the AST as `SystemMessage` nodes instead.

use crate::path::VirtualPath;
use std::fmt;
use tome_config::ConfigError;

/// A fatal failure of one processing unit
#[derive(Debug, Clone)]
pub enum EngineError {
    /// A document or directory config could not be read
    Config(ConfigError),
    /// A config value exists but cannot be interpreted by the rule that
    /// needs it
    InvalidConfigValue { key: String, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Config(err) => write!(f, "{}", err),
            EngineError::InvalidConfigValue { key, message } => {
                write!(f, "Invalid value for '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

/// A fatal error attached to the path it occurred at
#[derive(Debug, Clone)]
pub struct PathError {
    pub path: VirtualPath,
    pub error: EngineError,
}

impl PathError {
    pub fn new(path: VirtualPath, error: impl Into<EngineError>) -> Self {
        Self {
            path,
            error: error.into(),
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

impl std::error::Error for PathError {}
