//! Error types for strict YAML parsing.

use thiserror::Error;

/// Result type alias for action-docs-yaml operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A block of text that is not well-formed YAML.
///
/// Callers treat this as recoverable: documentation examples that fail the
/// strict parse are handed to a tolerant scanner instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}
