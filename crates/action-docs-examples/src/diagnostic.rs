//! Problems found in usage examples.

use serde::Serialize;
use std::fmt;

/// Structured diagnostic kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DiagnosticKind {
    /// A `with:` key the action does not declare
    UnknownInput {
        input: String,
        action: String,
        known: Vec<String>,
    },

    /// A value (or list item) that is not a boolean spelling
    InvalidBoolean {
        input: String,
        value: String,
        item: Option<usize>,
    },

    /// A value (or list item) that is not a decimal number
    InvalidNumber {
        input: String,
        value: String,
        item: Option<usize>,
    },

    /// A string value that does not match the type's pattern
    PatternMismatch {
        input: String,
        value: String,
        pattern: String,
        item: Option<usize>,
    },

    /// A choice value outside the allowed options
    InvalidChoice {
        input: String,
        value: String,
        allowed: Vec<String>,
        pattern: Option<String>,
        item: Option<usize>,
    },

    /// `steps.<id>.outputs.<name>` naming an output the action lacks
    UnknownOutput {
        step: String,
        output: String,
        action: String,
        available: Vec<String>,
    },

    /// A required input without a default left out of `with:`
    MissingRequiredInput { input: String, action: String },
}

impl DiagnosticKind {
    /// Format a human-readable message from this kind
    pub fn message(&self) -> String {
        match self {
            DiagnosticKind::UnknownInput {
                input,
                action,
                known,
            } => format!(
                "Unknown input \"{input}\" for {action}. Valid inputs: {}",
                list_or_none(known)
            ),
            DiagnosticKind::InvalidBoolean { input, value, item } => format!(
                "Invalid value \"{value}\" for {}: expected a boolean (true, false, yes, no, y, n, 1, 0, on, off)",
                subject(input, *item)
            ),
            DiagnosticKind::InvalidNumber { input, value, item } => format!(
                "Invalid value \"{value}\" for {}: expected a number",
                subject(input, *item)
            ),
            DiagnosticKind::PatternMismatch {
                input,
                value,
                pattern,
                item,
            } => format!(
                "Invalid value \"{value}\" for {}: does not match pattern {pattern}",
                subject(input, *item)
            ),
            DiagnosticKind::InvalidChoice {
                input,
                value,
                allowed,
                pattern,
                item,
            } => {
                let mut message = format!(
                    "Invalid value \"{value}\" for {}: expected one of: {}",
                    subject(input, *item),
                    allowed.join(", ")
                );
                if let Some(pattern) = pattern {
                    message.push_str(&format!(", or a value matching {pattern}"));
                }
                message
            }
            DiagnosticKind::UnknownOutput {
                step,
                output,
                action,
                available,
            } => format!(
                "Unknown output \"{output}\" of step \"{step}\" ({action}). Available outputs: {}",
                list_or_none(available)
            ),
            DiagnosticKind::MissingRequiredInput { input, action } => {
                format!("Missing required input \"{input}\" for {action}")
            }
        }
    }
}

fn subject(input: &str, item: Option<usize>) -> String {
    match item {
        Some(ordinal) => format!("item {ordinal} of input \"{input}\""),
        None => format!("input \"{input}\""),
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// One problem at a 1-based line and column.
///
/// Positions start out relative to the fenced block they were found in and
/// are moved into the surrounding text with [`Diagnostic::shifted`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, line: usize, column: usize) -> Self {
        Self {
            message: kind.message(),
            line,
            column,
            kind,
        }
    }

    /// Move a block-relative position down by `lines`.
    pub fn shifted(mut self, lines: usize) -> Self {
        self.line += lines;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}
