// Error types for schema loading

use std::fmt;
use thiserror::Error;

/// Which part of a manifest or type schema an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Input,
    Output,
    Type,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Input => write!(f, "input"),
            EntryKind::Output => write!(f, "output"),
            EntryKind::Type => write!(f, "type"),
        }
    }
}

/// Errors that abort loading of a single manifest.
///
/// These are never produced while validating examples; findings there are
/// diagnostics, not errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed manifest {path}: {message}")]
    MalformedManifest { path: String, message: String },

    #[error("malformed type schema {path}: {message}")]
    MalformedTypeSchema { path: String, message: String },

    #[error("unknown type reference `{name}`")]
    UnknownTypeReference { name: String },

    #[error("type `{name}` refers back to itself ({chain})")]
    CyclicTypeReference { name: String, chain: String },

    #[error("invalid type definition: {0}")]
    InvalidTypeDefinition(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{path} describes {kind} `{name}`, which the manifest does not declare")]
    UndeclaredEntry {
        kind: EntryKind,
        name: String,
        path: String,
    },

    /// Context for an error raised while resolving one entry. The message
    /// already includes the inner error.
    #[error("{kind} `{name}`: {cause}")]
    Entry {
        kind: EntryKind,
        name: String,
        cause: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Attach the input, output or type name an error was raised for.
    pub fn in_entry(self, kind: EntryKind, name: impl Into<String>) -> Self {
        SchemaError::Entry {
            kind,
            name: name.into(),
            cause: Box::new(self),
        }
    }

    /// The innermost error, with entry context peeled away.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            SchemaError::Entry { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Result type for schema loading operations
pub type SchemaResult<T> = Result<T, SchemaError>;
