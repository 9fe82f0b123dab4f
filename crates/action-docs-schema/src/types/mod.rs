//! Input types: raw definitions and their resolved descriptors.
//!
//! A [`TypeDefinition`] is what a manifest or sidecar type schema says. A
//! [`TypeDescriptor`] is the self-contained rule the validator applies, after
//! custom-type inheritance and overrides have been worked out by [`resolve`].

mod definition;
mod resolve;

pub use definition::{ChoiceOptionSource, CustomTypes, InlineDefinition, SeparatorSource, TypeDefinition};
pub use resolve::resolve;

use crate::error::{SchemaError, SchemaResult};
use crate::normalize::Separator;
use regex::Regex;
use std::fmt;

/// The base kinds every type eventually bottoms out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    Number,
    String,
    Choice,
    Any,
}

impl TypeKind {
    /// Parse a base kind name. Names are reserved: custom types cannot
    /// shadow them.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(TypeKind::Boolean),
            "number" => Some(TypeKind::Number),
            "string" => Some(TypeKind::String),
            "choice" => Some(TypeKind::Choice),
            "any" => Some(TypeKind::Any),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Number => "number",
            TypeKind::String => "string",
            TypeKind::Choice => "choice",
            TypeKind::Any => "any",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled `match` pattern that remembers how it was written.
///
/// Accepts either a bare regular expression or `/pattern/flags` notation.
/// Flags `i`, `m`, `s` and `x` become inline flags; `g`, `u` and `y` carry no
/// meaning for a single test and are dropped. Matching is unanchored, so
/// patterns that must cover the whole value spell out `^` and `$`.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: &str) -> SchemaResult<Self> {
        let expression = match split_slash_notation(source) {
            Some((body, flags)) => {
                let inline: String = flags.chars().filter(|c| "imsx".contains(*c)).collect();
                if inline.is_empty() {
                    body.to_string()
                } else {
                    format!("(?{inline}){body}")
                }
            }
            None => source.to_string(),
        };

        let regex = Regex::new(&expression).map_err(|err| SchemaError::InvalidPattern {
            pattern: source.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern as written in the definition.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_slash_notation(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if flags.chars().all(|c| "gimsuxy".contains(c)) {
        Some((body, flags))
    } else {
        None
    }
}

/// A fully resolved validation rule for one input.
///
/// `options` is only present for [`TypeKind::Choice`] and already contains
/// every alternative spelling. When `items` is present, `separators` is never
/// empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub pattern: Option<Pattern>,
    pub options: Option<Vec<String>>,
    pub separators: Vec<Separator>,
    pub items: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// A descriptor of the given kind with no constraints.
    pub fn of(kind: TypeKind) -> Self {
        Self {
            kind,
            pattern: None,
            options: None,
            separators: Vec::new(),
            items: None,
        }
    }

    /// Whether values are split into items before checking.
    pub fn is_multi_value(&self) -> bool {
        self.items.is_some()
    }

    /// The rule applied to each item of a multi-value input.
    pub fn item_type(&self) -> Option<&TypeDescriptor> {
        self.items.as_deref()
    }

    /// The accepted choice values, canonical and alternative alike.
    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }
}
