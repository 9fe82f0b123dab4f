//! # action-docs-yaml
//!
//! Strict YAML parsing with source positions.
//!
//! Documentation examples are validated against action schemas and every
//! finding has to point at a line in the original text. This crate wraps the
//! `yaml-rust2` event parser and builds a small owned tree where each node
//! remembers where it started.
//!
//! ## Example
//!
//! ```rust
//! use action_docs_yaml::parse;
//!
//! let yaml = parse("- uses: owner/repo@v1\n  with:\n    debug: true\n").unwrap();
//! let step = &yaml.as_sequence().unwrap()[0];
//! let with = step.get("with").unwrap();
//! let (key, _) = with.entry("debug").unwrap();
//! assert_eq!(key.position.line, 3);
//! ```

mod error;
mod node;
mod parser;

pub use error::{ParseError, Result};
pub use node::{Position, ScalarStyle, YamlEntry, YamlNode, YamlValue};
pub use parser::parse;
