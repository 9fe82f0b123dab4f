//! Raw type definitions, as written in manifests and type schemas.

use crate::normalize::Separator;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Named custom types available to a manifest, keyed by name.
pub type CustomTypes = HashMap<String, TypeDefinition>;

/// A type as written: a name, or an object with a `type` and overrides.
///
/// ```yaml
/// environment: deploy-target        # reference
/// region:                           # inline
///   type: choice
///   options: [eu, us]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeDefinition {
    Reference(String),
    Inline(InlineDefinition),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InlineDefinition {
    /// A base kind or the name of a custom type to inherit from
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,

    #[serde(rename = "match", default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub options: Option<Vec<ChoiceOptionSource>>,

    #[serde(default)]
    pub separators: Option<SeparatorSource>,

    #[serde(default)]
    pub items: Option<Box<TypeDefinition>>,

    #[serde(default)]
    pub description: Option<String>,
}

/// One entry of an `options` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOptionSource {
    Plain(#[serde(deserialize_with = "scalar_string")] String),
    Detailed {
        #[serde(deserialize_with = "scalar_string")]
        value: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        alternatives: Vec<String>,
    },
}

impl ChoiceOptionSource {
    /// The canonical value followed by its alternatives, in declaration order.
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        let (value, alternatives): (&str, &[String]) = match self {
            ChoiceOptionSource::Plain(value) => (value, &[]),
            ChoiceOptionSource::Detailed {
                value,
                alternatives,
                ..
            } => (value, alternatives),
        };
        std::iter::once(value).chain(alternatives.iter().map(String::as_str))
    }
}

/// `separators` may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeparatorSource {
    One(String),
    Many(Vec<String>),
}

impl SeparatorSource {
    pub fn to_separators(&self) -> Vec<Separator> {
        match self {
            SeparatorSource::One(s) => vec![Separator::parse(s)],
            SeparatorSource::Many(list) => list.iter().map(|s| Separator::parse(s)).collect(),
        }
    }
}

/// Accept numbers and booleans where an option string is expected, so
/// `options: [1, 2, 3]` reads the way it looks.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar option value, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_and_inline_forms() {
        let reference: TypeDefinition = serde_yaml::from_str("deploy-target").unwrap();
        assert_eq!(reference, TypeDefinition::Reference("deploy-target".to_string()));

        let inline: TypeDefinition = serde_yaml::from_str(
            r#"
type: string
match: '^v\d+$'
separators: ','
"#,
        )
        .unwrap();
        let TypeDefinition::Inline(inline) = inline else {
            panic!("expected inline definition");
        };
        assert_eq!(inline.type_name.as_deref(), Some("string"));
        assert_eq!(inline.pattern.as_deref(), Some(r"^v\d+$"));
        assert_eq!(inline.separators, Some(SeparatorSource::One(",".to_string())));
    }

    #[test]
    fn test_option_shapes() {
        let options: Vec<ChoiceOptionSource> = serde_yaml::from_str(
            r#"
- development
- value: production
  description: Live traffic
  alternatives: [prod, live]
- 3
"#,
        )
        .unwrap();

        let spellings: Vec<&str> = options.iter().flat_map(|o| o.spellings()).collect();
        assert_eq!(spellings, vec!["development", "production", "prod", "live", "3"]);
    }
}
