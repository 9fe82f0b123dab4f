//! YAML nodes with source positions.

/// Where a node starts in the parsed text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Character offset from the start of the source (0-based)
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
}

/// How a scalar was written in the source.
///
/// Quoting matters downstream: a `#` inside a quoted scalar is content, a `#`
/// after a plain scalar has already been removed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    /// Whether the scalar was a `|` or `>` block.
    pub fn is_block(self) -> bool {
        matches!(self, ScalarStyle::Literal | ScalarStyle::Folded)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    Scalar { text: String, style: ScalarStyle },
    Sequence(Vec<YamlNode>),
    Mapping(Vec<YamlEntry>),
    /// Aliases are not expanded.
    Alias,
}

/// A YAML value plus the position it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub value: YamlValue,
    pub position: Position,
}

/// A key-value pair of a mapping. Both sides keep their own positions.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlEntry {
    pub key: YamlNode,
    pub value: YamlNode,
}

impl YamlNode {
    pub fn new(value: YamlValue, position: Position) -> Self {
        Self { value, position }
    }

    /// The scalar text, if this node is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            YamlValue::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn scalar_style(&self) -> Option<ScalarStyle> {
        match &self.value {
            YamlValue::Scalar { style, .. } => Some(*style),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.value {
            YamlValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[YamlEntry]> {
        match &self.value {
            YamlValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, YamlValue::Scalar { .. })
    }

    /// Plain `~`, `null` or an empty value.
    pub fn is_null(&self) -> bool {
        match &self.value {
            YamlValue::Scalar {
                text,
                style: ScalarStyle::Plain,
            } => matches!(text.as_str(), "" | "~" | "null" | "Null" | "NULL"),
            _ => false,
        }
    }

    /// Look up a mapping entry by its scalar key.
    ///
    /// Later duplicates win, matching how YAML loaders overwrite keys.
    pub fn entry(&self, key: &str) -> Option<(&YamlNode, &YamlNode)> {
        self.as_mapping()?
            .iter()
            .rev()
            .find(|entry| entry.key.as_str() == Some(key))
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Look up a mapping value by its scalar key.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.entry(key).map(|(_, value)| value)
    }

    /// Visit this node and all descendants, depth first, in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a YamlNode)) {
        visit(self);
        match &self.value {
            YamlValue::Sequence(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            YamlValue::Mapping(entries) => {
                for entry in entries {
                    entry.key.walk(visit);
                    entry.value.walk(visit);
                }
            }
            YamlValue::Scalar { .. } | YamlValue::Alias => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(text: &str, line: usize) -> YamlNode {
        YamlNode::new(
            YamlValue::Scalar {
                text: text.to_string(),
                style: ScalarStyle::Plain,
            },
            Position {
                offset: 0,
                line,
                column: 1,
            },
        )
    }

    #[test]
    fn test_entry_prefers_last_duplicate() {
        let mapping = YamlNode::new(
            YamlValue::Mapping(vec![
                YamlEntry {
                    key: scalar("id", 1),
                    value: scalar("first", 1),
                },
                YamlEntry {
                    key: scalar("id", 2),
                    value: scalar("second", 2),
                },
            ]),
            Position::default(),
        );

        let (key, value) = mapping.entry("id").unwrap();
        assert_eq!(key.position.line, 2);
        assert_eq!(value.as_str(), Some("second"));
    }

    #[test]
    fn test_null_detection() {
        assert!(scalar("~", 1).is_null());
        assert!(scalar("", 1).is_null());
        assert!(!scalar("none", 1).is_null());
    }
}
