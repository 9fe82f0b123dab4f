//! YAML parser that builds position-tracked node trees.

use crate::{ParseError, Position, Result, ScalarStyle, YamlEntry, YamlNode, YamlValue};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse YAML from a string, producing a position-tracked tree.
///
/// Only the first document is read. An empty input is an error: there is
/// nothing to walk.
///
/// # Example
///
/// ```rust
/// use action_docs_yaml::parse;
///
/// let yaml = parse("id: build").unwrap();
/// assert_eq!(yaml.get("id").and_then(|v| v.as_str()), Some("build"));
/// ```
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the 1-based line and column where the
/// scanner gave up.
pub fn parse(content: &str) -> Result<YamlNode> {
    let lines = LineIndex::new(content);
    let mut parser = Parser::new_from_str(content);
    let mut builder = TreeBuilder::new(&lines);

    parser.load(&mut builder, false).map_err(|err| {
        let position = lines.position(err.marker().index());
        ParseError::new(err.info(), position.line, position.column)
    })?;

    builder.result()
}

/// Maps character offsets (what yaml-rust2 markers count) to lines and columns.
struct LineIndex {
    /// Character offset at which each line starts
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut starts = vec![0];
        for (index, ch) in content.chars().enumerate() {
            if ch == '\n' {
                starts.push(index + 1);
            }
        }
        Self { starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line.saturating_sub(1)];
        Position {
            offset,
            line: line.max(1),
            column: offset - line_start + 1,
        }
    }
}

/// A node being constructed during parsing.
enum Pending {
    Sequence {
        start: Position,
        items: Vec<YamlNode>,
    },
    Mapping {
        start: Position,
        keys: Vec<YamlNode>,
        entries: Vec<YamlEntry>,
    },
}

struct TreeBuilder<'a> {
    lines: &'a LineIndex,
    stack: Vec<Pending>,
    root: Option<YamlNode>,
    error: Option<ParseError>,
}

impl<'a> TreeBuilder<'a> {
    fn new(lines: &'a LineIndex) -> Self {
        Self {
            lines,
            stack: Vec::new(),
            root: None,
            error: None,
        }
    }

    fn result(self) -> Result<YamlNode> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.root
            .ok_or_else(|| ParseError::new("no YAML document found", 1, 1))
    }

    fn fail(&mut self, message: &str, position: Position) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(message, position.line, position.column));
        }
    }

    fn push_complete(&mut self, node: YamlNode) {
        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
            Some(Pending::Sequence { items, .. }) => items.push(node),
            Some(Pending::Mapping { keys, entries, .. }) => match keys.pop() {
                Some(key) => entries.push(YamlEntry { key, value: node }),
                None => keys.push(node),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        let position = self.lines.position(marker.index());
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(text, style, _anchor_id, _tag) => {
                let style = match style {
                    TScalarStyle::Plain => ScalarStyle::Plain,
                    TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
                    TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
                    TScalarStyle::Literal => ScalarStyle::Literal,
                    _ => ScalarStyle::Folded,
                };
                self.push_complete(YamlNode::new(YamlValue::Scalar { text, style }, position));
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                self.stack.push(Pending::Sequence {
                    start: position,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => match self.stack.pop() {
                Some(Pending::Sequence { start, items }) => {
                    self.push_complete(YamlNode::new(YamlValue::Sequence(items), start));
                }
                _ => self.fail("unbalanced sequence end", position),
            },

            Event::MappingStart(_anchor_id, _tag) => {
                self.stack.push(Pending::Mapping {
                    start: position,
                    keys: Vec::new(),
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => match self.stack.pop() {
                Some(Pending::Mapping { start, keys, entries }) if keys.is_empty() => {
                    self.push_complete(YamlNode::new(YamlValue::Mapping(entries), start));
                }
                _ => self.fail("unbalanced mapping end", position),
            },

            Event::Alias(_anchor_id) => {
                self.push_complete(YamlNode::new(YamlValue::Alias, position));
            }
        }
    }
}
