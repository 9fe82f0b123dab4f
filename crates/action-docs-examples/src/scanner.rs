//! Line-oriented step finder for blocks that are not valid YAML.
//!
//! Documentation snippets are often not quite YAML: `...` elisions,
//! `<placeholder>` lines, a stray `key: a: b`. The scanner only relies on
//! indentation. It finds every `uses:` line, works out the extent of the step
//! around it, and reads `id:` and the `with:` entries out of that extent.

use crate::step::{ArgumentForm, ReferencedStep, StepArgument};
use action_docs_schema::SchemaRegistry;
use action_docs_schema::normalize::{dedent, strip_enclosing_quotes, strip_trailing_comment};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static USES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<indent>[ \t]*)(?P<dash>-[ \t]*)?uses[ \t]*:(?P<value>.*)$").unwrap());

static KEY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[ \t]*(?:-[ \t]+)?(?P<key>"[^"]*"|'[^']*'|[^\s#'"\-][^:#]*?)[ \t]*:(?:[ \t]+(?P<value>.*))?$"#,
    )
    .unwrap()
});

static DASH_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*-(?:[ \t]+|$)").unwrap());

static BLOCK_INDICATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[|>][-+0-9]*$").unwrap());

/// Scan a block for steps that reference registered actions.
pub fn scan(block: &str, registry: &SchemaRegistry) -> Vec<ReferencedStep> {
    let lines: Vec<&str> = block.lines().collect();
    let mut steps = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(caps) = USES_LINE.captures(line) else {
            continue;
        };
        let uses = clean_scalar(caps.name("value").map_or("", |m| m.as_str()));
        let Some(schema) = registry.resolve_uses(&uses) else {
            tracing::trace!(uses = %uses, "no schema for referenced action");
            continue;
        };

        let dashed = caps.name("dash").is_some();
        let anchor = caps["indent"].len() + caps.name("dash").map_or(0, |m| m.as_str().len());
        let start = if dashed {
            index
        } else {
            step_start(&lines, index, anchor)
        };
        let end = step_end(&lines, index, anchor);

        let mut scanner = StepScanner::new(anchor, index);
        for (offset, line) in lines[start..end].iter().enumerate() {
            scanner.feed(start + offset, line);
        }
        let (id, arguments) = scanner.finish();

        steps.push(ReferencedStep {
            schema_identifier: schema.identifier.clone(),
            uses,
            arguments,
            id,
            line: index + 1,
            column: anchor + 1,
        });
    }

    steps
}

/// Walk back from the `uses:` line over earlier keys of the same step, up
/// to the `- ` line that opens the list item.
fn step_start(lines: &[&str], uses_index: usize, anchor: usize) -> usize {
    let mut start = uses_index;
    for index in (0..uses_index).rev() {
        let line = lines[index];
        if is_blank_or_comment(line) {
            continue;
        }
        let indent = indent_of(line);
        if indent > anchor {
            continue;
        }
        if let Some(dash) = DASH_ITEM.find(line) {
            if dash.end() == anchor {
                start = index;
            }
            break;
        }
        if indent == anchor {
            start = index;
            continue;
        }
        break;
    }
    start
}

/// One past the last line that still belongs to the step.
fn step_end(lines: &[&str], uses_index: usize, anchor: usize) -> usize {
    let mut end = uses_index + 1;
    for (index, line) in lines.iter().enumerate().skip(uses_index + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);
        if indent < anchor {
            if line.trim_start().starts_with('#') {
                continue;
            }
            break;
        }
        end = index + 1;
    }
    end
}

#[derive(Debug)]
enum ScanState {
    /// Step-level keys
    StepBody,
    /// Entries of the `with:` mapping
    WithBlock,
    /// Lines of a multi-line argument value
    ArgumentBlock { key_indent: usize, argument: PendingArgument },
    /// A block scalar owned by some other step key
    OtherBlock { key_indent: usize },
}

#[derive(Debug)]
struct PendingArgument {
    name: String,
    line: usize,
    column: usize,
    /// Introduced by `|` or `>` rather than an empty value
    block_scalar: bool,
    lines: Vec<String>,
}

enum Flow {
    Consumed,
    Reprocess,
}

struct StepScanner {
    anchor: usize,
    uses_index: usize,
    state: ScanState,
    with_indent: usize,
    entry_indent: Option<usize>,
    id: Option<String>,
    arguments: IndexMap<String, StepArgument>,
}

impl StepScanner {
    fn new(anchor: usize, uses_index: usize) -> Self {
        Self {
            anchor,
            uses_index,
            state: ScanState::StepBody,
            with_indent: anchor,
            entry_indent: None,
            id: None,
            arguments: IndexMap::new(),
        }
    }

    fn feed(&mut self, index: usize, line: &str) {
        if index != self.uses_index {
            self.note_id(line);
        }
        while let Flow::Reprocess = self.step(index, line) {}
    }

    /// The first `id:` line anywhere in the step names it.
    fn note_id(&mut self, line: &str) {
        if self.id.is_some() {
            return;
        }
        if let Some((key, _, value)) = key_line(line) {
            let id = clean_scalar(value);
            if key == "id" && !id.is_empty() {
                self.id = Some(id);
            }
        }
    }

    fn step(&mut self, index: usize, line: &str) -> Flow {
        match std::mem::replace(&mut self.state, ScanState::StepBody) {
            ScanState::StepBody => {
                self.body_line(index, line);
                Flow::Consumed
            }
            ScanState::WithBlock => {
                if is_blank_or_comment(line) {
                    self.state = ScanState::WithBlock;
                    return Flow::Consumed;
                }
                if indent_of(line) <= self.with_indent {
                    return Flow::Reprocess;
                }
                self.state = ScanState::WithBlock;
                self.with_line(index, line);
                Flow::Consumed
            }
            ScanState::ArgumentBlock {
                key_indent,
                mut argument,
            } => {
                let indent = indent_of(line);
                let compact_item = !argument.block_scalar
                    && indent == key_indent
                    && DASH_ITEM.is_match(line);
                if line.trim().is_empty() || indent > key_indent || compact_item {
                    argument.lines.push(line.to_string());
                    self.state = ScanState::ArgumentBlock {
                        key_indent,
                        argument,
                    };
                    return Flow::Consumed;
                }
                self.finish_argument(argument);
                self.state = ScanState::WithBlock;
                Flow::Reprocess
            }
            ScanState::OtherBlock { key_indent } => {
                if line.trim().is_empty() || indent_of(line) > key_indent {
                    self.state = ScanState::OtherBlock { key_indent };
                    return Flow::Consumed;
                }
                Flow::Reprocess
            }
        }
    }

    fn body_line(&mut self, index: usize, line: &str) {
        if index == self.uses_index || is_blank_or_comment(line) {
            return;
        }
        let Some((key, column, value)) = key_line(line) else {
            return;
        };
        let value = strip_trailing_comment(value).trim();

        if key == "with" && column == self.anchor {
            if value.is_empty() {
                self.with_indent = column;
                self.entry_indent = None;
                self.state = ScanState::WithBlock;
            } else if let Some(inner) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
                self.flow_entries(index, line, inner);
            }
        } else if BLOCK_INDICATOR.is_match(value) {
            self.state = ScanState::OtherBlock {
                key_indent: indent_of(line),
            };
        }
    }

    fn with_line(&mut self, index: usize, line: &str) {
        let indent = indent_of(line);
        let entry_indent = *self.entry_indent.get_or_insert(indent);
        if indent > entry_indent {
            return;
        }
        let Some((name, column, value)) = key_line(line) else {
            return;
        };
        let value = strip_trailing_comment(value).trim();

        if BLOCK_INDICATOR.is_match(value) || value.is_empty() {
            self.state = ScanState::ArgumentBlock {
                key_indent: indent,
                argument: PendingArgument {
                    name,
                    line: index + 1,
                    column: column + 1,
                    block_scalar: !value.is_empty(),
                    lines: Vec::new(),
                },
            };
        } else {
            self.arguments.insert(
                name,
                StepArgument {
                    value: Some(value.to_string()),
                    form: ArgumentForm::Inline,
                    line: index + 1,
                    column: column + 1,
                },
            );
        }
    }

    /// `with: { a: 1, b: two }` on one line.
    fn flow_entries(&mut self, index: usize, line: &str, inner: &str) {
        for pair in split_outside_quotes(inner, ',') {
            let Some((name, value)) = pair.split_once(':') else {
                continue;
            };
            let name = strip_enclosing_quotes(name.trim());
            if name.is_empty() {
                continue;
            }
            let column = line.find(name).unwrap_or(self.anchor);
            self.arguments.insert(
                name.to_string(),
                StepArgument {
                    value: Some(value.trim().to_string()),
                    form: ArgumentForm::Inline,
                    line: index + 1,
                    column: column + 1,
                },
            );
        }
    }

    fn finish_argument(&mut self, argument: PendingArgument) {
        let mut lines = argument.lines;
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let text = dedent(&lines.join("\n"));

        let is_list = !argument.block_scalar
            && text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .all(|line| DASH_ITEM.is_match(line));
        let (value, form) = if is_list && !text.is_empty() {
            let entries: Vec<String> = text
                .lines()
                .filter_map(|line| DASH_ITEM.find(line).map(|dash| &line[dash.end()..]))
                .map(|item| strip_trailing_comment(item).trim().to_string())
                .collect();
            (entries.join("\n"), ArgumentForm::List(entries))
        } else if argument.block_scalar {
            (text, ArgumentForm::Block)
        } else {
            (text, ArgumentForm::Inline)
        };

        self.arguments.insert(
            argument.name,
            StepArgument {
                value: Some(value),
                form,
                line: argument.line,
                column: argument.column,
            },
        );
    }

    fn finish(mut self) -> (Option<String>, IndexMap<String, StepArgument>) {
        if let ScanState::ArgumentBlock { argument, .. } =
            std::mem::replace(&mut self.state, ScanState::StepBody)
        {
            self.finish_argument(argument);
        }
        (self.id, self.arguments)
    }
}

/// Key, 0-based key column and raw value of a `key: value` line.
fn key_line(line: &str) -> Option<(String, usize, &str)> {
    let caps = KEY_LINE.captures(line)?;
    let key = caps.name("key")?;
    let value = caps.name("value").map_or("", |m| m.as_str());
    Some((
        strip_enclosing_quotes(key.as_str().trim()).to_string(),
        key.start(),
        value,
    ))
}

/// Split on `separator` wherever it is not inside `'...'` or `"..."`.
fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (c, Some(open)) if c == open => quote = None,
            (c, None) if c == separator => {
                pieces.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn clean_scalar(value: &str) -> String {
    strip_enclosing_quotes(strip_trailing_comment(value).trim()).to_string()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::registry;

    fn values(step: &ReferencedStep) -> Vec<(&str, &str, usize, usize)> {
        step.arguments
            .iter()
            .map(|(name, arg)| {
                (
                    name.as_str(),
                    arg.value.as_deref().unwrap_or_default(),
                    arg.line,
                    arg.column,
                )
            })
            .collect()
    }

    #[test]
    fn test_dashed_step_with_entries() {
        let block = "\
steps:
  - uses: acme/deploy@v1  # pinned
    id: ship
    with:
      environment: 'prod'   # comment
      dry-run: yes
  - run: echo done
";
        let steps = scan(block, &registry());
        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.uses, "acme/deploy@v1");
        assert_eq!(step.id.as_deref(), Some("ship"));
        assert_eq!((step.line, step.column), (2, 5));
        assert_eq!(
            values(step),
            vec![("environment", "'prod'", 5, 7), ("dry-run", "yes", 6, 7)]
        );
    }

    #[test]
    fn test_keys_before_uses_belong_to_the_step() {
        let block = "\
- name: Deploy
  id: early
  with:
    environment: staging
  uses: acme/deploy@v1
- id: other
  uses: actions/checkout@v4
";
        let steps = scan(block, &registry());
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id.as_deref(), Some("early"));
        assert_eq!(values(&steps[0]), vec![("environment", "staging", 4, 5)]);
    }

    #[test]
    fn test_block_scalar_and_implicit_list() {
        let block = "\
- uses: acme/deploy@v1
  with:
    tags: |
      v1, v2
      # still content
      latest

    notes: >-
      folded
    regions:
      - eu   # primary
      - 'us'
    environment: prod
";
        let steps = scan(block, &registry());
        assert_eq!(
            values(&steps[0]),
            vec![
                ("tags", "v1, v2\n# still content\nlatest", 3, 5),
                ("notes", "folded", 8, 5),
                ("regions", "eu\n'us'", 10, 5),
                ("environment", "prod", 13, 5),
            ]
        );
    }

    #[test]
    fn test_space_collapsed_dash_and_flow_with() {
        let block = "-uses: acme/deploy@v1\n with: { environment: prod, dry-run: 'no' }\n";
        let steps = scan(block, &registry());
        assert_eq!(steps.len(), 1);
        assert_eq!(
            values(&steps[0]),
            vec![("environment", "prod", 2, 10), ("dry-run", "'no'", 2, 29)]
        );
    }

    #[test]
    fn test_nested_values_and_elisions() {
        let block = "\
- uses: acme/deploy@v1
  with:
    environment: production
    extra:
      nested: ignored
    ...
  <more steps>
- uses: acme/deploy@v2
  with:
    retries: three
";
        let steps = scan(block, &registry());
        assert_eq!(steps.len(), 2);
        let first: Vec<&str> = steps[0].arguments.keys().map(String::as_str).collect();
        assert_eq!(first, vec!["environment", "extra"]);
        assert_eq!(steps[1].arguments["retries"].value.as_deref(), Some("three"));
        assert_eq!(steps[1].line, 8);
    }

    #[test]
    fn test_id_anywhere_in_the_step() {
        let block = "\
- uses: acme/deploy@v1
  with:
    id: build
  ...: <x>: y
- id: next
  uses: acme/deploy@v2
";
        let steps = scan(block, &registry());
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id.as_deref(), Some("build"));
        assert!(steps[0].arguments.contains_key("id"));
        assert_eq!(steps[1].id.as_deref(), Some("next"));
    }

    #[test]
    fn test_flow_with_keeps_quoted_commas() {
        let block = "- uses: acme/deploy@v1\n  with: { tags: 'a,b', retries: 1 }\n  <more>\n";
        let steps = scan(block, &registry());
        assert_eq!(
            values(&steps[0]),
            vec![("tags", "'a,b'", 2, 11), ("retries", "1", 2, 24)]
        );
    }

    #[test]
    fn test_argument_forms() {
        let block = "\
- uses: acme/deploy@v1
  with:
    label: |
      abc # not a comment
    regions:
      - eu
      - us
    environment: prod
  ...
";
        let steps = scan(block, &registry());
        let arguments = &steps[0].arguments;
        assert_eq!(arguments["label"].form, ArgumentForm::Block);
        assert_eq!(arguments["label"].value.as_deref(), Some("abc # not a comment"));
        assert_eq!(
            arguments["regions"].form,
            ArgumentForm::List(vec!["eu".to_string(), "us".to_string()])
        );
        assert_eq!(arguments["environment"].form, ArgumentForm::Inline);
    }
}
