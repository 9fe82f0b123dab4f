//! Steps that reference a known action.

use crate::scanner;
use action_docs_schema::{SchemaRegistry, ValueLayout};
use action_docs_yaml::{ScalarStyle, YamlNode, YamlValue};
use indexmap::IndexMap;

/// How an argument value was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArgumentForm {
    /// On the key's line, or a plain scalar continued on the next lines
    #[default]
    Inline,
    /// A `|` or `>` block scalar
    Block,
    /// A YAML list; each entry as written, still quoted
    List(Vec<String>),
}

impl ArgumentForm {
    pub fn layout(&self) -> ValueLayout {
        match self {
            ArgumentForm::Block => ValueLayout::Block,
            ArgumentForm::Inline | ArgumentForm::List(_) => ValueLayout::Inline,
        }
    }
}

/// One `with:` entry of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepArgument {
    /// The value as written, still quoted. List entries are joined with
    /// newlines. `None` for values that are not scalars or lists of scalars;
    /// those are only checked by name.
    pub value: Option<String>,
    pub form: ArgumentForm,
    /// Block-relative, 1-based
    pub line: usize,
    pub column: usize,
}

/// A step whose `uses:` resolves to a registered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedStep {
    /// Primary identifier of the matched schema
    pub schema_identifier: String,
    pub uses: String,
    pub arguments: IndexMap<String, StepArgument>,
    pub id: Option<String>,
    /// Block-relative line of the `uses:` key
    pub line: usize,
    pub column: usize,
}

/// Find the steps in a block that reference registered actions.
///
/// Blocks that parse as YAML are walked as a tree, so steps are found at any
/// depth. Blocks that do not parse (placeholders, elisions, half-finished
/// snippets) fall back to the line scanner.
pub fn find_steps(block: &str, registry: &SchemaRegistry) -> Vec<ReferencedStep> {
    match action_docs_yaml::parse(block) {
        Ok(root) => steps_in_tree(&root, registry),
        Err(err) => {
            tracing::debug!(error = %err, "example block is not valid YAML, scanning lines");
            scanner::scan(block, registry)
        }
    }
}

fn steps_in_tree(root: &YamlNode, registry: &SchemaRegistry) -> Vec<ReferencedStep> {
    let mut steps = Vec::new();
    root.walk(&mut |node| {
        if let Some(step) = step_from_mapping(node, registry) {
            steps.push(step);
        }
    });
    steps
}

fn step_from_mapping(node: &YamlNode, registry: &SchemaRegistry) -> Option<ReferencedStep> {
    let (uses_key, uses_value) = node.entry("uses")?;
    let uses = uses_value.as_str()?.trim();
    let Some(schema) = registry.resolve_uses(uses) else {
        tracing::trace!(uses, "no schema for referenced action");
        return None;
    };

    let id = node
        .get("id")
        .and_then(YamlNode::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let mut arguments = IndexMap::new();
    if let Some(entries) = node.get("with").and_then(YamlNode::as_mapping) {
        for entry in entries {
            let Some(name) = entry.key.as_str() else {
                continue;
            };
            let (value, form) = value_source(&entry.value);
            arguments.insert(
                name.to_string(),
                StepArgument {
                    value,
                    form,
                    line: entry.key.position.line,
                    column: entry.key.position.column,
                },
            );
        }
    }

    Some(ReferencedStep {
        schema_identifier: schema.identifier.clone(),
        uses: uses.to_string(),
        arguments,
        id,
        line: uses_key.position.line,
        column: uses_key.position.column,
    })
}

/// Rebuild the value text the normalizer expects.
///
/// Quoted scalars get their quotes back so that a `#` inside them stays
/// content. A list of scalars keeps its entries apart.
fn value_source(node: &YamlNode) -> (Option<String>, ArgumentForm) {
    match &node.value {
        YamlValue::Scalar { style, .. } => {
            let form = match style {
                ScalarStyle::Literal | ScalarStyle::Folded => ArgumentForm::Block,
                _ => ArgumentForm::Inline,
            };
            (scalar_source(node), form)
        }
        YamlValue::Sequence(items) => {
            let entries: Vec<String> = items.iter().filter_map(scalar_source).collect();
            (Some(entries.join("\n")), ArgumentForm::List(entries))
        }
        YamlValue::Mapping(_) | YamlValue::Alias => (None, ArgumentForm::Inline),
    }
}

fn scalar_source(node: &YamlNode) -> Option<String> {
    let YamlValue::Scalar { text, style } = &node.value else {
        return None;
    };
    Some(match style {
        ScalarStyle::Plain if node.is_null() => String::new(),
        ScalarStyle::Plain | ScalarStyle::Literal | ScalarStyle::Folded => text.clone(),
        ScalarStyle::SingleQuoted => format!("'{text}'"),
        ScalarStyle::DoubleQuoted => format!("\"{text}\""),
    })
}
