//! Checking steps and output references against action schemas.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::step::{ArgumentForm, ReferencedStep};
use action_docs_schema::normalize::{
    Normalized, has_runtime_expression, normalize_scalar_as, parse_boolean,
    parse_number, split_multi_value_as,
};
use action_docs_schema::{ActionSchema, SchemaRegistry, TypeDescriptor, TypeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static OUTPUT_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z0-9_.-])(?P<reference>steps\.(?P<step>[A-Za-z_][A-Za-z0-9_-]*)\.outputs\.(?P<output>[A-Za-z_][A-Za-z0-9_-]*))",
    )
    .unwrap()
});

/// Checks that are off unless asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Report required inputs (without a default) missing from `with:`
    pub check_required_inputs: bool,
}

/// Why a single value was rejected.
enum Rejection {
    Boolean,
    Number,
    Pattern(String),
    Choice {
        allowed: Vec<String>,
        pattern: Option<String>,
    },
}

/// Check every argument of a step against the action's inputs.
///
/// Unknown names are always reported. Values are only judged when the input
/// has a type and the value does not depend on a runtime expression. Multi-
/// value inputs are split and each item is judged on its own, with its
/// 1-based ordinal in the message.
pub fn validate_step(
    step: &ReferencedStep,
    schema: &ActionSchema,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (name, argument) in &step.arguments {
        let Some(input) = schema.inputs.get(name) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownInput {
                    input: name.clone(),
                    action: schema.identifier.clone(),
                    known: schema.inputs.keys().cloned().collect(),
                },
                argument.line,
                argument.column,
            ));
            continue;
        };
        let (Some(descriptor), Some(raw)) = (&input.type_descriptor, &argument.value) else {
            continue;
        };
        if has_runtime_expression(raw) {
            tracing::debug!(input = %name, "value depends on a runtime expression, not checked");
            continue;
        }

        for (value, item, rejection) in check_value(raw, &argument.form, descriptor) {
            diagnostics.push(Diagnostic::new(
                rejection_kind(name, value, item, rejection),
                argument.line,
                argument.column,
            ));
        }
    }

    if options.check_required_inputs {
        for (name, input) in &schema.inputs {
            if input.required && !input.has_default && !step.arguments.contains_key(name) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingRequiredInput {
                        input: name.clone(),
                        action: schema.identifier.clone(),
                    },
                    step.line,
                    step.column,
                ));
            }
        }
    }

    diagnostics
}

/// Rejected (value, item ordinal, reason) triples for one raw value.
///
/// The entries of a YAML list are split one by one, so a list is never
/// joined into a single item.
fn check_value(
    raw: &str,
    form: &ArgumentForm,
    descriptor: &TypeDescriptor,
) -> Vec<(String, Option<usize>, Rejection)> {
    if let Some(item_type) = descriptor.item_type() {
        let entries: Vec<&str> = match form {
            ArgumentForm::List(entries) => entries.iter().map(String::as_str).collect(),
            ArgumentForm::Inline | ArgumentForm::Block => vec![raw],
        };
        let mut items = Vec::new();
        for entry in entries {
            match split_multi_value_as(entry, &descriptor.separators, form.layout()) {
                Normalized::Value(mut split) => items.append(&mut split),
                Normalized::Skip => return Vec::new(),
            }
        }
        return items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                check_item(&item, item_type).map(|rejection| (item, Some(index + 1), rejection))
            })
            .collect();
    }

    if descriptor.kind == TypeKind::Any {
        return Vec::new();
    }
    let Normalized::Value(text) = normalize_scalar_as(raw, form.layout()) else {
        return Vec::new();
    };
    check_item(&text, descriptor)
        .map(|rejection| vec![(text, None, rejection)])
        .unwrap_or_default()
}

/// Judge an already normalized value or split item.
fn check_item(item: &str, descriptor: &TypeDescriptor) -> Option<Rejection> {
    match descriptor.kind {
        TypeKind::Any => None,
        TypeKind::Boolean => parse_boolean(item).is_none().then_some(Rejection::Boolean),
        TypeKind::Number => parse_number(item).is_none().then_some(Rejection::Number),
        TypeKind::String | TypeKind::Choice => check_text(item, descriptor),
    }
}

fn check_text(text: &str, descriptor: &TypeDescriptor) -> Option<Rejection> {
    let pattern_matches = descriptor.pattern.as_ref().map(|pattern| pattern.is_match(text));
    match descriptor.kind {
        TypeKind::Choice => {
            if descriptor.options().iter().any(|option| option == text) || pattern_matches == Some(true) {
                None
            } else {
                Some(Rejection::Choice {
                    allowed: descriptor.options().to_vec(),
                    pattern: descriptor.pattern.as_ref().map(|p| p.source().to_string()),
                })
            }
        }
        _ => match (pattern_matches, &descriptor.pattern) {
            (Some(false), Some(pattern)) => Some(Rejection::Pattern(pattern.source().to_string())),
            _ => None,
        },
    }
}

fn rejection_kind(input: &str, value: String, item: Option<usize>, rejection: Rejection) -> DiagnosticKind {
    let input = input.to_string();
    match rejection {
        Rejection::Boolean => DiagnosticKind::InvalidBoolean { input, value, item },
        Rejection::Number => DiagnosticKind::InvalidNumber { input, value, item },
        Rejection::Pattern(pattern) => DiagnosticKind::PatternMismatch {
            input,
            value,
            pattern,
            item,
        },
        Rejection::Choice { allowed, pattern } => DiagnosticKind::InvalidChoice {
            input,
            value,
            allowed,
            pattern,
            item,
        },
    }
}

/// Check `steps.<id>.outputs.<name>` references in a block.
///
/// Only ids of steps that reference a registered action are checked; other
/// ids (steps of unknown actions, or steps defined elsewhere) are ignored.
pub fn validate_output_references(
    text: &str,
    steps: &[ReferencedStep],
    registry: &SchemaRegistry,
) -> Vec<Diagnostic> {
    let by_id: HashMap<&str, &ActionSchema> = steps
        .iter()
        .filter_map(|step| Some((step.id.as_deref()?, registry.get(&step.schema_identifier)?)))
        .collect();
    if by_id.is_empty() {
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    for caps in OUTPUT_REFERENCE.captures_iter(text) {
        let Some(schema) = by_id.get(&caps["step"]) else {
            continue;
        };
        if schema.outputs.contains(&caps["output"]) {
            continue;
        }
        let start = caps.name("reference").map_or(0, |m| m.start());
        let (line, column) = line_column(text, start);
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnknownOutput {
                step: caps["step"].to_string(),
                output: caps["output"].to_string(),
                action: schema.identifier.clone(),
                available: schema.outputs.iter().cloned().collect(),
            },
            line,
            column,
        ));
    }
    diagnostics
}

/// 1-based line and character column of a byte offset.
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    (line, before[line_start..].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{ReferencedStep, StepArgument};
    use crate::test_support::registry;
    use indexmap::IndexMap;

    fn step(arguments: &[(&str, &str)]) -> ReferencedStep {
        let arguments: IndexMap<String, StepArgument> = arguments
            .iter()
            .enumerate()
            .map(|(index, (name, value))| {
                (
                    name.to_string(),
                    StepArgument {
                        value: Some(value.to_string()),
                        form: ArgumentForm::Inline,
                        line: index + 3,
                        column: 5,
                    },
                )
            })
            .collect();
        ReferencedStep {
            schema_identifier: "acme/deploy".to_string(),
            uses: "acme/deploy@v1".to_string(),
            arguments,
            id: Some("ship".to_string()),
            line: 1,
            column: 3,
        }
    }

    fn messages(arguments: &[(&str, &str)], options: &ValidationOptions) -> Vec<String> {
        let registry = registry();
        let schema = registry.get("acme/deploy").unwrap();
        validate_step(&step(arguments), schema, options)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_valid_values_pass() {
        let found = messages(
            &[
                ("environment", "'prod'"),
                ("dry-run", "Yes"),
                ("retries", "3"),
                ("versions", "v1, latest"),
                ("tags", "anything at all"),
                ("token", "${{ secrets.TOKEN }}"),
            ],
            &ValidationOptions::default(),
        );
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn test_unknown_input_lists_valid_inputs() {
        let found = messages(&[("enviroment", "prod")], &ValidationOptions::default());
        assert_eq!(
            found,
            vec![
                "Unknown input \"enviroment\" for acme/deploy. Valid inputs: environment, dry-run, retries, versions, tags, token, region"
            ]
        );
    }

    #[test]
    fn test_scalar_rejections() {
        let found = messages(
            &[
                ("environment", "qa"),
                ("dry-run", "maybe"),
                ("retries", "three"),
            ],
            &ValidationOptions::default(),
        );
        assert_eq!(
            found,
            vec![
                "Invalid value \"qa\" for input \"environment\": expected one of: development, staging, production, prod",
                "Invalid value \"maybe\" for input \"dry-run\": expected a boolean (true, false, yes, no, y, n, 1, 0, on, off)",
                "Invalid value \"three\" for input \"retries\": expected a number",
            ]
        );
    }

    #[test]
    fn test_multi_value_items_are_numbered() {
        let found = messages(
            &[("versions", "v1.0\n  invalid, latest # trailing\nv2")],
            &ValidationOptions::default(),
        );
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("item 2 of input \"versions\""), "{}", found[0]);
        assert!(found[0].contains("\"invalid\""));
    }

    #[test]
    fn test_choice_pattern_accepts_non_options() {
        assert!(messages(&[("region", "eu-west-1")], &ValidationOptions::default()).is_empty());
        let found = messages(&[("region", "mars")], &ValidationOptions::default());
        assert!(found[0].ends_with("expected one of: eu, us, or a value matching ^[a-z]{2}-[a-z]+-\\d$"));
    }

    #[test]
    fn test_missing_required_is_opt_in() {
        let none: &[(&str, &str)] = &[];
        assert!(messages(none, &ValidationOptions::default()).is_empty());

        let strict = ValidationOptions {
            check_required_inputs: true,
        };
        // `token` is required but has a default
        assert_eq!(
            messages(none, &strict),
            vec!["Missing required input \"environment\" for acme/deploy"]
        );
    }

    #[test]
    fn test_output_references() {
        let registry = registry();
        let text = "- id: ship\n  uses: acme/deploy@v1\n- run: echo ${{ steps.ship.outputs.uri }} ${{ steps.ship.outputs.url }} ${{ steps.other.outputs.x }}\n";
        let found = validate_output_references(text, &[step(&[])], &registry);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (3, 17));
        assert_eq!(
            found[0].message,
            "Unknown output \"uri\" of step \"ship\" (acme/deploy). Available outputs: url, revision"
        );
    }

    #[test]
    fn test_output_reference_needs_a_boundary() {
        let registry = registry();
        let text = "- run: echo ${{ mysteps.ship.outputs.nope }} $steps.ship.outputs.gone\n";
        let found = validate_output_references(text, &[step(&[])], &registry);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].column, 47);
        assert!(found[0].message.contains("\"gone\""));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("ab\ncdé f", 8), (2, 5));
    }
}
