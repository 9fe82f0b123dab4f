// Usage examples in documentation
//
// This crate finds fenced YAML blocks in free-form text, picks out the steps
// that reference known actions and checks their `with:` arguments and
// `steps.<id>.outputs.<name>` references against the action schemas.

pub mod blocks;
pub mod diagnostic;
pub mod scanner;
pub mod step;
pub mod validator;

pub use blocks::{CodeBlock, extract_blocks};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use step::{ArgumentForm, ReferencedStep, StepArgument, find_steps};
pub use validator::{ValidationOptions, validate_output_references, validate_step};

use action_docs_schema::{ActionSchema, SchemaRegistry};

/// Diagnostics for one piece of manifest prose.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleReport {
    /// Where the text came from, e.g. `input "token" description`
    pub origin: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate every fenced YAML block in a text.
///
/// Diagnostic positions are relative to `text` and sorted by line, then
/// column.
pub fn validate_text(
    text: &str,
    registry: &SchemaRegistry,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    extract_blocks(text)
        .iter()
        .flat_map(|block| validate_block(block, registry, options))
        .collect()
}

/// Validate one block, with positions moved into the surrounding text.
pub fn validate_block(
    block: &CodeBlock,
    registry: &SchemaRegistry,
    options: &ValidationOptions,
) -> Vec<Diagnostic> {
    let steps = find_steps(&block.content, registry);
    tracing::trace!(
        start_line = block.start_line,
        steps = steps.len(),
        "checking example block"
    );

    let mut diagnostics: Vec<Diagnostic> = steps
        .iter()
        .filter_map(|step| Some((step, registry.get(&step.schema_identifier)?)))
        .flat_map(|(step, schema)| validate_step(step, schema, options))
        .collect();
    diagnostics.extend(validate_output_references(&block.content, &steps, registry));

    let offset = block.start_line.saturating_sub(1);
    let mut diagnostics: Vec<Diagnostic> = diagnostics
        .into_iter()
        .map(|diagnostic| diagnostic.shifted(offset))
        .collect();
    diagnostics.sort_by_key(|diagnostic| (diagnostic.line, diagnostic.column));
    diagnostics
}

/// Validate the usage examples embedded in a manifest's own descriptions.
///
/// Only texts with at least one diagnostic are reported. Positions are
/// relative to the description text.
pub fn validate_schema_examples(
    schema: &ActionSchema,
    registry: &SchemaRegistry,
    options: &ValidationOptions,
) -> Vec<ExampleReport> {
    schema
        .example_texts
        .iter()
        .filter_map(|example| {
            let diagnostics = validate_text(&example.text, registry, options);
            (!diagnostics.is_empty()).then(|| ExampleReport {
                origin: example.origin.clone(),
                diagnostics,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use action_docs_schema::{ActionIdentity, SchemaRegistry, SourceFile, load};
    use std::path::Path;

    pub const MANIFEST: &str = r#"
name: Deploy
description: Deploys the current commit
inputs:
  environment:
    description: Target environment
    required: true
  dry-run:
    description: Only print what would happen
  retries:
    description: How often to retry
  versions:
    description: Versions to tag
  tags:
    description: Free-form tags
  token:
    description: API token
    required: true
    default: ${{ github.token }}
  region:
    description: Region to deploy to
outputs:
  url:
    description: Where it was deployed
  revision:
    description: Deployed revision
"#;

    pub const TYPE_SCHEMA: &str = r#"
types:
  deploy-target:
    type: choice
    options:
      - development
      - staging
      - value: production
        alternatives: [prod]
inputs:
  environment: deploy-target
  dry-run: boolean
  retries: number
  versions:
    type: string
    separators: [newline, ',']
    match: '^(v\d+(\.\d+)*|latest)$'
  region:
    type: choice
    options: [eu, us]
    match: '^[a-z]{2}-[a-z]+-\d$'
"#;

    pub fn registry() -> SchemaRegistry {
        let schema = load(
            SourceFile {
                path: Path::new("action.yml"),
                content: MANIFEST,
            },
            Some(SourceFile {
                path: Path::new("action.schema.yml"),
                content: TYPE_SCHEMA,
            }),
            Path::new(""),
            &ActionIdentity {
                repository: "acme/deploy".to_string(),
                parent: Some("upstream/deploy".to_string()),
            },
        )
        .unwrap();
        SchemaRegistry::new([schema])
    }
}
