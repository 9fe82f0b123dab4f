// Repository-level driver for action usage checks
//
// Loads every action manifest under a root, builds the schema registry once,
// and checks the manifests' own descriptions and the documentation files
// against it. This is the only crate that touches the filesystem.

pub mod discover;
pub mod report;

pub use report::{LoadFailure, RunOutcome, RunSummary, SourceReport, write_json, write_text};

use action_docs_examples::{ValidationOptions, validate_schema_examples, validate_text};
use action_docs_schema::{ActionIdentity, ActionSchema, SchemaRegistry, SourceFile};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// What to check and how.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root: PathBuf,
    pub identity: ActionIdentity,
    /// Documentation globs, relative to `root`
    pub docs: Vec<String>,
    pub options: ValidationOptions,
}

/// Load all manifests, then check descriptions and documentation.
///
/// A manifest that fails to load is recorded in the outcome and the run
/// continues without it.
///
/// # Errors
///
/// Filesystem failures: the root cannot be walked, a documentation pattern
/// is invalid or names a missing file, or a file cannot be read.
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    let mut outcome = RunOutcome::default();
    let manifests = discover::find_manifests(&config.root)?;
    tracing::info!(count = manifests.len(), root = %config.root.display(), "found manifests");

    let mut schemas = Vec::new();
    for manifest in &manifests {
        match load_manifest(manifest, config) {
            Ok(schema) => schemas.push(schema),
            Err(err) => {
                tracing::warn!(manifest = %manifest.display(), error = %err, "failed to load manifest");
                outcome.load_failures.push(LoadFailure {
                    source: display_path(manifest, &config.root),
                    error: format!("{err:#}"),
                });
            }
        }
    }
    let registry = SchemaRegistry::new(schemas);

    for schema in registry.iter() {
        let source = display_path(Path::new(&schema.source_location), &config.root);
        for example in validate_schema_examples(schema, &registry, &config.options) {
            outcome.reports.push(SourceReport {
                source: format!("{source} ({})", example.origin),
                diagnostics: example.diagnostics,
            });
        }
    }

    let docs = discover::expand_doc_globs(&config.root, &config.docs)?;
    for doc in &docs {
        let text = std::fs::read_to_string(doc)
            .with_context(|| format!("Failed to read {}", doc.display()))?;
        let diagnostics = validate_text(&text, &registry, &config.options);
        tracing::debug!(file = %doc.display(), diagnostics = diagnostics.len(), "checked documentation");
        if !diagnostics.is_empty() {
            outcome.reports.push(SourceReport {
                source: display_path(doc, &config.root),
                diagnostics,
            });
        }
    }

    outcome.summary = RunSummary {
        files_scanned: registry.len() + docs.len(),
        diagnostics: outcome.reports.iter().map(|r| r.diagnostics.len()).sum(),
        load_failures: outcome.load_failures.len(),
    };
    Ok(outcome)
}

fn load_manifest(manifest: &Path, config: &RunConfig) -> Result<ActionSchema> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;

    let type_schema_path = discover::find_type_schema(manifest);
    let type_schema_content = type_schema_path
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let type_schema = match (&type_schema_path, &type_schema_content) {
        (Some(path), Some(content)) => Some(SourceFile { path, content }),
        _ => None,
    };

    let schema = action_docs_schema::load(
        SourceFile {
            path: manifest,
            content: &content,
        },
        type_schema,
        &config.root,
        &config.identity,
    )?;
    Ok(schema)
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
