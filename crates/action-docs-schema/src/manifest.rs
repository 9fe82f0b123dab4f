//! Loading an action manifest and its optional type schema.
//!
//! The manifest (`action.yml`) decides which inputs and outputs exist. The
//! sidecar type schema (`action.schema.yml`) decides what their values must
//! look like. Anything the sidecar describes must exist in the manifest.

use crate::error::{EntryKind, SchemaError, SchemaResult};
use crate::normalize::{Normalized, normalize_boolean};
use crate::types::{
    ChoiceOptionSource, CustomTypes, InlineDefinition, SeparatorSource, TypeDefinition,
    TypeDescriptor, resolve,
};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// The file names a type schema may have next to a manifest.
///
/// `action.yml` is described by `action.schema.yml` or `action.schema.yaml`.
pub fn type_schema_paths(manifest_path: &Path) -> [PathBuf; 2] {
    let stem = manifest_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("action");
    [
        manifest_path.with_file_name(format!("{stem}.schema.yml")),
        manifest_path.with_file_name(format!("{stem}.schema.yaml")),
    ]
}

/// A file the loader reads from. The caller has already read it.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a Path,
    pub content: &'a str,
}

/// Names under which the repository's actions are referenced.
#[derive(Debug, Clone, Default)]
pub struct ActionIdentity {
    /// `owner/name` of the repository being checked
    pub repository: String,
    /// `owner/name` of the repository this one was forked from
    pub parent: Option<String>,
}

/// What is known about one input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub required: bool,
    pub has_default: bool,
    /// No type means any value is accepted.
    pub type_descriptor: Option<TypeDescriptor>,
}

/// A piece of manifest prose that may contain usage examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleText {
    /// Human-readable origin, e.g. `description` or `input "token" description`
    pub origin: String,
    pub text: String,
}

/// Everything needed to check usages of one action.
///
/// Built once per manifest and never changed afterwards.
#[derive(Debug, Clone)]
pub struct ActionSchema {
    /// `owner/name` or `owner/name/sub/path`
    pub identifier: String,
    pub alternate_identifiers: BTreeSet<String>,
    pub inputs: IndexMap<String, InputSpec>,
    pub outputs: IndexSet<String>,
    pub source_location: String,
    pub example_texts: Vec<ExampleText>,
}

impl ActionSchema {
    /// Every identifier this schema answers to, primary first.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.identifier.as_str())
            .chain(self.alternate_identifiers.iter().map(String::as_str))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ActionManifest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    inputs: Option<IndexMap<String, Option<ManifestInput>>>,
    #[serde(default)]
    outputs: Option<IndexMap<String, serde_yaml::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestInput {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: Option<serde_yaml::Value>,
    #[serde(default)]
    default: Option<serde_yaml::Value>,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(rename = "match", default)]
    pattern: Option<String>,
    #[serde(default)]
    options: Option<Vec<ChoiceOptionSource>>,
    #[serde(default)]
    separators: Option<SeparatorSource>,
    #[serde(default)]
    items: Option<Box<TypeDefinition>>,
}

impl ManifestInput {
    fn is_required(&self) -> bool {
        match &self.required {
            Some(serde_yaml::Value::Bool(b)) => *b,
            Some(serde_yaml::Value::String(s)) => normalize_boolean(s) == Normalized::Value(Some(true)),
            _ => false,
        }
    }

    /// The manifest's own type, if it declares one.
    fn inline_definition(&self) -> Option<TypeDefinition> {
        let type_name = self.type_name.clone()?;
        Some(TypeDefinition::Inline(InlineDefinition {
            type_name: Some(type_name),
            pattern: self.pattern.clone(),
            options: self.options.clone(),
            separators: self.separators.clone(),
            items: self.items.clone(),
            description: None,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
struct TypeSchemaFile {
    #[serde(default)]
    types: Option<CustomTypes>,
    #[serde(default)]
    inputs: Option<IndexMap<String, TypeDefinition>>,
    #[serde(default)]
    outputs: Option<IndexMap<String, TypeDefinition>>,
}

/// Load one action's schema.
///
/// `repo_root` locates the manifest inside the repository: a manifest at the
/// root is referenced as `owner/name`, one in `sub/dir` as
/// `owner/name/sub/dir`. The same suffix is appended to the parent repository
/// to form the alternate identifier.
///
/// # Errors
///
/// Any [`SchemaError`]: the manifest or type schema is not a mapping, a type
/// does not resolve, or the type schema describes an undeclared entry.
pub fn load(
    manifest: SourceFile<'_>,
    type_schema: Option<SourceFile<'_>>,
    repo_root: &Path,
    identity: &ActionIdentity,
) -> SchemaResult<ActionSchema> {
    let manifest_path = manifest.path.display().to_string();
    let parsed = parse_manifest(manifest.content, &manifest_path)?;
    let sidecar = match type_schema {
        Some(file) => parse_type_schema(file.content, &file.path.display().to_string())?,
        None => TypeSchemaFile::default(),
    };
    let sidecar_path = type_schema
        .map(|file| file.path.display().to_string())
        .unwrap_or_default();

    let suffix = relative_dir(manifest.path, repo_root).ok_or_else(|| {
        SchemaError::MalformedManifest {
            path: manifest_path.clone(),
            message: format!("not inside the repository root {}", repo_root.display()),
        }
    })?;
    let identifier = with_suffix(&identity.repository, &suffix);
    let alternate_identifiers = identity
        .parent
        .iter()
        .map(|parent| with_suffix(parent, &suffix))
        .filter(|alternate| !alternate.eq_ignore_ascii_case(&identifier))
        .collect();

    let types = sidecar.types.unwrap_or_default();
    for (name, definition) in &types {
        resolve(definition, &types).map_err(|err| err.in_entry(EntryKind::Type, name))?;
    }

    let declared_inputs = parsed.inputs.unwrap_or_default();
    let declared_outputs = parsed.outputs.unwrap_or_default();

    let mut sidecar_inputs = sidecar.inputs.unwrap_or_default();
    check_declared(&sidecar_inputs, &declared_inputs, EntryKind::Input, &sidecar_path)?;
    let sidecar_outputs = sidecar.outputs.unwrap_or_default();
    check_declared(&sidecar_outputs, &declared_outputs, EntryKind::Output, &sidecar_path)?;
    for (name, definition) in &sidecar_outputs {
        resolve(definition, &types).map_err(|err| err.in_entry(EntryKind::Output, name))?;
    }

    let mut example_texts = Vec::new();
    if let Some(description) = parsed.description {
        example_texts.push(ExampleText {
            origin: "description".to_string(),
            text: description,
        });
    }

    let mut inputs = IndexMap::new();
    for (name, input) in declared_inputs {
        let input = input.unwrap_or_default();
        let definition = sidecar_inputs
            .shift_remove(&name)
            .or_else(|| input.inline_definition());
        let type_descriptor = definition
            .map(|definition| resolve(&definition, &types))
            .transpose()
            .map_err(|err| err.in_entry(EntryKind::Input, &name))?;

        if let Some(description) = &input.description {
            example_texts.push(ExampleText {
                origin: format!("input \"{name}\" description"),
                text: description.clone(),
            });
        }

        inputs.insert(
            name,
            InputSpec {
                required: input.is_required(),
                has_default: input.default.is_some(),
                type_descriptor,
            },
        );
    }

    tracing::debug!(
        identifier = %identifier,
        inputs = inputs.len(),
        outputs = declared_outputs.len(),
        "loaded action schema"
    );

    Ok(ActionSchema {
        identifier,
        alternate_identifiers,
        inputs,
        outputs: declared_outputs.into_keys().collect(),
        source_location: manifest_path,
        example_texts,
    })
}

fn parse_manifest(content: &str, path: &str) -> SchemaResult<ActionManifest> {
    let malformed = |message: String| SchemaError::MalformedManifest {
        path: path.to_string(),
        message,
    };
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| malformed(err.to_string()))?;
    if !value.is_mapping() {
        return Err(malformed("expected a mapping at the top level".to_string()));
    }
    serde_yaml::from_value(value).map_err(|err| malformed(err.to_string()))
}

fn parse_type_schema(content: &str, path: &str) -> SchemaResult<TypeSchemaFile> {
    let malformed = |message: String| SchemaError::MalformedTypeSchema {
        path: path.to_string(),
        message,
    };
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| malformed(err.to_string()))?;
    match value {
        serde_yaml::Value::Null => Ok(TypeSchemaFile::default()),
        value if value.is_mapping() => {
            serde_yaml::from_value(value).map_err(|err| malformed(err.to_string()))
        }
        _ => Err(malformed("expected a mapping at the top level".to_string())),
    }
}

fn check_declared<T, U>(
    described: &IndexMap<String, T>,
    declared: &IndexMap<String, U>,
    kind: EntryKind,
    path: &str,
) -> SchemaResult<()> {
    match described.keys().find(|name| !declared.contains_key(*name)) {
        Some(name) => Err(SchemaError::UndeclaredEntry {
            kind,
            name: name.clone(),
            path: path.to_string(),
        }),
        None => Ok(()),
    }
}

/// The manifest's directory relative to the root, `/`-joined.
///
/// `.` components are ignored on both sides so `./action.yml` and
/// `action.yml` under `.` both land at the root.
fn relative_dir(manifest_path: &Path, repo_root: &Path) -> Option<String> {
    fn normal(path: &Path) -> Vec<String> {
        path.components()
            .filter_map(|component| match component {
                Component::CurDir => None,
                other => Some(other.as_os_str().to_string_lossy().into_owned()),
            })
            .collect()
    }

    let dir = normal(manifest_path.parent().unwrap_or_else(|| Path::new("")));
    let root = normal(repo_root);
    let rest = dir.strip_prefix(root.as_slice())?;
    Some(rest.join("/"))
}

fn with_suffix(base: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{suffix}")
    }
}
