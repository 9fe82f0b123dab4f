//! Custom-type resolution.
//!
//! Resolution is bottom-up: a definition's `type` is resolved first (all the
//! way down to a base kind), and then the definition's own `match`, `options`,
//! `separators` and `items` replace the inherited fields they name. Fields the
//! definition leaves out are inherited unchanged. Every call produces a fresh
//! descriptor; nothing shared is mutated.

use super::definition::{ChoiceOptionSource, CustomTypes, InlineDefinition, TypeDefinition};
use super::{Pattern, TypeDescriptor, TypeKind};
use crate::error::{SchemaError, SchemaResult};
use crate::normalize::Separator;

/// Resolve a type definition against the custom types in scope.
///
/// # Errors
///
/// - [`SchemaError::UnknownTypeReference`] when a name (directly or through
///   another custom type) is neither a base kind nor a custom type.
/// - [`SchemaError::CyclicTypeReference`] when custom types refer back to
///   themselves.
/// - [`SchemaError::InvalidTypeDefinition`] / [`SchemaError::InvalidPattern`]
///   for definitions that cannot be a valid rule.
pub fn resolve(definition: &TypeDefinition, types: &CustomTypes) -> SchemaResult<TypeDescriptor> {
    let mut resolver = Resolver {
        types,
        chain: Vec::new(),
    };
    let descriptor = resolver.resolve(definition)?;
    Ok(finish(descriptor))
}

struct Resolver<'a> {
    types: &'a CustomTypes,
    /// Custom types currently being expanded, outermost first
    chain: Vec<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, definition: &TypeDefinition) -> SchemaResult<TypeDescriptor> {
        match definition {
            TypeDefinition::Reference(name) => self.resolve_name(name),
            TypeDefinition::Inline(inline) => self.resolve_inline(inline),
        }
    }

    fn resolve_name(&mut self, name: &str) -> SchemaResult<TypeDescriptor> {
        if let Some(kind) = TypeKind::parse(name) {
            return Ok(TypeDescriptor::of(kind));
        }

        let definition = self
            .types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownTypeReference {
                name: name.to_string(),
            })?;

        if self.chain.iter().any(|seen| seen == name) {
            let mut chain = self.chain.clone();
            chain.push(name.to_string());
            return Err(SchemaError::CyclicTypeReference {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        self.chain.push(name.to_string());
        let resolved = self.resolve(definition);
        self.chain.pop();
        resolved
    }

    fn resolve_inline(&mut self, inline: &InlineDefinition) -> SchemaResult<TypeDescriptor> {
        let type_name = inline.type_name.as_deref().ok_or_else(|| {
            SchemaError::InvalidTypeDefinition("a type definition needs a `type`".to_string())
        })?;

        let mut descriptor = self.resolve_name(type_name)?;

        if let Some(pattern) = &inline.pattern {
            descriptor.pattern = Some(Pattern::compile(pattern)?);
        }
        if let Some(options) = &inline.options {
            descriptor.options = Some(flatten_options(options));
        }
        if let Some(separators) = &inline.separators {
            descriptor.separators = separators.to_separators();
        }
        if let Some(items) = &inline.items {
            let item = self.resolve(items)?;
            descriptor.items = Some(Box::new(single_value_item(item)?));
        }

        check_shape(&descriptor)?;
        Ok(descriptor)
    }
}

/// Canonical values each followed by their alternatives, duplicates removed.
fn flatten_options(options: &[ChoiceOptionSource]) -> Vec<String> {
    let mut flat: Vec<String> = Vec::new();
    for spelling in options.iter().flat_map(ChoiceOptionSource::spellings) {
        if !flat.iter().any(|seen| seen == spelling) {
            flat.push(spelling.to_string());
        }
    }
    flat
}

fn check_shape(descriptor: &TypeDescriptor) -> SchemaResult<()> {
    let kind = descriptor.kind;
    if descriptor.pattern.is_some() && !matches!(kind, TypeKind::String | TypeKind::Choice) {
        return Err(SchemaError::InvalidTypeDefinition(format!(
            "`match` cannot be used with a {kind} type"
        )));
    }
    match (&descriptor.options, kind) {
        (Some(_), TypeKind::Choice) | (None, TypeKind::Boolean | TypeKind::Number | TypeKind::String | TypeKind::Any) => {}
        (Some(_), _) => {
            return Err(SchemaError::InvalidTypeDefinition(format!(
                "`options` cannot be used with a {kind} type"
            )));
        }
        (None, TypeKind::Choice) => {
            return Err(SchemaError::InvalidTypeDefinition(
                "a choice type needs `options`".to_string(),
            ));
        }
    }
    if descriptor.options.as_ref().is_some_and(Vec::is_empty) {
        return Err(SchemaError::InvalidTypeDefinition(
            "a choice type needs at least one option".to_string(),
        ));
    }
    Ok(())
}

/// Item types are single values: items of items are not supported.
fn single_value_item(item: TypeDescriptor) -> SchemaResult<TypeDescriptor> {
    if item.items.is_some() || !item.separators.is_empty() {
        return Err(SchemaError::InvalidTypeDefinition(
            "`items` cannot itself be a multi-value type".to_string(),
        ));
    }
    Ok(item)
}

/// Fill in the multi-value defaults once all overrides are applied.
///
/// `items` without `separators` splits on newlines. `separators` without
/// `items` checks every item against the type's own scalar rule.
fn finish(mut descriptor: TypeDescriptor) -> TypeDescriptor {
    match (&descriptor.items, descriptor.separators.is_empty()) {
        (Some(_), true) => descriptor.separators = vec![Separator::Newline],
        (None, false) => {
            let mut item = descriptor.clone();
            item.separators.clear();
            descriptor.items = Some(Box::new(item));
        }
        _ => {}
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(source: &str) -> CustomTypes {
        serde_yaml::from_str(source).unwrap()
    }

    fn definition(source: &str) -> TypeDefinition {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_base_kind_reference() {
        let resolved = resolve(&definition("boolean"), &CustomTypes::new()).unwrap();
        assert_eq!(resolved, TypeDescriptor::of(TypeKind::Boolean));
    }

    #[test]
    fn test_alternatives_flatten_in_declaration_order() {
        let resolved = resolve(
            &definition(
                r#"
type: choice
options:
  - development
  - value: production
    alternatives: [prod, live]
  - staging
"#,
            ),
            &CustomTypes::new(),
        )
        .unwrap();

        assert_eq!(
            resolved.options(),
            ["development", "production", "prod", "live", "staging"]
        );
    }

    #[test]
    fn test_override_replaces_inherited_fields() {
        let types = types(
            r#"
deploy-target:
  type: choice
  options: [development, staging, production]
  match: '^dev'
"#,
        );

        let resolved = resolve(
            &definition(
                r#"
type: deploy-target
options: [blue, green]
"#,
            ),
            &types,
        )
        .unwrap();

        assert_eq!(resolved.kind, TypeKind::Choice);
        assert_eq!(resolved.options(), ["blue", "green"]);
        // not overridden, so inherited
        assert_eq!(resolved.pattern.as_ref().map(Pattern::source), Some("^dev"));
    }

    #[test]
    fn test_override_does_not_touch_the_base() {
        let types = types(
            r#"
version:
  type: string
  match: '^v\d+$'
"#,
        );
        let derived = resolve(&definition("{type: version, match: '^latest$'}"), &types).unwrap();
        let base = resolve(&definition("version"), &types).unwrap();
        assert_eq!(derived.pattern.unwrap().source(), "^latest$");
        assert_eq!(base.pattern.unwrap().source(), r"^v\d+$");
    }

    #[test]
    fn test_transitive_custom_types() {
        let types = types(
            r#"
semver:
  type: string
  match: '^v?\d+(\.\d+)*$'
release: semver
pinned-release:
  type: release
"#,
        );
        let resolved = resolve(&definition("pinned-release"), &types).unwrap();
        assert_eq!(resolved.kind, TypeKind::String);
        assert!(resolved.pattern.unwrap().is_match("v1.2"));
    }

    #[test]
    fn test_unknown_reference() {
        let err = resolve(&definition("{type: nowhere}"), &CustomTypes::new()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTypeReference { ref name } if name == "nowhere"));

        let types = types("outer: {type: inner}");
        let err = resolve(&definition("outer"), &types).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTypeReference { ref name } if name == "inner"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let types = types("a: b\nb: {type: a}\n");
        let err = resolve(&definition("a"), &types).unwrap_err();
        match err {
            SchemaError::CyclicTypeReference { name, chain } => {
                assert_eq!(name, "a");
                assert_eq!(chain, "a -> b -> a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_shapes() {
        let none = CustomTypes::new();
        for source in [
            "{type: boolean, match: x}",
            "{type: string, options: [a]}",
            "{type: choice}",
            "{type: choice, options: []}",
            "{match: x}",
        ] {
            let err = resolve(&definition(source), &none).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidTypeDefinition(_)),
                "{source}: {err}"
            );
        }
    }

    #[test]
    fn test_items_default_to_newline_separator() {
        let resolved = resolve(
            &definition("{type: string, items: {type: number}}"),
            &CustomTypes::new(),
        )
        .unwrap();
        assert_eq!(resolved.separators, vec![Separator::Newline]);
        assert_eq!(resolved.item_type().unwrap().kind, TypeKind::Number);
    }

    #[test]
    fn test_separators_without_items_check_each_item() {
        let resolved = resolve(
            &definition(
                r#"
type: string
separators: [newline, ',']
match: '^(v\d+(\.\d+)*|latest)$'
"#,
            ),
            &CustomTypes::new(),
        )
        .unwrap();

        assert!(resolved.is_multi_value());
        assert_eq!(
            resolved.separators,
            vec![Separator::Newline, Separator::Literal(",".to_string())]
        );
        let item = resolved.item_type().unwrap();
        assert!(item.separators.is_empty());
        assert!(item.pattern.as_ref().unwrap().is_match("v1.0"));
    }

    #[test]
    fn test_nested_multi_value_items_are_rejected() {
        let err = resolve(
            &definition("{type: string, items: {type: string, separators: ','}}"),
            &CustomTypes::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeDefinition(_)));
    }
}
