//! The set of action schemas known to one validation run.

use crate::manifest::ActionSchema;
use std::collections::HashMap;

/// Split a `uses:` reference into its identifier and version.
///
/// `owner/name/path@v1` gives `("owner/name/path", "v1")`. Both halves must
/// be non-empty.
pub fn split_uses(uses: &str) -> Option<(&str, &str)> {
    let (identifier, version) = uses.trim().rsplit_once('@')?;
    if identifier.is_empty() || version.is_empty() {
        return None;
    }
    Some((identifier, version))
}

/// Immutable lookup of schemas by every identifier they answer to.
///
/// Identifiers are matched case-insensitively. When two schemas claim the
/// same identifier the first one keeps it.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: Vec<ActionSchema>,
    by_identifier: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new(schemas: impl IntoIterator<Item = ActionSchema>) -> Self {
        let schemas: Vec<ActionSchema> = schemas.into_iter().collect();
        let mut by_identifier: HashMap<String, usize> = HashMap::new();

        for (index, schema) in schemas.iter().enumerate() {
            for identifier in schema.identifiers() {
                let key = identifier.to_lowercase();
                if let Some(&existing) = by_identifier.get(&key) {
                    if existing != index {
                        tracing::warn!(
                            identifier,
                            kept = %schemas[existing].source_location,
                            ignored = %schema.source_location,
                            "identifier registered by more than one manifest"
                        );
                    }
                    continue;
                }
                by_identifier.insert(key, index);
            }
        }

        Self {
            schemas,
            by_identifier,
        }
    }

    /// Look up a schema by primary or alternate identifier.
    pub fn get(&self, identifier: &str) -> Option<&ActionSchema> {
        self.by_identifier
            .get(&identifier.to_lowercase())
            .map(|&index| &self.schemas[index])
    }

    /// The schema a `uses: <identifier>@<version>` reference points at.
    pub fn resolve_uses(&self, uses: &str) -> Option<&ActionSchema> {
        let (identifier, _version) = split_uses(uses)?;
        self.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::{IndexMap, IndexSet};
    use std::collections::BTreeSet;

    fn schema(identifier: &str, alternates: &[&str], location: &str) -> ActionSchema {
        ActionSchema {
            identifier: identifier.to_string(),
            alternate_identifiers: alternates.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            inputs: IndexMap::new(),
            outputs: IndexSet::new(),
            source_location: location.to_string(),
            example_texts: Vec::new(),
        }
    }

    #[test]
    fn test_split_uses() {
        assert_eq!(split_uses("acme/deploy@v1"), Some(("acme/deploy", "v1")));
        assert_eq!(split_uses(" acme/deploy/sub@main "), Some(("acme/deploy/sub", "main")));
        assert_eq!(split_uses("acme/deploy"), None);
        assert_eq!(split_uses("acme/deploy@"), None);
        assert_eq!(split_uses("@v1"), None);
    }

    #[test]
    fn test_lookup_by_alternate_and_case() {
        let registry = SchemaRegistry::new([schema("acme/deploy", &["upstream/deploy"], "action.yml")]);

        assert!(registry.resolve_uses("Acme/Deploy@v2").is_some());
        assert!(registry.resolve_uses("upstream/deploy@v1.2.3").is_some());
        assert!(registry.resolve_uses("acme/deploy-other@v1").is_none());
        assert!(registry.resolve_uses("acme/deploy").is_none());
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = SchemaRegistry::new([
            schema("acme/deploy", &[], "first/action.yml"),
            schema("acme/deploy", &[], "second/action.yml"),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("acme/deploy").unwrap().source_location,
            "first/action.yml"
        );
    }
}
