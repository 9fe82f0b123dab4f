//! Finding manifests and documentation files under a repository root.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never searched.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

const MANIFEST_NAMES: &[&str] = &["action.yml", "action.yaml"];

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn in_skipped_dir(path: &Path) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
    })
}

/// Every `action.yml` / `action.yaml` below `root`, sorted.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let is_manifest = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| MANIFEST_NAMES.contains(&name));
        if is_manifest {
            manifests.push(entry.into_path());
        }
    }
    manifests.sort();
    Ok(manifests)
}

/// The sidecar type schema next to a manifest, if one exists.
pub fn find_type_schema(manifest: &Path) -> Option<PathBuf> {
    action_docs_schema::type_schema_paths(manifest)
        .into_iter()
        .find(|path| path.is_file())
}

/// Expand documentation globs relative to `root`.
///
/// A pattern without glob characters names a single file, which must exist.
/// Matches inside skipped directories are dropped; the result is sorted and
/// free of duplicates.
pub fn expand_doc_globs(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let full = root.join(pattern);
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let full = full.to_string_lossy();
            let paths = glob::glob(&full).with_context(|| format!("Invalid glob pattern: {pattern}"))?;

            let mut match_count = 0;
            for path in paths {
                let path = path.with_context(|| format!("Failed to read glob match for: {pattern}"))?;
                let relative = path.strip_prefix(root).unwrap_or(&path);
                if path.is_file() && !in_skipped_dir(relative) {
                    files.insert(path);
                    match_count += 1;
                }
            }

            if match_count == 0 {
                tracing::warn!(pattern = %pattern, "no documentation files matched");
            }
        } else {
            if !full.is_file() {
                anyhow::bail!("File not found: {}", full.display());
            }
            files.insert(full);
        }
    }

    Ok(files.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_find_manifests_skips_vendored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "action.yml");
        touch(root, "tools/setup/action.yaml");
        touch(root, "node_modules/dep/action.yml");
        touch(root, ".git/action.yml");
        touch(root, "tools/setup/action.schema.yml");

        let found: Vec<PathBuf> = find_manifests(root)
            .unwrap()
            .into_iter()
            .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![PathBuf::from("action.yml"), PathBuf::from("tools/setup/action.yaml")]
        );
    }

    #[test]
    fn test_find_type_schema_prefers_yml() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "action.yml");
        assert_eq!(find_type_schema(&root.join("action.yml")), None);

        touch(root, "action.schema.yaml");
        touch(root, "action.schema.yml");
        assert_eq!(
            find_type_schema(&root.join("action.yml")),
            Some(root.join("action.schema.yml"))
        );
    }

    #[test]
    fn test_expand_doc_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "README.md");
        touch(root, "docs/usage.md");
        touch(root, "node_modules/pkg/README.md");

        let found = expand_doc_globs(root, &["**/*.md".to_string(), "README.md".to_string()]).unwrap();
        assert_eq!(found, vec![root.join("README.md"), root.join("docs/usage.md")]);
    }

    #[test]
    fn test_missing_literal_doc_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_doc_globs(dir.path(), &["MISSING.md".to_string()]).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
