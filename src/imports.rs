//! Import requests and the per-compile import manifest.
//!
//! Components, hooks and custom code each contribute `ImportVar`s keyed by
//! library. The manifest merges them in source order, collapses duplicates
//! and validates that no binding is claimed by two unrelated libraries
//! before the statement compiler turns it into import descriptors.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{EMPTY_LIBRARY, ROOT_PACKAGE_PATH};
use crate::{CompileError, Result};

// ---------------------------------------------------------------------------
// ImportVar
// ---------------------------------------------------------------------------

/// A single importable symbol requested from a library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportVar {
    /// Exported identifier. `None` for module-only imports.
    #[serde(default)]
    pub tag: Option<String>,
    /// Sub-path within the library, `/` for the package root.
    #[serde(default = "default_package_path")]
    pub package_path: String,
    /// Local rename of the binding.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    /// Whether the library must be installed as a package dependency.
    #[serde(default = "default_true")]
    pub install: bool,
    /// Whether the import is emitted. Non-rendered imports are metadata only.
    #[serde(default = "default_true")]
    pub render: bool,
}

fn default_package_path() -> String {
    ROOT_PACKAGE_PATH.to_string()
}

fn default_true() -> bool {
    true
}

impl ImportVar {
    /// Named import of `tag` from the package root.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            package_path: default_package_path(),
            alias: None,
            is_default: false,
            install: true,
            render: true,
        }
    }

    /// Import that names no symbol (side effect or install-only).
    pub fn module() -> Self {
        Self {
            tag: None,
            ..Self::new("")
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_package_path(mut self, path: impl Into<String>) -> Self {
        self.package_path = path.into();
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Mark as metadata only; it never reaches emitted code.
    pub fn without_render(mut self) -> Self {
        self.render = false;
        self
    }

    pub fn without_install(mut self) -> Self {
        self.install = false;
        self
    }

    /// The binding as it appears in an import statement.
    pub fn name(&self) -> String {
        let tag = self.tag.as_deref().unwrap_or_default();
        match self.alias.as_deref() {
            Some(alias) if self.is_default && tag != "*" => alias.to_string(),
            Some(alias) if !tag.is_empty() => format!("{} as {}", tag, alias),
            Some(alias) => alias.to_string(),
            None => tag.to_string(),
        }
    }

    /// `tag/alias` when aliased, bare `tag` otherwise. `None` when the import
    /// binds nothing and therefore cannot conflict.
    pub fn identity(&self) -> Option<String> {
        match (&self.tag, &self.alias) {
            (tag, Some(alias)) => Some(format!(
                "{}/{}",
                tag.as_deref().unwrap_or_default(),
                alias
            )),
            (Some(tag), None) => Some(tag.clone()),
            (None, None) => None,
        }
    }
}

impl From<&str> for ImportVar {
    fn from(tag: &str) -> Self {
        ImportVar::new(tag)
    }
}

// ---------------------------------------------------------------------------
// ImportManifest
// ---------------------------------------------------------------------------

/// Library identifier to the imports requested from it, in insertion order.
///
/// A library key may carry a version (`lib@1.2.0`) and a `$` prefix marks a
/// local namespace. The empty key holds global imports with no package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportManifest {
    libraries: IndexMap<String, Vec<ImportVar>>,
}

impl ImportManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one import to `lib`, creating the entry if needed.
    pub fn add(&mut self, lib: impl Into<String>, var: impl Into<ImportVar>) -> &mut Self {
        self.libraries
            .entry(lib.into())
            .or_default()
            .push(var.into());
        self
    }

    pub fn extend(
        &mut self,
        lib: impl Into<String>,
        vars: impl IntoIterator<Item = ImportVar>,
    ) -> &mut Self {
        self.libraries.entry(lib.into()).or_default().extend(vars);
        self
    }

    pub fn get(&self, lib: &str) -> Option<&[ImportVar]> {
        self.libraries.get(lib).map(Vec::as_slice)
    }

    pub fn contains(&self, lib: &str) -> bool {
        self.libraries.contains_key(lib)
    }

    /// Drop a library, keeping the order of the rest.
    pub fn remove(&mut self, lib: &str) -> Option<Vec<ImportVar>> {
        self.libraries.shift_remove(lib)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ImportVar])> {
        self.libraries
            .iter()
            .map(|(lib, vars)| (lib.as_str(), vars.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Concatenate `other` onto this manifest. Lists are appended, not deduped.
    pub fn merge(&mut self, other: &ImportManifest) {
        for (lib, vars) in &other.libraries {
            self.libraries
                .entry(lib.clone())
                .or_default()
                .extend(vars.iter().cloned());
        }
    }

    /// Dedup each library's imports by full identity, keeping first occurrence.
    pub fn collapse(&self) -> ImportManifest {
        let libraries = self
            .libraries
            .iter()
            .map(|(lib, vars)| {
                let mut unique: Vec<ImportVar> = Vec::with_capacity(vars.len());
                for var in vars {
                    if !unique.contains(var) {
                        unique.push(var.clone());
                    }
                }
                (lib.clone(), unique)
            })
            .collect();
        ImportManifest { libraries }
    }

    /// Fail if the same `tag/alias` binding comes from two unrelated libraries.
    ///
    /// `lib` and `$lib` count as the same source; the entry coalesces onto the
    /// non-`$` form.
    pub fn validate(&self) -> Result<()> {
        let mut used_tags: HashMap<String, String> = HashMap::new();

        for (lib, vars) in &self.libraries {
            for var in vars {
                let Some(import_name) = var.identity() else {
                    continue;
                };

                let Some(already_imported) = used_tags.get(&import_name).cloned() else {
                    used_tags.insert(import_name, lib.clone());
                    continue;
                };

                if &already_imported == lib {
                    continue;
                }

                if is_dollar_alias(&already_imported, lib) {
                    let canonical = if lib.starts_with('$') {
                        already_imported
                    } else {
                        lib.clone()
                    };
                    tracing::debug!(
                        tag = %import_name,
                        library = %canonical,
                        "coalescing `$`-aliased import"
                    );
                    used_tags.insert(import_name, canonical);
                    continue;
                }

                return Err(CompileError::ImportConflict {
                    tag: import_name,
                    lib: lib.clone(),
                    other: already_imported,
                });
            }
        }

        Ok(())
    }

    /// Version-annotated package libraries that need installing.
    ///
    /// Local `$` namespaces and the empty library are never installed.
    pub fn install_packages(&self) -> Vec<String> {
        self.libraries
            .iter()
            .filter(|(lib, _)| lib.as_str() != EMPTY_LIBRARY && !lib.starts_with('$'))
            .filter(|(_, vars)| vars.iter().any(|var| var.install))
            .map(|(lib, _)| lib.clone())
            .collect()
    }
}

fn is_dollar_alias(a: &str, b: &str) -> bool {
    a.strip_prefix('$') == Some(b) || b.strip_prefix('$') == Some(a)
}

impl FromIterator<(String, Vec<ImportVar>)> for ImportManifest {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ImportVar>)>>(iter: I) -> Self {
        let mut manifest = ImportManifest::new();
        for (lib, vars) in iter {
            manifest.extend(lib, vars);
        }
        manifest
    }
}

/// Merge several manifests into one, preserving source order per library.
pub fn merge_imports<'a>(sources: impl IntoIterator<Item = &'a ImportManifest>) -> ImportManifest {
    let mut merged = ImportManifest::new();
    for source in sources {
        merged.merge(source);
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
