//! Import statement compiler.
//!
//! Turns a collapsed, validated [`ImportManifest`] into one
//! `{lib, default, rest}` descriptor per emitted `import` line. The
//! templating layer renders them as `import default, { ...rest } from "lib"`.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{EMPTY_LIBRARY, ROOT_PACKAGE_PATH};
use crate::imports::{ImportManifest, ImportVar};
use crate::{CompileError, Result};

/// One emitted import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub lib: String,
    /// Default binding, empty when there is none.
    pub default: String,
    /// Named bindings, sorted.
    pub rest: Vec<String>,
}

impl ImportStatement {
    pub fn new(lib: impl Into<String>, default: impl Into<String>, rest: Vec<String>) -> Self {
        Self {
            lib: lib.into(),
            default: default.into(),
            rest,
        }
    }

    /// Side-effect import of a module with no bindings.
    pub fn module(lib: impl Into<String>) -> Self {
        Self::new(lib, "", Vec::new())
    }
}

/// Compile the imports of one `(library, package_path)` group into its
/// default binding and its sorted named bindings.
///
/// Non-rendered imports are ignored and module-only imports bind nothing.
/// More than one default is an error.
pub fn compile_import_statement(fields: &[ImportVar]) -> Result<(String, Vec<String>)> {
    let rendered = fields.iter().filter(|field| field.render);

    let (defaults, named): (Vec<&ImportVar>, Vec<&ImportVar>) =
        rendered.partition(|field| field.is_default);

    // distinct by the full import, not just the rendered binding
    let mut unique_defaults: Vec<&ImportVar> = Vec::with_capacity(defaults.len());
    for field in defaults {
        if !unique_defaults.contains(&field) {
            unique_defaults.push(field);
        }
    }
    if unique_defaults.len() >= 2 {
        return Err(CompileError::InvalidImport(
            "Only one default import is allowed.".into(),
        ));
    }

    let default = unique_defaults
        .first()
        .map(|field| field.name())
        .unwrap_or_default();
    let rest: BTreeSet<String> = named
        .iter()
        .map(|field| field.name())
        .filter(|name| !name.is_empty())
        .collect();

    Ok((default, rest.into_iter().collect()))
}

/// Compile a whole manifest into import statements.
///
/// The manifest is collapsed and validated first. Each library is split by
/// `package_path`; the empty library emits one side-effect import per named
/// module and may not declare a default.
pub fn compile_imports(manifest: &ImportManifest) -> Result<Vec<ImportStatement>> {
    let collapsed = manifest.collapse();
    collapsed.validate()?;

    let mut statements = Vec::new();

    for (lib, fields) in collapsed.iter() {
        let mut lib_paths: IndexMap<&str, Vec<ImportVar>> = IndexMap::new();
        for field in fields {
            lib_paths
                .entry(field.package_path.as_str())
                .or_default()
                .push(field.clone());
        }

        for (path, fields) in lib_paths {
            // metadata-only groups never reach the page
            if !fields.iter().any(|field| field.render) {
                continue;
            }

            let (default, rest) = compile_import_statement(&fields)?;

            if lib == EMPTY_LIBRARY {
                if !default.is_empty() {
                    return Err(CompileError::InvalidImport(
                        "No default field allowed for empty library.".into(),
                    ));
                }
                if rest.is_empty() {
                    return Err(CompileError::InvalidImport("No fields to import.".into()));
                }
                statements.extend(rest.into_iter().map(ImportStatement::module));
                continue;
            }

            let mut formatted_lib = format_library_name(lib).to_string();
            if path != ROOT_PACKAGE_PATH {
                formatted_lib.push_str(path);
            }

            statements.push(ImportStatement::new(formatted_lib, default, rest));
        }
    }

    Ok(statements)
}

/// Strip the version from a library identifier: `lib@1.2.0` → `lib`.
///
/// Scoped packages keep their leading `@`; URLs are returned untouched.
pub fn format_library_name(library: &str) -> &str {
    if library.starts_with("https://") {
        return library;
    }
    match library.rsplit_once('@') {
        Some((lib, _version)) if !lib.is_empty() => lib,
        _ => library,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
