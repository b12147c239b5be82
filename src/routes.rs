//! Route path resolver.
//!
//! Maps a `/`-delimited logical route onto the flat file-name convention of
//! the file-system router, then composes the output path of every generated
//! module from the injected [`CompilerConfig`].
//!
//! | segment         | stem part |
//! |-----------------|-----------|
//! | `[[...name]]`   | `($name)` |
//! | `[...name]`     | `$`       |
//! | `[[name]]`      | `($name)` |
//! | `[name]`        | `$name`   |
//! | `name`          | `[name]`  |

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::CompilerConfig;

lazy_static! {
    static ref OPTIONAL_CATCH_ALL_RE: Regex = Regex::new(r"^\[\[\.\.\.([^\[\]]+)\]\]$").unwrap();
    static ref CATCH_ALL_RE: Regex = Regex::new(r"^\[\.\.\.([^\[\]]+)\]$").unwrap();
    static ref OPTIONAL_RE: Regex = Regex::new(r"^\[\[([^\[\]]+)\]\]$").unwrap();
    static ref DYNAMIC_RE: Regex = Regex::new(r"^\[([^\[\]]+)\]$").unwrap();
}

const INDEX_ROUTE: &str = "index";
const INDEX_STEM: &str = "_index";

// ---------------------------------------------------------------------------
// Stems
// ---------------------------------------------------------------------------

fn format_route_part(part: &str) -> String {
    // optional catch-all must be tried before the plain catch-all and optional
    if let Some(caps) = OPTIONAL_CATCH_ALL_RE.captures(part) {
        return format!("(${})", &caps[1]);
    }
    if CATCH_ALL_RE.is_match(part) {
        return "$".to_string();
    }
    if let Some(caps) = OPTIONAL_RE.captures(part) {
        return format!("(${})", &caps[1]);
    }
    if let Some(caps) = DYNAMIC_RE.captures(part) {
        return format!("${}", &caps[1]);
    }
    format!("[{}]", part)
}

/// File stem of the route module for `path`.
///
/// `index` maps to the root index stem. Otherwise segments are rewritten and
/// joined with `.`; the stem gets an `._index` suffix unless it ends in a
/// catch-all `$`.
pub fn path_to_file_stem(path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path == INDEX_ROUTE {
        return INDEX_STEM.to_string();
    }

    let name = path
        .split('/')
        .map(format_route_part)
        .collect::<Vec<_>>()
        .join(".");

    if name.ends_with('$') {
        name
    } else {
        format!("{}.{}", name, INDEX_STEM)
    }
}

// ---------------------------------------------------------------------------
// Output paths
// ---------------------------------------------------------------------------

/// Compiled page module for the route `path`.
pub fn page_path(config: &CompilerConfig, path: &str) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(&layout.pages_dir)
        .join(&layout.routes_dir)
        .join(format!("{}{}", path_to_file_stem(path), layout.jsx_ext))
}

pub fn theme_path(config: &CompilerConfig) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(&layout.utils_dir)
        .join(format!("{}{}", layout.theme_page, layout.js_ext))
}

pub fn root_stylesheet_path(config: &CompilerConfig) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(&layout.styles_dir)
        .join(format!("{}{}", layout.stylesheet_root, layout.css_ext))
}

pub fn context_path(config: &CompilerConfig) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(format!("{}{}", layout.context_module, layout.js_ext))
}

/// Shared module holding every compiled custom component.
pub fn components_path(config: &CompilerConfig) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(&layout.utils_dir)
        .join(format!("{}{}", layout.components_page, layout.jsx_ext))
}

pub fn stateful_components_path(config: &CompilerConfig) -> PathBuf {
    let layout = &config.layout;
    config
        .web_dir
        .join(&layout.utils_dir)
        .join(format!("{}{}", layout.stateful_components_page, layout.jsx_ext))
}

/// `path` itself when it already lives under the web directory, otherwise
/// `path` joined onto it.
pub fn resolve_path_of_web_dir(config: &CompilerConfig, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.starts_with(&config.web_dir) {
        path.to_path_buf()
    } else {
        config.web_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
