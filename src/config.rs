//! Web output layout configuration.
//!
//! Every path getter takes a `CompilerConfig` explicitly; nothing in the
//! crate reads directory names from process-wide state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

// ---------------------------------------------------------------------------
// WebLayout
// ---------------------------------------------------------------------------

/// Directory names, page names and extensions inside the web directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebLayout {
    /// Root of the router app.
    pub pages_dir: String,
    /// Route modules, below `pages_dir`.
    pub routes_dir: String,
    pub utils_dir: String,
    pub styles_dir: String,
    /// Context module, without extension.
    pub context_module: String,
    pub theme_page: String,
    pub stylesheet_root: String,
    pub components_page: String,
    pub stateful_components_page: String,
    pub jsx_ext: String,
    pub js_ext: String,
    pub css_ext: String,
}

impl Default for WebLayout {
    fn default() -> Self {
        Self {
            pages_dir: "app".into(),
            routes_dir: "routes".into(),
            utils_dir: "utils".into(),
            styles_dir: "styles".into(),
            context_module: "utils/context".into(),
            theme_page: "theme".into(),
            stylesheet_root: "__global_styles".into(),
            components_page: "components".into(),
            stateful_components_page: "stateful_components".into(),
            jsx_ext: ".jsx".into(),
            js_ext: ".js".into(),
            css_ext: ".css".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CompilerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Web output directory every generated path is rooted at.
    pub web_dir: PathBuf,
    /// Where top-level build errors are logged.
    pub logs_dir: PathBuf,
    pub layout: WebLayout,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let web_dir = PathBuf::from(".web");
        Self {
            logs_dir: web_dir.join("logs"),
            web_dir,
            layout: WebLayout::default(),
        }
    }
}

impl CompilerConfig {
    /// Default layout rooted at `web_dir`, logging under `web_dir/logs`.
    pub fn with_web_dir(web_dir: impl Into<PathBuf>) -> Self {
        let web_dir = web_dir.into();
        Self {
            logs_dir: web_dir.join("logs"),
            web_dir,
            layout: WebLayout::default(),
        }
    }

    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
