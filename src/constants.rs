//! Framework library names and fixed keys shared by the compile stages.

/// Runtime library that provides the JSX helper for emitted components.
pub const JSX_RUNTIME_LIBRARY: &str = "@emotion/react";

/// Named export of [`JSX_RUNTIME_LIBRARY`] every custom component needs.
pub const JSX_HELPER: &str = "jsx";

/// Router library that provides the document-level components.
pub const ROUTER_LIBRARY: &str = "react-router";

/// Local namespace all compiled custom components are exported from.
pub const CUSTOM_COMPONENTS_LIBRARY: &str = "$/utils/components";

/// Suffix appended to `"{state}.{field}"` client storage keys.
pub const FIELD_MARKER: &str = "_zx_state_";

/// Library key for global imports that have no owning package.
pub const EMPTY_LIBRARY: &str = "";

/// Default `package_path` of an import.
pub const ROOT_PACKAGE_PATH: &str = "/";
