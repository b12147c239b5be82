//! # Zenith Codegen
//!
//! Ahead-of-time compiler that turns a server-defined component tree and its
//! reactive state definitions into the artifacts a file-system router needs:
//! import statements, custom component records, the initial state snapshot,
//! client storage bindings, the document root, the global theme and the
//! output path of every generated file.
//!
//! Every stage is a pure transform over value objects. Manifests and
//! statement descriptors are rebuilt per compile; nothing is shared between
//! stages except what a caller passes along.

pub mod component;
pub mod config;
pub mod constants;
pub mod document;
pub mod element;
pub mod imports;
pub mod output;
pub mod routes;
pub mod runtime;
pub mod state;
pub mod statements;

use thiserror::Error;

pub use component::{
    compile_component, compile_components, compile_custom_component, CompiledComponent,
    CompiledPage, CustomComponent, ImportSource, Renderable, UserComponent,
};
pub use config::{CompilerConfig, WebLayout};
pub use document::{add_meta, create_document_root, create_theme, StyleKey};
pub use element::{Element, Node};
pub use imports::{merge_imports, ImportManifest, ImportVar};
pub use runtime::ExecutionContext;
pub use state::{
    compile_client_storage, compile_state, ClientStorage, ClientStorageMap, Cookie,
    DeltaResolver, FieldDef, LocalStorage, SessionStorage, StateDef, StorageKind, TaskResolver,
};
pub use statements::{compile_import_statement, compile_imports, ImportStatement};

// ---------------------------------------------------------------------------
// CompileError
// ---------------------------------------------------------------------------

/// Errors that abort a compile step. None of them are retried.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Can not compile, the tag {tag} is used multiple time from {lib} and {other}")]
    ImportConflict {
        tag: String,
        lib: String,
        other: String,
    },

    #[error("State resolution failed: {0}")]
    StateResolution(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
