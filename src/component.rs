//! Component and custom component compiler.
//!
//! A component is anything that can render itself and report what it needs
//! at module level. The compiler never inspects component internals beyond
//! these two capabilities, so any tree representation can plug in.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CUSTOM_COMPONENTS_LIBRARY, JSX_HELPER, JSX_RUNTIME_LIBRARY};
use crate::element::Element;
use crate::imports::{merge_imports, ImportManifest, ImportVar};
use crate::statements::{compile_imports, ImportStatement};
use crate::Result;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Produces the render tree handed to the templating layer.
pub trait Renderable {
    fn render(&self) -> Value;
}

/// Reports the module-level requirements of a component and its descendants.
pub trait ImportSource {
    fn all_imports(&self) -> ImportManifest;
    fn all_hooks(&self) -> IndexSet<String>;
    fn all_custom_code(&self) -> IndexSet<String>;
    fn all_dynamic_imports(&self) -> IndexSet<String>;
}

/// A user-authored composite component, compiled once into the shared
/// components module and imported by tag everywhere it is used.
pub trait CustomComponent {
    type Body: Renderable + ImportSource;

    /// Exported name of the compiled component.
    fn tag(&self) -> &str;

    /// Library the component itself is exported from.
    fn library(&self) -> &str {
        CUSTOM_COMPONENTS_LIBRARY
    }

    fn props(&self) -> Vec<String>;

    /// Build the component body.
    fn component(&self) -> Self::Body;
}

// ---------------------------------------------------------------------------
// Compiled records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledComponent {
    pub name: String,
    pub props: Vec<String>,
    pub render: Value,
    pub hooks: Vec<String>,
    pub custom_code: Vec<String>,
    pub dynamic_imports: Vec<String>,
}

/// A page or standalone component with its import statements resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPage {
    pub render: Value,
    pub hooks: Vec<String>,
    pub custom_code: Vec<String>,
    pub dynamic_imports: Vec<String>,
    pub imports: Vec<ImportStatement>,
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile a custom component into its record and the imports it needs.
///
/// Imports from the component's own library are dropped (the component
/// lives there) and the JSX helper is always requested.
pub fn compile_custom_component<C>(component: &C) -> (CompiledComponent, ImportManifest)
where
    C: CustomComponent + ?Sized,
{
    let body = component.component();

    let mut imports = body.all_imports();
    imports.remove(component.library());
    imports.add(JSX_RUNTIME_LIBRARY, ImportVar::new(JSX_HELPER));

    let compiled = CompiledComponent {
        name: component.tag().to_string(),
        props: component.props(),
        render: body.render(),
        hooks: body.all_hooks().into_iter().collect(),
        custom_code: body.all_custom_code().into_iter().collect(),
        dynamic_imports: body.all_dynamic_imports().into_iter().collect(),
    };

    (compiled, imports)
}

/// Compile every custom component for the shared components module.
///
/// Returns the component records in input order and the import statements
/// of their merged manifests.
pub fn compile_components<C>(components: &[C]) -> Result<(Vec<CompiledComponent>, Vec<ImportStatement>)>
where
    C: CustomComponent,
{
    let (compiled, manifests): (Vec<_>, Vec<_>) =
        components.iter().map(compile_custom_component).unzip();

    let imports = compile_imports(&merge_imports(&manifests))?;
    Ok((compiled, imports))
}

/// Compile a page-level component with its imports resolved to statements.
pub fn compile_component<C>(component: &C) -> Result<CompiledPage>
where
    C: Renderable + ImportSource + ?Sized,
{
    let imports = compile_imports(&component.all_imports())?;

    Ok(CompiledPage {
        render: component.render(),
        hooks: component.all_hooks().into_iter().collect(),
        custom_code: component.all_custom_code().into_iter().collect(),
        dynamic_imports: component.all_dynamic_imports().into_iter().collect(),
        imports,
    })
}

// ---------------------------------------------------------------------------
// UserComponent
// ---------------------------------------------------------------------------

/// Custom component backed by an [`Element`] body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComponent {
    pub tag: String,
    #[serde(default)]
    pub props: Vec<String>,
    pub body: Element,
}

impl UserComponent {
    pub fn new(tag: impl Into<String>, body: Element) -> Self {
        Self {
            tag: tag.into(),
            props: Vec::new(),
            body,
        }
    }

    pub fn with_props(mut self, props: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.props.extend(props.into_iter().map(Into::into));
        self
    }
}

impl CustomComponent for UserComponent {
    type Body = Element;

    fn tag(&self) -> &str {
        &self.tag
    }

    fn props(&self) -> Vec<String> {
        self.props.clone()
    }

    fn component(&self) -> Element {
        self.body.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
