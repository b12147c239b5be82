//! Concrete component tree.
//!
//! `Element` is the node type the document assembler builds and the one
//! user pages are expressed in. It carries everything the component
//! compiler asks of a component: how it renders, which library its tag
//! comes from, and the hooks, custom code and dynamic imports it needs.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::component::{ImportSource, Renderable};
use crate::imports::{ImportManifest, ImportVar};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Element(Element),
    /// Literal text content.
    Text { value: String },
    /// A reference to a runtime variable, rendered as `{name}`.
    Var { name: String },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Node::Var { name: name.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Renderable for Node {
    fn render(&self) -> Value {
        match self {
            Node::Element(element) => element.render(),
            Node::Text { value } => leaf(Value::String(value.clone()).to_string()),
            Node::Var { name } => leaf(format!("{{{}}}", name)),
        }
    }
}

fn leaf(contents: String) -> Value {
    json!({
        "name": "",
        "props": [],
        "contents": contents,
        "children": [],
    })
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag: String,
    /// Library the tag is imported from. `None` for intrinsic HTML tags.
    #[serde(default)]
    pub library: Option<String>,
    /// Whether the tag is the library's default export.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub props: IndexMap<String, Value>,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Imports needed beyond the tag itself.
    #[serde(default)]
    pub imports: ImportManifest,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub custom_code: Vec<String>,
    #[serde(default)]
    pub dynamic_imports: Vec<String>,
}

impl Element {
    /// Intrinsic HTML element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Element whose tag is a named export of `library`.
    pub fn from_library(tag: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            library: Some(library.into()),
            ..Self::new(tag)
        }
    }

    pub fn as_default_export(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_import(mut self, library: impl Into<String>, var: impl Into<ImportVar>) -> Self {
        self.imports.add(library, var);
        self
    }

    pub fn with_hook(mut self, hook: impl Into<String>) -> Self {
        self.hooks.push(hook.into());
        self
    }

    pub fn with_custom_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code.push(code.into());
        self
    }

    pub fn with_dynamic_import(mut self, import: impl Into<String>) -> Self {
        self.dynamic_imports.push(import.into());
        self
    }

    pub fn get_prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Child elements, skipping text and variable nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Depth-first walk over this element and every descendant element.
    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    fn collect(&self, pick: fn(&Element) -> &[String]) -> IndexSet<String> {
        let mut out = IndexSet::new();
        self.walk(&mut |element| out.extend(pick(element).iter().cloned()));
        out
    }
}

impl Renderable for Element {
    fn render(&self) -> Value {
        let props: Vec<String> = self
            .props
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect();
        let children: Vec<Value> = self.children.iter().map(Node::render).collect();

        json!({
            "name": self.tag,
            "props": props,
            "contents": "",
            "children": children,
        })
    }
}

impl ImportSource for Element {
    fn all_imports(&self) -> ImportManifest {
        let mut manifest = ImportManifest::new();
        self.walk(&mut |element| {
            if let Some(library) = &element.library {
                let mut var = ImportVar::new(element.tag.clone());
                var.is_default = element.is_default;
                manifest.add(library.clone(), var);
            }
            manifest.merge(&element.imports);
        });
        manifest
    }

    fn all_hooks(&self) -> IndexSet<String> {
        self.collect(|element| element.hooks.as_slice())
    }

    fn all_custom_code(&self) -> IndexSet<String> {
        self.collect(|element| element.custom_code.as_slice())
    }

    fn all_dynamic_imports(&self) -> IndexSet<String> {
        self.collect(|element| element.dynamic_imports.as_slice())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
