//! Document root, page metadata and global theme assembly.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::constants::ROUTER_LIBRARY;
use crate::element::{Element, Node};

/// Applies the stored color mode before first paint.
const THEME_PRELOAD_SCRIPT: &str = r#"(function(){try{var t=localStorage.getItem("theme")||"system";var d=t==="dark"||(t==="system"&&window.matchMedia("(prefers-color-scheme: dark)").matches);var r=document.documentElement;r.classList.add(d?"dark":"light");r.style.colorScheme=d?"dark":"light";}catch(e){}})();"#;

const DEFAULT_LANG: &str = "en";
const DEFAULT_CHARSET: &str = "utf-8";
const CHARSET_PROPS: [&str; 3] = ["charSet", "charset", "char_set"];
const DEFAULT_VIEWPORT: &str = "width=device-width, initial-scale=1";

// ---------------------------------------------------------------------------
// Document root
// ---------------------------------------------------------------------------

fn is_meta(element: &Element) -> bool {
    element.tag == "meta" && element.library.is_none()
}

fn declares_charset(element: &Element) -> bool {
    is_meta(element) && CHARSET_PROPS.iter().any(|prop| element.get_prop(prop).is_some())
}

fn declares_viewport(element: &Element) -> bool {
    is_meta(element) && element.get_prop("name").and_then(Value::as_str) == Some("viewport")
}

fn theme_preload_script() -> Element {
    Element::new("script")
        .with_prop("suppressHydrationWarning", true)
        .with_prop("dangerouslySetInnerHTML", json!({ "__html": THEME_PRELOAD_SCRIPT }))
}

/// Build the `<html>` root wrapping every page.
///
/// Head order is fixed: theme preload script, the caller's head elements,
/// charset and viewport metas when the caller did not declare them, then
/// the router's `Meta` and `Links`. The body holds the page children, the
/// scroll restoration marker and the router scripts.
pub fn create_document_root(
    head_components: Vec<Element>,
    lang: Option<&str>,
    custom_attrs: IndexMap<String, Value>,
) -> Element {
    let has_charset = head_components.iter().any(declares_charset);
    let has_viewport = head_components.iter().any(declares_viewport);

    let mut head = Element::new("head").with_child(theme_preload_script());
    head.children
        .extend(head_components.into_iter().map(Node::from));

    if !has_charset {
        head = head.with_child(Element::new("meta").with_prop("charSet", DEFAULT_CHARSET));
    }
    if !has_viewport {
        head = head.with_child(
            Element::new("meta")
                .with_prop("name", "viewport")
                .with_prop("content", DEFAULT_VIEWPORT),
        );
    }

    head = head
        .with_child(Element::from_library("Meta", ROUTER_LIBRARY))
        .with_child(Element::from_library("Links", ROUTER_LIBRARY));

    let body = Element::new("body")
        .with_child(Node::var("children"))
        .with_child(Element::from_library("ScrollRestoration", ROUTER_LIBRARY))
        .with_child(Element::from_library("Scripts", ROUTER_LIBRARY));

    let mut html = Element::new("html").with_prop("lang", lang.unwrap_or(DEFAULT_LANG));
    html.props.extend(custom_attrs);
    html.with_child(head).with_child(body)
}

/// Append title, description, `og:image` and extra meta tags to a page.
pub fn add_meta(
    page: Element,
    title: &str,
    image: &str,
    meta: &[IndexMap<String, Value>],
    description: Option<&str>,
) -> Element {
    let mut page = page.with_child(Element::new("title").with_child(Node::text(title)));

    if let Some(description) = description.filter(|text| !text.is_empty()) {
        page = page.with_child(
            Element::new("meta")
                .with_prop("name", "description")
                .with_prop("content", description),
        );
    }
    page = page.with_child(
        Element::new("meta")
            .with_prop("property", "og:image")
            .with_prop("content", image),
    );

    for attrs in meta {
        let mut tag = Element::new("meta");
        tag.props.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        page = page.with_child(tag);
    }

    page
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Key of an app-level style entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleKey {
    /// CSS property or pseudo-selector (`color`, `:hover`).
    Property(String),
    /// Per-component style override, keyed by component tag.
    Component(String),
}

/// Build the global theme from the app style.
///
/// Keys starting with `:` become `*`-prefixed rules under `:root`; other
/// property keys land under `body`. Component keys are not global styles
/// and are ignored.
pub fn create_theme(style: &IndexMap<StyleKey, Value>) -> Value {
    let mut root = Map::new();
    let mut body = Map::new();

    for (key, value) in style {
        let StyleKey::Property(key) = key else {
            continue;
        };
        if key.starts_with(':') {
            root.insert(format!("*{}", key), value.clone());
        } else {
            body.insert(key.clone(), value.clone());
        }
    }

    json!({
        "styles": {
            "global": {
                ":root": root,
                "body": body,
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn head_tags(html: &Element) -> Vec<String> {
        let head = html.child_elements().next().unwrap();
        head.child_elements().map(|e| e.tag.clone()).collect()
    }

    #[test]
    fn test_document_root_defaults() {
        let html = create_document_root(Vec::new(), None, IndexMap::new());
        assert_eq!(html.get_prop("lang"), Some(&json!("en")));
        assert_eq!(head_tags(&html), vec!["script", "meta", "meta", "Meta", "Links"]);

        let body = html.child_elements().nth(1).unwrap();
        assert_eq!(body.children[0], Node::var("children"));
        let markers: Vec<_> = body.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(markers, vec!["ScrollRestoration", "Scripts"]);
    }

    #[test]
    fn test_existing_meta_is_not_duplicated() {
        let head = vec![
            Element::new("meta").with_prop("charSet", "latin-1"),
            Element::new("meta")
                .with_prop("name", "viewport")
                .with_prop("content", "width=500"),
            Element::new("link").with_prop("rel", "icon"),
        ];
        let html = create_document_root(head, Some("fr"), IndexMap::new());
        assert_eq!(html.get_prop("lang"), Some(&json!("fr")));
        assert_eq!(
            head_tags(&html),
            vec!["script", "meta", "meta", "link", "Meta", "Links"]
        );
    }

    #[test]
    fn test_charset_spellings_are_detected() {
        for prop in ["charset", "char_set"] {
            let head = vec![Element::new("meta").with_prop(prop, "utf-8")];
            let html = create_document_root(head, None, IndexMap::new());
            // user charset + synthesized viewport only
            assert_eq!(head_tags(&html), vec!["script", "meta", "meta", "Meta", "Links"]);
            let head = html.child_elements().next().unwrap();
            let charsets = head
                .child_elements()
                .filter(|element| declares_charset(element))
                .count();
            assert_eq!(charsets, 1, "prop {prop}");
        }
    }

    #[test]
    fn test_custom_attrs_pass_through() {
        let mut attrs = IndexMap::new();
        attrs.insert("data-theme".to_string(), json!("dark"));
        let html = create_document_root(Vec::new(), None, attrs);
        assert_eq!(html.get_prop("data-theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_add_meta() {
        let mut extra = IndexMap::new();
        extra.insert("name".to_string(), json!("keywords"));
        extra.insert("content".to_string(), json!("a, b"));

        let page = add_meta(Element::new("div"), "Home", "/logo.png", &[extra], Some("Welcome"));
        let tags: Vec<_> = page.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["title", "meta", "meta", "meta"]);
        let og = page.child_elements().nth(2).unwrap();
        assert_eq!(og.get_prop("property"), Some(&json!("og:image")));
    }

    #[test]
    fn test_create_theme_partitions_keys() {
        let mut style = IndexMap::new();
        style.insert(StyleKey::Property("color".into()), json!("red"));
        style.insert(StyleKey::Property(":hover".into()), json!({"color": "blue"}));
        style.insert(StyleKey::Component("Button".into()), json!({"color": "green"}));

        assert_eq!(
            create_theme(&style),
            json!({"styles": {"global": {
                ":root": {"*:hover": {"color": "blue"}},
                "body": {"color": "red"},
            }}})
        );
    }
}
