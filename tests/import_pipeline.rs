use pretty_assertions::assert_eq;
use zenith_codegen::constants::{CUSTOM_COMPONENTS_LIBRARY, JSX_RUNTIME_LIBRARY};
use zenith_codegen::{
    compile_custom_component, compile_import_statement, compile_imports, merge_imports,
    CompileError, Element, ImportManifest, ImportStatement, ImportVar, UserComponent,
};

// ---------------------------------------------------------------------------
// Manifest -> statements
// ---------------------------------------------------------------------------

#[test]
fn merged_page_and_component_imports_compile() {
    let page = Element::from_library("Box", "@chakra-ui/react@2.8.0")
        .with_child(Element::from_library("Card", CUSTOM_COMPONENTS_LIBRARY))
        .with_import("react", "useEffect");
    let card = UserComponent::new(
        "Card",
        Element::from_library("Box", "@chakra-ui/react@2.8.0").with_import("react", "useRef"),
    );

    let (_, component_imports) = compile_custom_component(&card);
    let page_imports = zenith_codegen::ImportSource::all_imports(&page);
    let merged = merge_imports([&page_imports, &component_imports]);

    let statements = compile_imports(&merged).unwrap();
    assert_eq!(
        statements,
        vec![
            ImportStatement::new("@chakra-ui/react", "", vec!["Box".into()]),
            ImportStatement::new("react", "", vec!["useEffect".into(), "useRef".into()]),
            ImportStatement::new("$/utils/components", "", vec!["Card".into()]),
            ImportStatement::new(JSX_RUNTIME_LIBRARY, "", vec!["jsx".into()]),
        ]
    );
}

#[test]
fn default_and_named_from_same_library() {
    let mut manifest = ImportManifest::new();
    manifest
        .add("next/link", ImportVar::new("NextLink").as_default())
        .add("next/link", ImportVar::new("LinkProps").without_render())
        .add("react", ImportVar::new("*").as_default().with_alias("React"));

    let statements = compile_imports(&manifest).unwrap();
    assert_eq!(
        statements,
        vec![
            ImportStatement::new("next/link", "NextLink", vec![]),
            ImportStatement::new("react", "* as React", vec![]),
        ]
    );
}

#[test]
fn duplicate_imports_collapse_before_compiling() {
    let mut manifest = ImportManifest::new();
    manifest
        .add("react", "useState")
        .add("react", "useState")
        .add("react", "useMemo");

    let statements = compile_imports(&manifest).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].rest, vec!["useMemo", "useState"]);
}

#[test]
fn aliased_bindings_render_with_as() {
    let (default, rest) = compile_import_statement(&[
        ImportVar::new("Link").with_alias("RouterLink"),
        ImportVar::new("useNavigate"),
    ])
    .unwrap();
    assert_eq!(default, "");
    assert_eq!(rest, vec!["Link as RouterLink", "useNavigate"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn two_defaults_for_one_path_fail() {
    let mut manifest = ImportManifest::new();
    manifest
        .add("lib", ImportVar::new("A").as_default())
        .add("lib", ImportVar::new("B").as_default());

    let err = compile_imports(&manifest).unwrap_err();
    assert!(matches!(err, CompileError::InvalidImport(_)));
}

#[test]
fn defaults_on_distinct_package_paths_are_allowed() {
    let mut manifest = ImportManifest::new();
    manifest
        .add("lib", ImportVar::new("A").as_default())
        .add("lib", ImportVar::new("B").as_default().with_package_path("/sub"));

    let statements = compile_imports(&manifest).unwrap();
    assert_eq!(
        statements,
        vec![
            ImportStatement::new("lib", "A", vec![]),
            ImportStatement::new("lib/sub", "B", vec![]),
        ]
    );
}

#[test]
fn conflict_message_names_tag_and_both_libraries() {
    let mut manifest = ImportManifest::new();
    manifest.add("@chakra-ui/react", "Button").add("@mui/material", "Button");

    let message = compile_imports(&manifest).unwrap_err().to_string();
    assert!(message.contains("Button"), "{message}");
    assert!(message.contains("@chakra-ui/react"), "{message}");
    assert!(message.contains("@mui/material"), "{message}");
}

#[test]
fn dollar_aliased_library_is_not_a_conflict() {
    let mut manifest = ImportManifest::new();
    manifest
        .add("/utils/state", "StateContexts")
        .add("$/utils/state", "StateContexts");
    assert!(compile_imports(&manifest).is_ok());
}

#[test]
fn dollar_alias_coalesces_onto_plain_library() {
    for order in [["$x", "x", "y"], ["x", "$x", "y"]] {
        let mut manifest = ImportManifest::new();
        for lib in order {
            manifest.add(lib, "A");
        }

        match compile_imports(&manifest).unwrap_err() {
            CompileError::ImportConflict { tag, lib, other } => {
                assert_eq!(tag, "A");
                assert_eq!(lib, "y");
                assert_eq!(other, "x", "order {order:?}");
            }
            err => panic!("Expected ImportConflict, got {err}"),
        }
    }
}

#[test]
fn empty_library_needs_named_modules() {
    let mut manifest = ImportManifest::new();
    manifest.add("", ImportVar::module());

    let err = compile_imports(&manifest).unwrap_err();
    assert!(matches!(err, CompileError::InvalidImport(_)));
}
