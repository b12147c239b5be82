use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use zenith_codegen::output::write_file;
use zenith_codegen::routes::{
    components_path, context_path, page_path, path_to_file_stem, root_stylesheet_path,
    stateful_components_path, theme_path,
};
use zenith_codegen::CompilerConfig;

// ---------------------------------------------------------------------------
// Route stems
// ---------------------------------------------------------------------------

#[test]
fn route_stems() {
    let cases = [
        ("index", "_index"),
        ("about", "[about]._index"),
        ("users/[id]", "[users].$id._index"),
        ("blog/[...slug]", "[blog].$"),
        ("blog/[[...slug]]", "[blog].($slug)._index"),
        ("[[lang]]/docs", "($lang).[docs]._index"),
        ("/settings/profile", "[settings].[profile]._index"),
    ];
    for (route, stem) in cases {
        assert_eq!(path_to_file_stem(route), stem, "route {route}");
    }
}

// ---------------------------------------------------------------------------
// Output paths
// ---------------------------------------------------------------------------

#[test]
fn default_layout_paths() {
    let config = CompilerConfig::default();
    assert_eq!(
        page_path(&config, "users/[id]"),
        PathBuf::from(".web/app/routes/[users].$id._index.jsx")
    );
    assert_eq!(page_path(&config, "index"), PathBuf::from(".web/app/routes/_index.jsx"));
    assert_eq!(theme_path(&config), PathBuf::from(".web/utils/theme.js"));
    assert_eq!(
        root_stylesheet_path(&config),
        PathBuf::from(".web/styles/__global_styles.css")
    );
    assert_eq!(context_path(&config), PathBuf::from(".web/utils/context.js"));
    assert_eq!(components_path(&config), PathBuf::from(".web/utils/components.jsx"));
    assert_eq!(
        stateful_components_path(&config),
        PathBuf::from(".web/utils/stateful_components.jsx")
    );
}

#[test]
fn paths_follow_injected_web_dir() {
    let config = CompilerConfig::with_web_dir("/tmp/site");
    assert!(theme_path(&config).starts_with("/tmp/site"));
    assert!(page_path(&config, "index").starts_with("/tmp/site/app/routes"));
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[test]
fn writing_identical_content_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let config = CompilerConfig::with_web_dir(dir.path());
    let path = theme_path(&config);

    assert!(write_file(&path, "export default {};\n").unwrap());
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    thread::sleep(Duration::from_millis(20));
    assert!(!write_file(&path, "export default {};\n").unwrap());

    let after = fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(before, after);
    assert_eq!(fs::read_to_string(&path).unwrap(), "export default {};\n");
}

#[test]
fn writing_changed_content_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let config = CompilerConfig::with_web_dir(dir.path());
    let path = page_path(&config, "blog/[...slug]");

    write_file(&path, "old page body that is longer").unwrap();
    assert!(write_file(&path, "new").unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
}
