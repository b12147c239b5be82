use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use zenith_codegen::component::compile_components;
use zenith_codegen::output::{save_error, write_file};
use zenith_codegen::routes::{page_path, path_to_file_stem, theme_path};
use zenith_codegen::{
    create_document_root, create_theme, CompiledComponent, CompilerConfig, ImportStatement,
    Renderable, StyleKey, UserComponent,
};

const MANIFEST_FILE: &str = "codegen-manifest.json";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CodegenInput {
    routes: Vec<String>,
    #[serde(default)]
    style: IndexMap<String, Value>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    components: Vec<UserComponent>,
}

#[derive(Debug, Serialize)]
struct CodegenManifest {
    routes: Vec<RouteEntry>,
    document: Value,
    components: Vec<CompiledComponent>,
    component_imports: Vec<ImportStatement>,
}

#[derive(Debug, Clone, Serialize)]
struct RouteEntry {
    path: String,
    stem: String,
    output: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("zenith_codegen=info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match parse_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{:#}", err);
            process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        match save_error(&config.logs_dir, &err) {
            Ok(log_path) => tracing::error!(log = %log_path.display(), "{:#}", err),
            Err(log_err) => tracing::error!("{:#} (error log not written: {})", err, log_err),
        }
        process::exit(1);
    }
}

fn run(config: &CompilerConfig) -> anyhow::Result<()> {
    let mut stdin_payload = String::new();
    io::stdin()
        .read_to_string(&mut stdin_payload)
        .context("failed to read stdin")?;

    if stdin_payload.trim().is_empty() {
        bail!("stdin payload is empty");
    }

    let payload: CodegenInput =
        serde_json::from_str(&stdin_payload).context("invalid input JSON")?;

    let style: IndexMap<StyleKey, Value> = payload
        .style
        .into_iter()
        .map(|(key, value)| (StyleKey::Property(key), value))
        .collect();
    let theme = create_theme(&style);
    let theme_js = format!("export default {};\n", serde_json::to_string_pretty(&theme)?);
    let theme_file = theme_path(config);
    write_file(&theme_file, &theme_js)
        .with_context(|| format!("failed to write theme '{}'", theme_file.display()))?;

    let (components, component_imports) =
        compile_components(&payload.components).context("failed to compile custom components")?;
    if !components.is_empty() {
        tracing::info!(count = components.len(), "compiled custom components");
    }

    let mut routes = payload
        .routes
        .iter()
        .map(|route| {
            if route.trim().is_empty() {
                bail!("route must be a non-empty string");
            }
            Ok(RouteEntry {
                path: route.clone(),
                stem: path_to_file_stem(route),
                output: page_path(config, route).to_string_lossy().replace('\\', "/"),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    routes.sort_by(|a, b| a.path.cmp(&b.path));

    let document = create_document_root(Vec::new(), payload.lang.as_deref(), IndexMap::new());

    let manifest = CodegenManifest {
        routes,
        document: document.render(),
        components,
        component_imports,
    };
    let manifest_path = config.web_dir.join(MANIFEST_FILE);
    write_file(&manifest_path, &serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("failed to write manifest '{}'", manifest_path.display()))?;

    tracing::info!(
        routes = manifest.routes.len(),
        manifest = %manifest_path.display(),
        "codegen complete"
    );
    Ok(())
}

fn parse_config() -> anyhow::Result<CompilerConfig> {
    let mut config: Option<CompilerConfig> = None;
    let mut web_dir: Option<PathBuf> = None;
    let mut logs_dir: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .map(PathBuf::from)
                .with_context(|| format!("missing value for {flag}"))
        };
        match arg.as_str() {
            "--config" => {
                let path = value("--config")?;
                config = Some(
                    CompilerConfig::from_json_file(&path)
                        .with_context(|| format!("failed to load config '{}'", path.display()))?,
                );
            }
            "--web-dir" => web_dir = Some(value("--web-dir")?),
            "--logs-dir" => logs_dir = Some(value("--logs-dir")?),
            _ => bail!(
                "unknown argument '{arg}'. usage: zenith-codegen [--config <file>] [--web-dir <path>] [--logs-dir <path>]"
            ),
        }
    }

    let mut config = config.unwrap_or_default();
    if let Some(web_dir) = web_dir {
        // logs follow the web dir unless placed elsewhere
        if logs_dir.is_none() && config.logs_dir.starts_with(&config.web_dir) {
            config.logs_dir = web_dir.join("logs");
        }
        config.web_dir = web_dir;
    }
    if let Some(logs_dir) = logs_dir {
        config.logs_dir = logs_dir;
    }

    Ok(config)
}
