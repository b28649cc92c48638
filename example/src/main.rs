mod elements;

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use satori_xhtml::{Map, Value, registry::to_markup, render};
use tracing::info;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Reads the JSON context stored next to a template, if any.
fn load_vars(template: &Path) -> Result<Map> {
    let path = template.with_extension("json");
    if !path.exists() {
        return Ok(Map::new());
    }
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("decoding {}", path.display()))?;
    match Value::from(json) {
        Value::Map(map) => Ok(map),
        other => bail!("{} must hold an object, found {}", path.display(), other.kind()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = elements::registry()?;
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "xhtml") {
            continue;
        }

        let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let vars = load_vars(path)?;
        let tree = render(&source, &vars);
        let typed = registry
            .transform(&tree)
            .with_context(|| format!("building elements for {}", path.display()))?;
        info!(template = %path.display(), elements = typed.len(), "rendered");

        println!("{}", to_markup(&typed, false));
        println!("{}", to_markup(&typed, true));
    }
    Ok(())
}
