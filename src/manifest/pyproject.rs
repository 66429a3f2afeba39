use crate::error::{BumpyError, Result};
use std::path::Path;
use toml_edit::DocumentMut;

fn parse(content: &str, path: &Path) -> Result<DocumentMut> {
    content
        .parse::<DocumentMut>()
        .map_err(|e| BumpyError::manifest(path, format!("failed to parse TOML: {}", e)))
}

/// Read `project.version`
pub fn read_version(content: &str, path: &Path) -> Result<String> {
    let doc = parse(content, path)?;

    doc.get("project")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| BumpyError::manifest(path, "no [project].version found"))
}

/// Set `project.version`, keeping comments and layout of everything else
pub fn replace_version(content: &str, version: &str, path: &Path) -> Result<String> {
    let mut doc = parse(content, path)?;

    let project = doc
        .get_mut("project")
        .and_then(|p| p.as_table_like_mut())
        .ok_or_else(|| BumpyError::manifest(path, "manifest is missing a [project] table"))?;
    project.insert("version", toml_edit::value(version));

    Ok(doc.to_string())
}
