use crate::error::{BumpyError, Result};
use serde_json::Value;
use std::path::Path;

fn parse(content: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| BumpyError::manifest(path, format!("failed to parse JSON: {}", e)))
}

/// Read the top-level `version`
pub fn read_version(content: &str, path: &Path) -> Result<String> {
    let data = parse(content, path)?;

    data.get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BumpyError::manifest(path, "no top-level \"version\" found"))
}

/// Set the top-level `version`; key order is preserved, output is 2-space
/// indented
pub fn replace_version(content: &str, version: &str, path: &Path) -> Result<String> {
    let mut data = parse(content, path)?;

    let object = data
        .as_object_mut()
        .ok_or_else(|| BumpyError::manifest(path, "top level is not an object"))?;
    object.insert("version".to_string(), Value::String(version.to_string()));

    let mut out = serde_json::to_string_pretty(&data)
        .map_err(|e| BumpyError::manifest(path, format!("failed to render JSON: {}", e)))?;
    if content.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
