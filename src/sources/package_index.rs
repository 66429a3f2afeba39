//! Package index sources: PyPI-style JSON and Anaconda-style JSON

use crate::domain::VersionScheme;
use crate::error::{BumpyError, Result};
use crate::sources::{select_latest, VersionSource};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// PyPI JSON API response, only the release keys matter
#[derive(Debug, Deserialize)]
struct PypiResponse {
    releases: HashMap<String, serde_json::Value>,
}

/// Anaconda package API response
#[derive(Debug, Deserialize)]
struct CondaResponse {
    #[serde(default)]
    files: Vec<CondaFile>,
}

#[derive(Debug, Deserialize)]
struct CondaFile {
    version: String,
}

/// All versions listed in a PyPI JSON document
pub fn versions_from_pypi_json(body: &str) -> Result<Vec<String>> {
    let response: PypiResponse = serde_json::from_str(body)
        .map_err(|e| BumpyError::registry(format!("invalid PyPI response: {}", e)))?;
    Ok(response.releases.into_keys().collect())
}

/// All versions listed in an Anaconda package document
pub fn versions_from_conda_json(body: &str) -> Result<Vec<String>> {
    let response: CondaResponse = serde_json::from_str(body)
        .map_err(|e| BumpyError::registry(format!("invalid Anaconda response: {}", e)))?;
    Ok(response.files.into_iter().map(|f| f.version).collect())
}

pub(crate) fn get_text(client: &Client, url: &str) -> Result<Option<String>> {
    debug!("Fetching {}", url);
    let response = client
        .get(url)
        .send()
        .map_err(|e| BumpyError::registry(format!("GET {} failed: {}", url, e)))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(BumpyError::registry(format!(
            "GET {} returned status {}",
            url,
            response.status()
        )));
    }

    let body = response
        .text()
        .map_err(|e| BumpyError::registry(format!("reading {} failed: {}", url, e)))?;
    Ok(Some(body))
}

/// PyPI-style package index, e.g. `https://pypi.org/pypi/<package>/json`
pub struct PackageIndexSource {
    client: Client,
    url: String,
}

impl PackageIndexSource {
    pub fn new(url: impl Into<String>) -> Self {
        PackageIndexSource {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl VersionSource for PackageIndexSource {
    fn name(&self) -> &str {
        "package index"
    }

    fn signal_key(&self) -> &str {
        "PYPI"
    }

    fn fetch_latest(&self, scheme: &VersionScheme) -> Result<Option<String>> {
        // An unknown package has never been published.
        let Some(body) = get_text(&self.client, &self.url)? else {
            return Ok(None);
        };
        let versions = versions_from_pypi_json(&body)?;
        debug!("Found {} versions at {}", versions.len(), self.url);
        Ok(select_latest(versions, scheme))
    }
}

/// Anaconda-style index, e.g.
/// `https://api.anaconda.org/package/<owner>/<package>`
pub struct CondaIndexSource {
    client: Client,
    url: String,
}

impl CondaIndexSource {
    pub fn new(url: impl Into<String>) -> Self {
        CondaIndexSource {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl VersionSource for CondaIndexSource {
    fn name(&self) -> &str {
        "secondary index"
    }

    fn signal_key(&self) -> &str {
        "CONDA"
    }

    fn fetch_latest(&self, scheme: &VersionScheme) -> Result<Option<String>> {
        let Some(body) = get_text(&self.client, &self.url)? else {
            return Ok(None);
        };
        let versions = versions_from_conda_json(&body)?;
        debug!("Found {} versions at {}", versions.len(), self.url);
        Ok(select_latest(versions, scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const PYPI_BODY: &str = r#"{
        "info": {"version": "0.9.0"},
        "releases": {"0.10.0": [], "0.9.0": [{"filename": "x.whl"}], "0.10.1a2": []}
    }"#;

    #[test]
    fn test_versions_from_pypi_json() {
        let mut versions = versions_from_pypi_json(PYPI_BODY).unwrap();
        versions.sort();
        assert_eq!(versions, vec!["0.10.0", "0.10.1a2", "0.9.0"]);
    }

    #[test]
    fn test_versions_from_conda_json() {
        let body = r#"{"files": [{"version": "1.0.0"}, {"version": "1.1.0"}, {"version": "1.0.5"}]}"#;
        assert_eq!(
            versions_from_conda_json(body).unwrap(),
            vec!["1.0.0", "1.1.0", "1.0.5"]
        );
    }

    #[test]
    fn test_versions_from_invalid_json() {
        assert!(versions_from_pypi_json("<html>").is_err());
        assert!(versions_from_conda_json("[]").is_err());
    }

    #[test]
    fn test_package_index_fetch_latest() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/demo/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PYPI_BODY)
            .create();

        let source = PackageIndexSource::new(format!("{}/pypi/demo/json", server.url()));
        let latest = source.fetch_latest(&VersionScheme::default()).unwrap();

        mock.assert();
        assert_eq!(latest, Some("0.10.1a2".to_string()));
    }

    #[test]
    fn test_package_index_not_found_means_unpublished() {
        let mut server = Server::new();
        server
            .mock("GET", "/pypi/fresh/json")
            .with_status(404)
            .create();

        let source = PackageIndexSource::new(format!("{}/pypi/fresh/json", server.url()));
        assert_eq!(source.fetch_latest(&VersionScheme::default()).unwrap(), None);
    }

    #[test]
    fn test_package_index_server_error() {
        let mut server = Server::new();
        server.mock("GET", "/pypi/demo/json").with_status(500).create();

        let source = PackageIndexSource::new(format!("{}/pypi/demo/json", server.url()));
        let err = source.fetch_latest(&VersionScheme::default()).unwrap_err();
        assert!(matches!(err, BumpyError::Registry(_)));
    }

    #[test]
    fn test_conda_fetch_latest() {
        let mut server = Server::new();
        server
            .mock("GET", "/package/org/demo")
            .with_status(200)
            .with_body(r#"{"files": [{"version": "2.0.0"}, {"version": "10.0.0"}]}"#)
            .create();

        let source = CondaIndexSource::new(format!("{}/package/org/demo", server.url()));
        assert_eq!(
            source.fetch_latest(&VersionScheme::default()).unwrap(),
            Some("10.0.0".to_string())
        );
    }
}
