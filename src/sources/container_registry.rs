//! Container registry source over the OCI distribution tag list API

use crate::domain::VersionScheme;
use crate::error::{BumpyError, Result};
use crate::sources::{select_latest, VersionSource};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// All tags listed in a `/v2/<repository>/tags/list` document
pub fn tags_from_json(body: &str) -> Result<Vec<String>> {
    let list: TagList = serde_json::from_str(body)
        .map_err(|e| BumpyError::registry(format!("invalid tag list: {}", e)))?;
    Ok(list.tags.unwrap_or_default())
}

/// Service principal (or any basic-auth) credentials for the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

/// Image repository in a container registry
pub struct ContainerRegistrySource {
    client: Client,
    endpoint: String,
    repository: String,
    credentials: Option<RegistryCredentials>,
}

impl ContainerRegistrySource {
    /// Registry at an explicit endpoint, e.g. `https://registry.example.com`
    pub fn new(
        endpoint: impl Into<String>,
        repository: impl Into<String>,
        credentials: Option<RegistryCredentials>,
    ) -> Self {
        ContainerRegistrySource {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            repository: repository.into(),
            credentials,
        }
    }

    /// Azure container registry `<name>.azurecr.io`
    pub fn azure(
        registry_name: &str,
        repository: impl Into<String>,
        credentials: Option<RegistryCredentials>,
    ) -> Self {
        Self::new(
            format!("https://{}.azurecr.io", registry_name),
            repository,
            credentials,
        )
    }

    fn tags_url(&self) -> String {
        format!("{}/v2/{}/tags/list", self.endpoint, self.repository)
    }
}

impl VersionSource for ContainerRegistrySource {
    fn name(&self) -> &str {
        "container registry"
    }

    fn signal_key(&self) -> &str {
        "ACR"
    }

    fn fetch_latest(&self, scheme: &VersionScheme) -> Result<Option<String>> {
        let url = self.tags_url();
        debug!("Fetching {}", url);

        let mut request = self.client.get(&url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .map_err(|e| BumpyError::registry(format!("GET {} failed: {}", url, e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BumpyError::registry(format!(
                "unauthorized: authentication required for {}",
                url
            )));
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
        let latest = select_latest(tags_from_json(&body)?, scheme);

        if let Some(tag) = &latest {
            info!("The latest tagged image of {} is: {}", self.repository, tag);
        }
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_tags_from_json() {
        let body = r#"{"name": "app", "tags": ["latest", "0.1.0", "0.2.0"]}"#;
        assert_eq!(tags_from_json(body).unwrap(), vec!["latest", "0.1.0", "0.2.0"]);
    }

    #[test]
    fn test_tags_from_json_null_tags() {
        assert!(tags_from_json(r#"{"name": "app", "tags": null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_azure_endpoint() {
        let source = ContainerRegistrySource::azure("myacr", "team/app", None);
        assert_eq!(
            source.tags_url(),
            "https://myacr.azurecr.io/v2/team/app/tags/list"
        );
    }

    #[test]
    fn test_fetch_latest_with_credentials() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v2/app/tags/list")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(r#"{"name": "app", "tags": ["latest", "0.9.0", "0.10.0-alpha.1", "0.9.1"]}"#)
            .create();

        let source = ContainerRegistrySource::new(
            server.url(),
            "app",
            Some(RegistryCredentials {
                username: "sp".to_string(),
                password: "secret".to_string(),
            }),
        );
        let latest = source.fetch_latest(&VersionScheme::default()).unwrap();

        mock.assert();
        assert_eq!(latest, Some("0.10.0-alpha.1".to_string()));
    }

    #[test]
    fn test_fetch_latest_unauthorized() {
        let mut server = Server::new();
        server.mock("GET", "/v2/app/tags/list").with_status(401).create();

        let source = ContainerRegistrySource::new(server.url(), "app", None);
        let err = source.fetch_latest(&VersionScheme::default()).unwrap_err();
        assert!(err.to_string().contains("authentication required"));
    }
}
