use crate::domain::{VersionScheme, DEFAULT_TAG_LITERAL};
use crate::error::{BumpyError, Result};
use crate::git::Identity;
use crate::reconcile::CheckMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the complete configuration for bumpy.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub versioning: VersioningConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_pyproject() -> PathBuf {
    PathBuf::from("pyproject.toml")
}

fn default_package_json() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_tag_literal() -> String {
    DEFAULT_TAG_LITERAL.to_string()
}

fn default_true() -> bool {
    true
}

/// Location of the repository and its manifests.
///
/// Relative manifest paths are resolved against `root`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_pyproject")]
    pub pyproject: PathBuf,

    /// Skipped when the file does not exist
    #[serde(default = "default_package_json")]
    pub package_json: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            root: default_root(),
            pyproject: default_pyproject(),
            package_json: default_package_json(),
        }
    }
}

impl ProjectConfig {
    pub fn pyproject_path(&self) -> PathBuf {
        self.root.join(&self.pyproject)
    }

    pub fn package_json_path(&self) -> PathBuf {
        self.root.join(&self.package_json)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersioningConfig {
    #[serde(default = "default_tag_literal")]
    pub tag_literal: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        VersioningConfig {
            tag_literal: default_tag_literal(),
        }
    }
}

/// Commit identity and git behaviour.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub user_email: Option<String>,

    #[serde(default)]
    pub push: bool,

    #[serde(default = "default_true")]
    pub check_history: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            user_name: None,
            user_email: None,
            push: false,
            check_history: true,
        }
    }
}

impl GitConfig {
    /// Commit identity, only when both name and email are set
    pub fn identity(&self) -> Option<Identity> {
        match (&self.user_name, &self.user_email) {
            (Some(name), Some(email)) => Some(Identity::new(name, email)),
            _ => None,
        }
    }
}

/// A package index queried over HTTP
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    pub url: String,

    #[serde(default)]
    pub mode: CheckMode,
}

/// A container registry repository
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RegistryConfig {
    pub name: String,
    pub repository: String,

    #[serde(default)]
    pub mode: CheckMode,
}

/// External sources; each one is checked only when configured.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub package_index: Option<IndexConfig>,

    #[serde(default)]
    pub secondary_index: Option<IndexConfig>,

    #[serde(default)]
    pub container_registry: Option<RegistryConfig>,
}

impl Config {
    /// Version scheme for the configured tag literal
    pub fn scheme(&self) -> Result<VersionScheme> {
        VersionScheme::new(self.versioning.tag_literal.as_str()).map_err(|e| {
            BumpyError::config(format!(
                "invalid tag_literal '{}': {}",
                self.versioning.tag_literal, e
            ))
        })
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `bumpy.toml` in current directory
/// 3. `.bumpy.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if Path::new("./bumpy.toml").exists() {
        PathBuf::from("./bumpy.toml")
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(".bumpy.toml");
        if path.exists() {
            path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path)?;
    parse_config(&config_str)
        .map_err(|e| BumpyError::config(format!("{}: {}", path.display(), e)))
}

/// Parse and validate a configuration document
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(content).map_err(|e| BumpyError::config(e.to_string()))?;
    config.scheme()?;
    Ok(config)
}
