//! Project manifests that carry a version field
//!
//! Two kinds are supported:
//!
//! - [ManifestKind::Pyproject]: TOML with `project.version`, packaging grammar
//! - [ManifestKind::PackageJson]: JSON with a top-level `version`, canonical
//!   grammar
//!
//! [ManifestFile::write] only ever moves a version forward.

pub mod package_json;
pub mod pyproject;

use crate::domain::VersionScheme;
use crate::error::{BumpyError, Result};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Version grammar a manifest stores its version in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Hyphenated, e.g. `1.2.3-alpha.1`
    Canonical,
    /// Hyphen-free, e.g. `1.2.3alpha.1`
    Packaging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Pyproject,
    PackageJson,
}

impl ManifestKind {
    pub fn grammar(&self) -> Grammar {
        match self {
            ManifestKind::Pyproject => Grammar::Packaging,
            ManifestKind::PackageJson => Grammar::Canonical,
        }
    }

    /// Extract the raw version string from manifest content
    pub fn version_from_str(&self, content: &str, path: &Path) -> Result<String> {
        match self {
            ManifestKind::Pyproject => pyproject::read_version(content, path),
            ManifestKind::PackageJson => package_json::read_version(content, path),
        }
    }

    /// Return `content` with its version field set to `version`
    pub fn replace_version(&self, content: &str, version: &str, path: &Path) -> Result<String> {
        match self {
            ManifestKind::Pyproject => pyproject::replace_version(content, version, path),
            ManifestKind::PackageJson => package_json::replace_version(content, version, path),
        }
    }
}

/// A manifest file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    kind: ManifestKind,
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(kind: ManifestKind, path: impl Into<PathBuf>) -> Self {
        ManifestFile {
            kind,
            path: path.into(),
        }
    }

    pub fn pyproject(path: impl Into<PathBuf>) -> Self {
        Self::new(ManifestKind::Pyproject, path)
    }

    pub fn package_json(path: impl Into<PathBuf>) -> Self {
        Self::new(ManifestKind::PackageJson, path)
    }

    pub fn kind(&self) -> ManifestKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<String> {
        if !self.exists() {
            return Err(BumpyError::ManifestNotFound(self.path.clone()));
        }
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Read the raw version string as stored in the file
    pub fn read_version(&self) -> Result<String> {
        let content = self.read()?;
        self.kind.version_from_str(&content, &self.path)
    }

    /// Write `new_version` into the manifest.
    ///
    /// # Returns
    /// * `Ok(true)` - The file was rewritten
    /// * `Ok(false)` - The file already holds `new_version`
    /// * `Err(RegressionWrite)` - The file holds a newer version
    pub fn write(&self, scheme: &VersionScheme, new_version: &str) -> Result<bool> {
        let content = self.read()?;
        let current = self.kind.version_from_str(&content, &self.path)?;

        match scheme.compare(&current, new_version)? {
            Ordering::Greater => {
                return Err(BumpyError::RegressionWrite {
                    path: self.path.clone(),
                    current,
                    new: new_version.to_string(),
                })
            }
            Ordering::Equal => {
                info!(path = %self.path.display(), version = %current, "no version change");
                return Ok(false);
            }
            Ordering::Less => {}
        }

        let encoded = match self.kind.grammar() {
            Grammar::Canonical => scheme.to_canonical(new_version)?,
            Grammar::Packaging => scheme.to_packaging(new_version)?,
        };
        debug!(path = %self.path.display(), from = %current, to = %encoded, "writing manifest");

        let updated = self.kind.replace_version(&content, &encoded, &self.path)?;
        fs::write(&self.path, updated)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pyproject_in(dir: &TempDir, version: &str) -> ManifestFile {
        let path = dir.path().join("pyproject.toml");
        fs::write(
            &path,
            format!(
                "# project metadata\n[project]\nname = \"demo\"  # keep me\nversion = \"{}\"\n\n[tool.other]\nkey = 1\n",
                version
            ),
        )
        .unwrap();
        ManifestFile::pyproject(path)
    }

    #[test]
    fn test_missing_manifest() {
        let manifest = ManifestFile::pyproject("/nonexistent/pyproject.toml");
        assert!(!manifest.exists());
        assert!(matches!(
            manifest.read_version(),
            Err(BumpyError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_write_packaging_grammar() {
        let dir = TempDir::new().unwrap();
        let manifest = pyproject_in(&dir, "0.0.1");
        let scheme = VersionScheme::default();

        assert!(manifest.write(&scheme, "0.0.2-alpha.1").unwrap());
        assert_eq!(manifest.read_version().unwrap(), "0.0.2alpha.1");

        let content = fs::read_to_string(manifest.path()).unwrap();
        assert!(content.contains("# project metadata"));
        assert!(content.contains("# keep me"));
        assert!(content.contains("[tool.other]"));
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let manifest = pyproject_in(&dir, "1.0.0");
        let scheme = VersionScheme::default();

        assert!(manifest.write(&scheme, "1.1.0").unwrap());
        let after_first = fs::read_to_string(manifest.path()).unwrap();
        assert!(!manifest.write(&scheme, "1.1.0").unwrap());
        assert_eq!(fs::read_to_string(manifest.path()).unwrap(), after_first);
    }

    #[test]
    fn test_write_same_version_other_grammar_is_noop() {
        let dir = TempDir::new().unwrap();
        let manifest = pyproject_in(&dir, "1.2.3alpha1");
        let scheme = VersionScheme::default();

        assert!(!manifest.write(&scheme, "1.2.3-alpha.1").unwrap());
        assert_eq!(manifest.read_version().unwrap(), "1.2.3alpha1");
    }

    #[test]
    fn test_write_rejects_regression() {
        let dir = TempDir::new().unwrap();
        let manifest = pyproject_in(&dir, "2.0.0");
        let scheme = VersionScheme::default();

        let err = manifest.write(&scheme, "1.9.0").unwrap_err();
        assert!(matches!(err, BumpyError::RegressionWrite { .. }));
        assert_eq!(manifest.read_version().unwrap(), "2.0.0");
    }

    #[test]
    fn test_write_canonical_grammar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{\n  \"name\": \"demo\",\n  \"version\": \"0.0.1\",\n  \"private\": true\n}\n")
            .unwrap();
        let manifest = ManifestFile::package_json(&path);

        assert!(manifest
            .write(&VersionScheme::default(), "0.0.2alpha1")
            .unwrap());
        assert_eq!(manifest.read_version().unwrap(), "0.0.2-alpha1");
    }
}
