//! External version sources
//!
//! A source reports the latest version it knows about, in whatever grammar it
//! natively uses. Registries do not promise any ordering of their version
//! lists, so [select_latest] picks the structural maximum instead of the
//! last entry.

pub mod container_registry;
pub mod package_index;

pub use container_registry::ContainerRegistrySource;
pub use package_index::{CondaIndexSource, PackageIndexSource};

use crate::domain::{Version, VersionScheme};
use crate::error::Result;
use tracing::debug;

/// A place that publishes versions of this project
pub trait VersionSource {
    /// Name used in error messages, e.g. "package index"
    fn name(&self) -> &str;

    /// Key of the report-mode output signal, e.g. "PYPI" for `PYPIBUMP`
    fn signal_key(&self) -> &str;

    /// Latest published version, `None` when nothing was published yet
    fn fetch_latest(&self, scheme: &VersionScheme) -> Result<Option<String>>;
}

/// Pick the structurally greatest version, keeping its original spelling.
///
/// Entries that do not parse in either grammar (`latest`, `main`, ...) are
/// skipped.
pub fn select_latest<I, S>(versions: I, scheme: &VersionScheme) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best: Option<(Version, String)> = None;

    for raw in versions {
        let raw = raw.as_ref();
        let parsed = match scheme.parse(raw) {
            Ok(v) => v,
            Err(e) => {
                debug!("skipping version '{}': {}", raw, e);
                continue;
            }
        };

        if best.as_ref().map_or(true, |(current, _)| parsed > *current) {
            best = Some((parsed, raw.to_string()));
        }
    }

    best.map(|(_, raw)| raw)
}

/// Source with a fixed list of versions
///
/// Used for versions obtained out of band, e.g. a tag list exported by
/// another pipeline step.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    signal_key: String,
    versions: Vec<String>,
}

impl StaticSource {
    pub fn new(
        name: impl Into<String>,
        signal_key: impl Into<String>,
        versions: Vec<String>,
    ) -> Self {
        StaticSource {
            name: name.into(),
            signal_key: signal_key.into(),
            versions,
        }
    }
}

impl VersionSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn signal_key(&self) -> &str {
        &self.signal_key
    }

    fn fetch_latest(&self, scheme: &VersionScheme) -> Result<Option<String>> {
        Ok(select_latest(&self.versions, scheme))
    }
}
