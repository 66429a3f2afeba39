//! Named output signals for CI integrations
//!
//! Signals are `KEY=VALUE` lines appended to an output file, the format
//! GitHub Actions reads from `$GITHUB_OUTPUT`.

use crate::error::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// One `KEY=VALUE` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub key: String,
    pub value: String,
}

impl Signal {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Signal {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `<SOURCE>BUMP=TRUE|FALSE`, e.g. `PYPIBUMP=FALSE`
    pub fn bump(source_key: &str, bumped: bool) -> Self {
        Signal::new(
            format!("{}BUMP", source_key.to_uppercase()),
            if bumped { "TRUE" } else { "FALSE" },
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Destination for signals; without a file they are only logged
#[derive(Debug, Clone, Default)]
pub struct CiOutput {
    path: Option<PathBuf>,
}

impl CiOutput {
    pub fn new(path: Option<PathBuf>) -> Self {
        CiOutput { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn emit(&self, signal: &Signal) -> Result<()> {
        info!("output {}", signal);
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", signal)?;
        }
        Ok(())
    }
}
