use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for bumpy operations
#[derive(Error, Debug)]
pub enum BumpyError {
    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    #[error("Invalid bump level '{0}', expected one of: major, minor, patch, pre-release, pre")]
    InvalidBumpLevel(String),

    #[error("{step}: next bump is outdated, {candidate} < {reference}")]
    OutdatedBump {
        step: String,
        candidate: String,
        reference: String,
    },

    #[error("{step}: no version change, {candidate} == {reference}")]
    NoVersionChange {
        step: String,
        candidate: String,
        reference: String,
    },

    #[error("{step}: bump {reference} --> {candidate} spans more than one level (delta {delta:?})")]
    BumpLevelSize {
        step: String,
        candidate: String,
        reference: String,
        delta: [i64; 5],
    },

    #[error("There are uncommitted changes in the git working tree")]
    DirtyRepo,

    #[error("Only one git remote is supported, found: {}", .0.join(", "))]
    MultipleRemotes(Vec<String>),

    #[error("Manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Refusing to write {new} to {path}: it is older than {current}")]
    RegressionWrite {
        path: PathBuf,
        current: String,
        new: String,
    },

    #[error("Manifest error in {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in bumpy
pub type Result<T> = std::result::Result<T, BumpyError>;

impl BumpyError {
    /// Create a malformed version error
    pub fn malformed(version: impl Into<String>, reason: impl Into<String>) -> Self {
        BumpyError::MalformedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BumpyError::Config(msg.into())
    }

    /// Create a manifest error for a file
    pub fn manifest(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        BumpyError::Manifest {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        BumpyError::Remote(msg.into())
    }

    /// Create a registry error with context
    pub fn registry(msg: impl Into<String>) -> Self {
        BumpyError::Registry(msg.into())
    }

    /// Relabel a comparison error with the validation step that produced it.
    ///
    /// Errors that do not carry a step are returned unchanged.
    pub fn in_step(self, name: &str) -> Self {
        match self {
            BumpyError::OutdatedBump {
                candidate,
                reference,
                ..
            } => BumpyError::OutdatedBump {
                step: name.to_string(),
                candidate,
                reference,
            },
            BumpyError::NoVersionChange {
                candidate,
                reference,
                ..
            } => BumpyError::NoVersionChange {
                step: name.to_string(),
                candidate,
                reference,
            },
            BumpyError::BumpLevelSize {
                candidate,
                reference,
                delta,
                ..
            } => BumpyError::BumpLevelSize {
                step: name.to_string(),
                candidate,
                reference,
                delta,
            },
            other => other,
        }
    }

    /// True for the "candidate equals reference" outcome
    pub fn is_no_change(&self) -> bool {
        matches!(self, BumpyError::NoVersionChange { .. })
    }
}
