//! Git operations abstraction layer
//!
//! The reconciliation engine only needs a handful of facts from version
//! control and a handful of mutations. They are expressed by the
//! [Repository] trait with two implementations:
//!
//! - [repository::Git2Repository]: a real repository through the `git2` crate
//! - [mock::MockRepository]: an in-memory stand-in for engine tests
//!
//! # Usage
//!
//! ```rust,no_run
//! # use bumpy_project::git::{Git2Repository, Repository};
//! # use std::path::Path;
//! # fn example() -> bumpy_project::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! if let Some(content) = repo.file_at_last_pushed(Path::new("pyproject.toml"))? {
//!     println!("last pushed manifest:\n{}", content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::{BumpyError, Result};
use std::path::{Path, PathBuf};

/// Name and email used for bump commits and tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Version control operations needed by the engine
pub trait Repository {
    /// Names of all configured remotes
    fn remotes(&self) -> Result<Vec<String>>;

    /// The only configured remote.
    ///
    /// # Returns
    /// * `Ok(None)` - No remote is configured
    /// * `Ok(Some(name))` - Exactly one remote
    /// * `Err(MultipleRemotes)` - More than one remote
    fn single_remote(&self) -> Result<Option<String>> {
        let mut remotes = self.remotes()?;
        match remotes.len() {
            0 => Ok(None),
            1 => Ok(remotes.pop()),
            _ => Err(BumpyError::MultipleRemotes(remotes)),
        }
    }

    /// Name of the checked out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;

    /// True if tracked files have uncommitted changes
    fn is_dirty(&self) -> Result<bool>;

    /// Message of the HEAD commit
    fn head_message(&self) -> Result<String>;

    /// Content of `path` as committed in the last pushed commit of the
    /// active branch.
    ///
    /// The active branch's remote-tracking ref is used when it exists. A
    /// branch that was never pushed falls back to the nearest remote-tracking
    /// ref it descends from, i.e. the branch it was created from.
    ///
    /// # Returns
    /// * `Ok(None)` - No remote, nothing pushed yet, or the file did not exist
    fn file_at_last_pushed(&self, path: &Path) -> Result<Option<String>>;

    /// Commit `paths` in a single commit and create an annotated tag `tag`
    /// on it, both with `message`.
    fn commit_and_tag(
        &self,
        paths: &[PathBuf],
        message: &str,
        tag: &str,
        identity: Option<&Identity>,
    ) -> Result<()>;

    /// Push the active branch and `tag` to `remote`
    fn push(&self, remote: &str, tag: &str) -> Result<()>;
}
