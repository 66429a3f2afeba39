use crate::error::{BumpyError, Result};
use crate::git::{Identity, Repository};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A commit recorded by [MockRepository::commit_and_tag]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommit {
    pub paths: Vec<PathBuf>,
    pub message: String,
    pub tag: String,
    pub identity: Option<Identity>,
}

/// Mock repository for testing without actual git operations
#[derive(Default)]
pub struct MockRepository {
    remotes: Vec<String>,
    branch: Option<String>,
    dirty: bool,
    head_message: String,
    pushed_files: HashMap<PathBuf, String>,
    commits: RefCell<Vec<RecordedCommit>>,
    pushes: RefCell<Vec<(String, String)>>,
}

impl MockRepository {
    /// Create a new mock repository on branch `main` with no remotes
    pub fn new() -> Self {
        MockRepository {
            branch: Some("main".to_string()),
            ..Default::default()
        }
    }

    /// Add a remote name
    pub fn add_remote(&mut self, name: impl Into<String>) {
        self.remotes.push(name.into());
    }

    /// Mark the working tree as having uncommitted changes
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Set the HEAD commit message
    pub fn set_head_message(&mut self, message: impl Into<String>) {
        self.head_message = message.into();
    }

    /// Content of a file as it was last pushed
    pub fn set_pushed_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.pushed_files.insert(path.into(), content.into());
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits.borrow().clone()
    }

    /// Pushes as `(remote, tag)` pairs
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.borrow().clone()
    }
}

impl Repository for MockRepository {
    fn remotes(&self) -> Result<Vec<String>> {
        Ok(self.remotes.clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    fn head_message(&self) -> Result<String> {
        Ok(self.head_message.clone())
    }

    fn file_at_last_pushed(&self, path: &Path) -> Result<Option<String>> {
        if self.single_remote()?.is_none() {
            return Ok(None);
        }
        Ok(self.pushed_files.get(path).cloned())
    }

    fn commit_and_tag(
        &self,
        paths: &[PathBuf],
        message: &str,
        tag: &str,
        identity: Option<&Identity>,
    ) -> Result<()> {
        self.commits.borrow_mut().push(RecordedCommit {
            paths: paths.to_vec(),
            message: message.to_string(),
            tag: tag.to_string(),
            identity: identity.cloned(),
        });
        Ok(())
    }

    fn push(&self, remote: &str, tag: &str) -> Result<()> {
        if !self.remotes.iter().any(|r| r == remote) {
            return Err(BumpyError::remote(format!(
                "No remote named '{}' found",
                remote
            )));
        }
        self.pushes
            .borrow_mut()
            .push((remote.to_string(), tag.to_string()));
        Ok(())
    }
}
