//! Reconciliation engine
//!
//! One bump request runs through a fixed sequence of stages:
//!
//! 1. compute the candidate from the primary manifest
//! 2. check it against the last pushed manifest of the active branch
//! 3. check it against every configured version source
//! 4. stop here when only validating the current version
//! 5. refuse to touch a dirty working tree
//! 6. stop here on a dry run
//! 7. write every manifest
//! 8. commit the changed manifests and tag the commit
//! 9. push the branch and the tag
//!
//! Any error aborts the remaining stages. Nothing already written is rolled
//! back.

use crate::ci::{CiOutput, Signal};
use crate::domain::{BumpLevel, VersionScheme};
use crate::error::{BumpyError, Result};
use crate::git::{Identity, Repository};
use crate::manifest::ManifestFile;
use crate::sources::VersionSource;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Validation step name used for the git history check
pub const GIT_HISTORY_STEP: &str = "git history";

/// How the candidate version is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Bump the current version by a level
    Bump(BumpLevel),
    /// Bump by the level marker found in the HEAD commit message
    FromCommitMessage,
    /// Validate the current manifest version as it is
    Current,
}

/// What to do when a source already has the candidate version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Abort with `NoVersionChange`
    #[default]
    Strict,
    /// Emit `<KEY>BUMP=FALSE` and carry on
    Report,
}

/// A version source together with its check mode
pub struct SourceCheck {
    pub source: Box<dyn VersionSource>,
    pub mode: CheckMode,
}

impl SourceCheck {
    pub fn new(source: Box<dyn VersionSource>, mode: CheckMode) -> Self {
        SourceCheck { source, mode }
    }

    pub fn strict(source: Box<dyn VersionSource>) -> Self {
        Self::new(source, CheckMode::Strict)
    }

    pub fn report(source: Box<dyn VersionSource>) -> Self {
        Self::new(source, CheckMode::Report)
    }
}

/// Engine toggles, fixed for the lifetime of a [Reconciler]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOptions {
    /// Skip the dirty check, the commit, the tag and the push
    pub ignore_git_state: bool,
    /// Compare against the last pushed manifest
    pub check_git_history: bool,
    /// Push the commit and the tag to the single remote
    pub push: bool,
    /// Stop before writing anything
    pub dry_run: bool,
    /// Commit/tag identity; the repository's own identity when unset
    pub identity: Option<Identity>,
}

impl Default for BumpOptions {
    fn default() -> Self {
        BumpOptions {
            ignore_git_state: false,
            check_git_history: true,
            push: false,
            dry_run: false,
            identity: None,
        }
    }
}

/// Where a bump request stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The current version passed every check; nothing was written
    CurrentValidated,
    /// Every check passed; nothing was written
    DryRun,
    /// Manifests were written; git state was left alone
    Written,
    /// Every manifest already held the candidate
    Unchanged,
    /// Manifests were committed and tagged
    Committed,
}

/// Result of one bump request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    /// Primary manifest version before the request, canonical
    pub previous: String,
    /// Candidate version, canonical
    pub version: String,
    pub completion: Completion,
    /// Manifests whose content changed
    pub written: Vec<PathBuf>,
    pub pushed: bool,
    /// Signals produced by report-mode checks
    pub signals: Vec<Signal>,
}

/// Drives one bump request against a repository
pub struct Reconciler<R: Repository> {
    repo: R,
    scheme: VersionScheme,
    options: BumpOptions,
    primary: ManifestFile,
    secondary: Option<ManifestFile>,
    sources: Vec<SourceCheck>,
    output: CiOutput,
}

impl<R: Repository> Reconciler<R> {
    pub fn new(repo: R, scheme: VersionScheme, options: BumpOptions, primary: ManifestFile) -> Self {
        Reconciler {
            repo,
            scheme,
            options,
            primary,
            secondary: None,
            sources: Vec::new(),
            output: CiOutput::default(),
        }
    }

    /// Also keep `manifest` in sync; it is skipped when the file is absent
    pub fn with_secondary(mut self, manifest: ManifestFile) -> Self {
        self.secondary = Some(manifest);
        self
    }

    pub fn with_source(mut self, check: SourceCheck) -> Self {
        self.sources.push(check);
        self
    }

    pub fn with_output(mut self, output: CiOutput) -> Self {
        self.output = output;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn scheme(&self) -> &VersionScheme {
        &self.scheme
    }

    pub fn options(&self) -> &BumpOptions {
        &self.options
    }

    /// Canonical version currently held by the primary manifest
    pub fn current_version(&self) -> Result<String> {
        let raw = self.primary.read_version()?;
        self.scheme.to_canonical(&raw)
    }

    /// Candidate version for a request, without running any check
    pub fn candidate(&self, current: &str, candidate: Candidate) -> Result<String> {
        match candidate {
            Candidate::Current => Ok(current.to_string()),
            Candidate::Bump(level) => self.scheme.bump(current, level),
            Candidate::FromCommitMessage => {
                let message = self.repo.head_message()?;
                let level = BumpLevel::from_commit_message(&message)?;
                debug!("bump level {} from commit message", level);
                self.scheme.bump(current, level)
            }
        }
    }

    /// Run a bump request through every stage
    pub fn run(&self, candidate: Candidate) -> Result<BumpOutcome> {
        let previous = self.current_version()?;
        let version = self.candidate(&previous, candidate)?;
        info!("candidate version {} (current {})", version, previous);

        let mut outcome = BumpOutcome {
            previous,
            version,
            completion: Completion::DryRun,
            written: Vec::new(),
            pushed: false,
            signals: Vec::new(),
        };

        if self.options.check_git_history {
            self.check_git_history(&outcome.previous, &outcome.version)?;
        }

        for check in &self.sources {
            if let Some(signal) = self.check_source(check, &outcome.version)? {
                self.output.emit(&signal)?;
                outcome.signals.push(signal);
            }
        }

        if candidate == Candidate::Current {
            outcome.completion = Completion::CurrentValidated;
            return Ok(outcome);
        }

        if !self.options.ignore_git_state && self.repo.is_dirty()? {
            return Err(BumpyError::DirtyRepo);
        }

        if self.options.dry_run {
            info!("dry run, not writing {}", outcome.version);
            return Ok(outcome);
        }

        outcome.written = self.write_manifests(&outcome.version)?;

        if self.options.ignore_git_state {
            outcome.completion = if outcome.written.is_empty() {
                Completion::Unchanged
            } else {
                Completion::Written
            };
            return Ok(outcome);
        }

        if outcome.written.is_empty() {
            info!("no manifest changed, nothing to commit");
            outcome.completion = Completion::Unchanged;
            return Ok(outcome);
        }

        let message = format!("bump {} --> {}", outcome.previous, outcome.version);
        self.repo.commit_and_tag(
            &outcome.written,
            &message,
            &outcome.version,
            self.options.identity.as_ref(),
        )?;
        outcome.completion = Completion::Committed;

        if self.options.push {
            let remote = self
                .repo
                .single_remote()?
                .ok_or_else(|| BumpyError::remote("no git remote configured"))?;
            self.repo.push(&remote, &outcome.version)?;
            outcome.pushed = true;
        }

        Ok(outcome)
    }

    /// Reject a candidate more than one level above the last pushed version.
    ///
    /// Passes when nothing was pushed yet or when the manifest still holds
    /// the pushed version.
    pub fn check_git_history(&self, current: &str, candidate: &str) -> Result<()> {
        let Some(content) = self.repo.file_at_last_pushed(self.primary.path())? else {
            debug!("no pushed version of {}", self.primary.path().display());
            return Ok(());
        };

        let raw = self
            .primary
            .kind()
            .version_from_str(&content, self.primary.path())?;
        let pushed = self.scheme.to_canonical(&raw)?;

        if self.scheme.compare(&pushed, current)? == Ordering::Equal {
            return Ok(());
        }

        warn!(
            "manifest version {} differs from last pushed version {}",
            current, pushed
        );
        self.scheme
            .ensure_single_level(&pushed, candidate)
            .map_err(|e| e.in_step(GIT_HISTORY_STEP))?;
        Ok(())
    }

    /// Check `candidate` against the latest version of one source.
    ///
    /// # Returns
    /// * `Ok(None)` - Strict check passed
    /// * `Ok(Some(signal))` - Report-mode result, `FALSE` when the source
    ///   already has the candidate
    ///
    /// # Errors
    /// * `OutdatedBump` - the source has a newer version, in either mode
    /// * `NoVersionChange` - the source has the candidate, strict mode only
    pub fn check_source(&self, check: &SourceCheck, candidate: &str) -> Result<Option<Signal>> {
        let name = check.source.name();
        let key = check.source.signal_key();

        let verdict = match check.source.fetch_latest(&self.scheme)? {
            Some(latest) => {
                debug!("{}: latest {}", name, latest);
                self.scheme.is_newer(&latest, candidate)
            }
            None => {
                info!("{}: nothing published yet", name);
                Ok(true)
            }
        };

        match (verdict, check.mode) {
            (Ok(_), CheckMode::Strict) => Ok(None),
            (Ok(_), CheckMode::Report) => Ok(Some(Signal::bump(key, true))),
            (Err(e), CheckMode::Report) if e.is_no_change() => {
                let e = e.in_step(name);
                warn!("{}", e);
                Ok(Some(Signal::bump(key, false)))
            }
            (Err(e), _) => Err(e.in_step(name)),
        }
    }

    fn write_manifests(&self, version: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if self.primary.write(&self.scheme, version)? {
            written.push(self.primary.path().to_path_buf());
        }

        if let Some(secondary) = &self.secondary {
            if !secondary.exists() {
                debug!("{} not found, skipping", secondary.path().display());
            } else if secondary.write(&self.scheme, version)? {
                written.push(secondary.path().to_path_buf());
            }
        }

        Ok(written)
    }
}
