use crate::error::{BumpyError, Result};
use crate::git::{Identity, Repository as _};
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Signature, StatusOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identity used when neither the caller nor the repository provides one
pub const FALLBACK_USER_NAME: &str = "bumpybot";
pub const FALLBACK_USER_EMAIL: &str = "bumpybot@bumpyproject.com";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| BumpyError::config("bare repositories are not supported"))
    }

    /// Express `path` relative to the working tree root
    fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self.workdir()?.canonicalize()?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            workdir.join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                BumpyError::config(format!(
                    "{} is outside the repository at {}",
                    path.display(),
                    workdir.display()
                ))
            })
    }

    fn head_oid(&self) -> Result<Option<Oid>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?.id())),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Commit the active branch was last pushed at, with the ref it came from
    fn last_pushed_commit(&self, remote: &str, head: Oid) -> Result<Option<(String, Oid)>> {
        if let Some(branch) = self.current_branch()? {
            let tracking = format!("refs/remotes/{}/{}", remote, branch);
            match self.repo.find_reference(&tracking) {
                Ok(reference) => {
                    if let Some(oid) = reference.target() {
                        return Ok(Some((tracking, oid)));
                    }
                }
                Err(e) if e.code() == ErrorCode::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        // Never pushed under its own name: use the closest pushed ancestor.
        let mut best: Option<(String, Oid, usize)> = None;
        for reference in self
            .repo
            .references_glob(&format!("refs/remotes/{}/*", remote))?
        {
            let reference = reference?;
            let (Some(name), Some(oid)) = (reference.name(), reference.target()) else {
                continue;
            };
            if oid != head && !self.repo.graph_descendant_of(head, oid)? {
                continue;
            }
            let (ahead, _) = self.repo.graph_ahead_behind(head, oid)?;
            if best.as_ref().map_or(true, |(_, _, a)| ahead < *a) {
                best = Some((name.to_string(), oid, ahead));
            }
        }

        Ok(best.map(|(name, oid, _)| (name, oid)))
    }

    fn signature(&self, identity: Option<&Identity>) -> Result<Signature<'static>> {
        if let Some(id) = identity {
            return Ok(Signature::now(&id.name, &id.email)?);
        }
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_USER_NAME, FALLBACK_USER_EMAIL)?),
        }
    }

    fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|url, username_from_url, allowed_types| {
            // SSH key authentication
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(
                                username_from_url.unwrap_or("git"),
                                None,
                                &path,
                                None,
                            ) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                // Try SSH agent as fallback
                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }

            // HTTPS through the configured credential helper
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let Ok(config) = git2::Config::open_default() {
                    if let Ok(cred) = git2::Cred::credential_helper(&config, url, username_from_url)
                    {
                        return Ok(cred);
                    }
                }
            }

            git2::Cred::default()
        });

        // Surface per-ref rejections as errors
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push failed for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        callbacks
    }
}

impl super::Repository for Git2Repository {
    fn remotes(&self) -> Result<Vec<String>> {
        let names = self.repo.remotes()?;
        Ok(names.iter().flatten().map(str::to_string).collect())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            // Unborn branch: HEAD still names it.
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT))
    }

    fn head_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_string())
    }

    fn file_at_last_pushed(&self, path: &Path) -> Result<Option<String>> {
        let Some(remote) = self.single_remote()? else {
            debug!("no remote configured, nothing was pushed");
            return Ok(None);
        };
        let Some(head) = self.head_oid()? else {
            return Ok(None);
        };
        let Some((refname, oid)) = self.last_pushed_commit(&remote, head)? else {
            debug!("no pushed history for the active branch on '{}'", remote);
            return Ok(None);
        };

        let relative = self.relative_path(path)?;
        let tree = self.repo.find_commit(oid)?.tree()?;
        let entry = match tree.get_path(&relative) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;

        debug!("read {} from {} ({})", relative.display(), refname, oid);
        let content = std::str::from_utf8(blob.content()).map_err(|e| {
            BumpyError::manifest(path, format!("not valid UTF-8 at {}: {}", refname, e))
        })?;
        Ok(Some(content.to_string()))
    }

    fn commit_and_tag(
        &self,
        paths: &[PathBuf],
        message: &str,
        tag: &str,
        identity: Option<&Identity>,
    ) -> Result<()> {
        let signature = self.signature(identity)?;

        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(&self.relative_path(path)?)?;
        }
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let parent = match self.head_oid()? {
            Some(oid) => Some(self.repo.find_commit(oid)?),
            None => None,
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let commit_oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        let object = self.repo.find_object(commit_oid, None)?;
        self.repo.tag(tag, &object, &signature, message, false)?;

        info!("committed {} and tagged {}", commit_oid, tag);
        Ok(())
    }

    fn push(&self, remote_name: &str, tag: &str) -> Result<()> {
        let branch = self
            .current_branch()?
            .ok_or_else(|| BumpyError::remote("HEAD is detached, nothing to push"))?;
        let head = self
            .head_oid()?
            .ok_or_else(|| BumpyError::remote("the active branch has no commits"))?;

        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| BumpyError::remote(format!("No remote named '{}' found", remote_name)))?;

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(Self::remote_callbacks());

        let refspecs = [
            format!("refs/heads/{0}:refs/heads/{0}", branch),
            format!("refs/tags/{0}:refs/tags/{0}", tag),
        ];

        if let Err(e) = remote.push(&refspecs, Some(&mut push_options)) {
            return Err(match e.class() {
                git2::ErrorClass::Net => {
                    BumpyError::remote(format!("Network error during push: {}", e))
                }
                git2::ErrorClass::Reference => {
                    BumpyError::remote(format!("Reference error during push: {}", e))
                }
                _ => BumpyError::remote(format!(
                    "Failed to push '{}' and tag '{}': {}",
                    branch, tag, e
                )),
            });
        }

        // Record what the remote now has, so the next run sees it as pushed.
        let tracking = format!("refs/remotes/{}/{}", remote_name, branch);
        self.repo.reference(&tracking, head, true, "bumpy: push")?;

        let mut local = self.repo.find_branch(&branch, BranchType::Local)?;
        if local.upstream().is_err() {
            if let Err(e) = local.set_upstream(Some(&format!("{}/{}", remote_name, branch))) {
                debug!("could not set upstream for {}: {}", branch, e);
            }
        }

        info!("pushed {} and tag {} to {}", branch, tag, remote_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git2Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        (dir, Git2Repository::from_git2(repo))
    }

    #[test]
    fn test_no_remote_means_nothing_pushed() {
        let (dir, repo) = init_repo();
        fs::write(dir.path().join("pyproject.toml"), "[project]\nversion = \"0.0.1\"\n").unwrap();
        repo.commit_and_tag(
            &[dir.path().join("pyproject.toml")],
            "init",
            "0.0.1",
            None,
        )
        .unwrap();

        assert_eq!(repo.single_remote().unwrap(), None);
        assert_eq!(
            repo.file_at_last_pushed(Path::new("pyproject.toml")).unwrap(),
            None
        );
    }

    #[test]
    fn test_file_at_last_pushed_reads_tracking_branch() {
        let (dir, repo) = init_repo();
        let file = dir.path().join("pyproject.toml");
        fs::write(&file, "[project]\nversion = \"0.0.1\"\n").unwrap();
        repo.commit_and_tag(&[file.clone()], "init", "0.0.1", None)
            .unwrap();

        repo.repo.remote("origin", "https://example.com/a.git").unwrap();
        let branch = repo.current_branch().unwrap().unwrap();
        let pushed = repo.head_oid().unwrap().unwrap();
        repo.repo
            .reference(&format!("refs/remotes/origin/{}", branch), pushed, false, "test")
            .unwrap();

        fs::write(&file, "[project]\nversion = \"0.0.2\"\n").unwrap();
        repo.commit_and_tag(&[file], "bump 0.0.1 --> 0.0.2", "0.0.2", None)
            .unwrap();

        let content = repo
            .file_at_last_pushed(Path::new("pyproject.toml"))
            .unwrap()
            .unwrap();
        assert!(content.contains("0.0.1"));
    }

    #[test]
    fn test_multiple_remotes_rejected() {
        let (_dir, repo) = init_repo();
        repo.repo.remote("origin", "https://example.com/a.git").unwrap();
        repo.repo.remote("upstream", "https://example.com/b.git").unwrap();

        assert!(matches!(
            repo.single_remote(),
            Err(BumpyError::MultipleRemotes(_))
        ));
    }

    #[test]
    fn test_dirty_detection_ignores_untracked() {
        let (dir, repo) = init_repo();
        let file = dir.path().join("pyproject.toml");
        fs::write(&file, "[project]\nversion = \"0.0.1\"\n").unwrap();
        repo.commit_and_tag(&[file.clone()], "init", "0.0.1", None)
            .unwrap();
        assert!(!repo.is_dirty().unwrap());

        fs::write(dir.path().join("scratch.txt"), "notes").unwrap();
        assert!(!repo.is_dirty().unwrap());

        fs::write(&file, "[project]\nversion = \"0.0.2\"\n").unwrap();
        assert!(repo.is_dirty().unwrap());
    }

    #[test]
    fn test_commit_and_tag_uses_identity() {
        let (dir, repo) = init_repo();
        let file = dir.path().join("package.json");
        fs::write(&file, "{\"version\": \"1.0.0\"}").unwrap();

        let identity = Identity::new("release-bot", "bot@example.com");
        repo.commit_and_tag(&[file], "bump 0.9.0 --> 1.0.0", "1.0.0", Some(&identity))
            .unwrap();

        assert_eq!(repo.head_message().unwrap().trim(), "bump 0.9.0 --> 1.0.0");
        let tag_ref = repo.repo.find_reference("refs/tags/1.0.0").unwrap();
        let tag = tag_ref.peel_to_tag().unwrap();
        assert_eq!(tag.tagger().unwrap().name(), Some("release-bot"));
        assert_eq!(tag.message().map(str::trim), Some("bump 0.9.0 --> 1.0.0"));
    }

    #[test]
    fn test_current_branch_on_unborn_head() {
        let (_dir, repo) = init_repo();
        assert!(repo.current_branch().unwrap().is_some());
    }
}
