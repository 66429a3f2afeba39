//! Git fixtures shared by the integration tests: a working clone with a
//! local bare `origin`.
#![allow(dead_code)]

use git2::build::CheckoutBuilder;
use git2::{Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Workspace {
    _dir: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
    pub repo: Repository,
}

pub fn pyproject(version: &str) -> String {
    format!(
        "[project]\nname = \"demo\"\nversion = \"{}\"\n\n[tool.demo]\nflag = true\n",
        version
    )
}

pub fn package_json(version: &str) -> String {
    format!(
        "{{\n  \"name\": \"demo\",\n  \"version\": \"{}\",\n  \"private\": true\n}}\n",
        version
    )
}

impl Workspace {
    /// Repository on `main` with one commit holding both manifests, pushed
    /// to `origin`.
    pub fn new(pyproject_version: &str, package_json_version: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("origin.git");
        let work = dir.path().join("work");
        Repository::init_bare(&remote).unwrap();

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&work, &opts).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        fs::write(work.join("pyproject.toml"), pyproject(pyproject_version)).unwrap();
        if let Some(version) = package_json_version {
            fs::write(work.join("package.json"), package_json(version)).unwrap();
        }

        let workspace = Workspace {
            _dir: dir,
            work,
            remote,
            repo,
        };
        workspace.commit_all("initial commit");
        workspace
            .repo
            .remote("origin", workspace.remote.to_str().unwrap())
            .unwrap();
        workspace.push_branch("main");
        workspace
    }

    pub fn commit_all(&self, message: &str) {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    /// Push a branch the way a CI checkout would see it afterwards
    pub fn push_branch(&self, branch: &str) {
        let mut remote = self.repo.find_remote("origin").unwrap();
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote.push(&[refspec.as_str()], None).unwrap();

        let oid = self
            .repo
            .find_reference(&format!("refs/heads/{}", branch))
            .unwrap()
            .target()
            .unwrap();
        self.repo
            .reference(&format!("refs/remotes/origin/{}", branch), oid, true, "test push")
            .unwrap();
    }

    pub fn create_branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
        self.checkout(name);
    }

    pub fn checkout(&self, name: &str) {
        self.repo.set_head(&format!("refs/heads/{}", name)).unwrap();
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))
            .unwrap();
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.work.join(file)
    }

    pub fn read(&self, file: &str) -> String {
        fs::read_to_string(self.path(file)).unwrap()
    }

    pub fn write(&self, file: &str, content: &str) {
        fs::write(self.path(file), content).unwrap();
    }

    pub fn local_tags(&self) -> Vec<String> {
        tags_of(&self.repo)
    }

    pub fn remote_tags(&self) -> Vec<String> {
        tags_of(&Repository::open_bare(&self.remote).unwrap())
    }

    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .message()
            .unwrap()
            .trim()
            .to_string()
    }

    pub fn root(&self) -> &Path {
        &self.work
    }
}

fn tags_of(repo: &Repository) -> Vec<String> {
    let names = repo.tag_names(None).unwrap();
    let mut tags: Vec<String> = names.iter().flatten().map(str::to_string).collect();
    tags.sort();
    tags
}
