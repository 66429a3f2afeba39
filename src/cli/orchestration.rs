//! Main workflow orchestration logic
//!
//! Turns arguments and configuration into one [Reconciler] with concrete
//! collaborators and runs it. Kept free of clap so the workflow can be
//! driven programmatically.

use std::path::PathBuf;

use crate::ci::{CiOutput, Signal};
use crate::config::{Config, IndexConfig, RegistryConfig};
use crate::domain::BumpLevel;
use crate::error::Result;
use crate::git::{Git2Repository, Repository};
use crate::manifest::ManifestFile;
use crate::reconcile::{BumpOptions, BumpOutcome, Candidate, CheckMode, Reconciler, SourceCheck};
use crate::sources::container_registry::RegistryCredentials;
use crate::sources::{CondaIndexSource, ContainerRegistrySource, PackageIndexSource};
use crate::ui;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Bump(BumpLevel),
    FromCommitMessage,
    CheckCurrent,
}

impl From<Request> for Candidate {
    fn from(request: Request) -> Self {
        match request {
            Request::Bump(level) => Candidate::Bump(level),
            Request::FromCommitMessage => Candidate::FromCommitMessage,
            Request::CheckCurrent => Candidate::Current,
        }
    }
}

/// Arguments for the bump workflow
///
/// Mirrors the CLI arguments. Every `Option` left as `None` falls back to
/// the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct BumpArgs {
    pub request: Request,

    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    pub root: Option<PathBuf>,
    pub pyproject: Option<PathBuf>,
    pub package_json: Option<PathBuf>,
    pub tag_literal: Option<String>,

    pub ignore_git_state: bool,
    pub skip_git_history: bool,
    pub push: bool,
    pub dry_run: bool,

    pub user_name: Option<String>,
    pub user_email: Option<String>,

    pub pypi_url: Option<String>,
    pub conda_url: Option<String>,
    pub registry_name: Option<String>,
    pub registry_repository: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,

    /// Run every source check in report mode
    pub report: bool,

    /// File receiving `KEY=VALUE` signals
    pub ci_output: Option<PathBuf>,
}

impl BumpArgs {
    pub fn new(request: Request) -> Self {
        BumpArgs {
            request,
            config_path: None,
            root: None,
            pyproject: None,
            package_json: None,
            tag_literal: None,
            ignore_git_state: false,
            skip_git_history: false,
            push: false,
            dry_run: false,
            user_name: None,
            user_email: None,
            pypi_url: None,
            conda_url: None,
            registry_name: None,
            registry_repository: None,
            registry_username: None,
            registry_password: None,
            report: false,
            ci_output: None,
        }
    }
}

fn override_index(current: Option<IndexConfig>, url: &Option<String>) -> Option<IndexConfig> {
    match (current, url) {
        (Some(index), Some(url)) => Some(IndexConfig {
            url: url.clone(),
            ..index
        }),
        (None, Some(url)) => Some(IndexConfig {
            url: url.clone(),
            mode: CheckMode::default(),
        }),
        (current, None) => current,
    }
}

/// Apply argument overrides on top of the configuration file
pub fn resolve_config(mut config: Config, args: &BumpArgs) -> Config {
    if let Some(root) = &args.root {
        config.project.root = root.clone();
    }
    if let Some(pyproject) = &args.pyproject {
        config.project.pyproject = pyproject.clone();
    }
    if let Some(package_json) = &args.package_json {
        config.project.package_json = package_json.clone();
    }
    if let Some(tag) = &args.tag_literal {
        config.versioning.tag_literal = tag.clone();
    }

    if args.user_name.is_some() {
        config.git.user_name = args.user_name.clone();
    }
    if args.user_email.is_some() {
        config.git.user_email = args.user_email.clone();
    }
    config.git.push |= args.push;
    config.git.check_history &= !args.skip_git_history;

    config.sources.package_index = override_index(config.sources.package_index, &args.pypi_url);
    config.sources.secondary_index =
        override_index(config.sources.secondary_index, &args.conda_url);

    if let (Some(name), Some(repository)) = (&args.registry_name, &args.registry_repository) {
        let mode = config
            .sources
            .container_registry
            .as_ref()
            .map(|r| r.mode)
            .unwrap_or_default();
        config.sources.container_registry = Some(RegistryConfig {
            name: name.clone(),
            repository: repository.clone(),
            mode,
        });
    }

    if args.report {
        for index in [
            config.sources.package_index.as_mut(),
            config.sources.secondary_index.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            index.mode = CheckMode::Report;
        }
        if let Some(registry) = config.sources.container_registry.as_mut() {
            registry.mode = CheckMode::Report;
        }
    }

    config
}

fn registry_credentials(args: &BumpArgs) -> Option<RegistryCredentials> {
    match (&args.registry_username, &args.registry_password) {
        (Some(username), Some(password)) => Some(RegistryCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    }
}

/// Source checks for every configured source
pub fn source_checks(config: &Config, args: &BumpArgs) -> Vec<SourceCheck> {
    let mut checks = Vec::new();

    if let Some(index) = &config.sources.package_index {
        checks.push(SourceCheck::new(
            Box::new(PackageIndexSource::new(index.url.as_str())),
            index.mode,
        ));
    }
    if let Some(index) = &config.sources.secondary_index {
        checks.push(SourceCheck::new(
            Box::new(CondaIndexSource::new(index.url.as_str())),
            index.mode,
        ));
    }
    if let Some(registry) = &config.sources.container_registry {
        checks.push(SourceCheck::new(
            Box::new(ContainerRegistrySource::azure(
                &registry.name,
                registry.repository.as_str(),
                registry_credentials(args),
            )),
            registry.mode,
        ));
    }

    checks
}

/// Engine toggles from the resolved configuration
pub fn bump_options(config: &Config, args: &BumpArgs) -> BumpOptions {
    BumpOptions {
        ignore_git_state: args.ignore_git_state,
        check_git_history: config.git.check_history,
        push: config.git.push,
        dry_run: args.dry_run,
        identity: config.git.identity(),
    }
}

/// Build a reconciler over `repo` for the manifests named by `config.project`
pub fn build_reconciler<R: Repository>(
    repo: R,
    config: &Config,
    args: &BumpArgs,
) -> Result<Reconciler<R>> {
    let scheme = config.scheme()?;
    let primary = ManifestFile::pyproject(config.project.pyproject_path());
    let secondary = ManifestFile::package_json(config.project.package_json_path());

    let mut reconciler = Reconciler::new(repo, scheme, bump_options(config, args), primary)
        .with_secondary(secondary)
        .with_output(CiOutput::new(args.ci_output.clone()));
    for check in source_checks(config, args) {
        reconciler = reconciler.with_source(check);
    }
    Ok(reconciler)
}

/// Main bump workflow
///
/// 1. Merge arguments into the configuration
/// 2. Open the repository at the project root
/// 3. Run the reconciler
/// 4. Report the final version to the CI output
///
/// # Arguments
///
/// * `args` - Workflow arguments
/// * `config` - Configuration loaded from file (or defaults)
pub fn run_bump(args: &BumpArgs, config: Config) -> Result<BumpOutcome> {
    let mut config = resolve_config(config, args);
    config.project.root = config.project.root.canonicalize()?;

    let repo = Git2Repository::open(&config.project.root)?;
    let reconciler = build_reconciler(repo, &config, args)?;

    let outcome = reconciler.run(args.request.into())?;
    ui::display_plan(&outcome.previous, &outcome.version);

    CiOutput::new(args.ci_output.clone()).emit(&Signal::new("VERSION", outcome.version.as_str()))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_overrides() {
        let mut args = BumpArgs::new(Request::Bump(BumpLevel::Patch));
        args.pypi_url = Some("https://pypi.org/pypi/demo/json".to_string());
        args.tag_literal = Some("beta".to_string());
        args.skip_git_history = true;
        args.report = true;

        let config = resolve_config(Config::default(), &args);

        assert_eq!(config.versioning.tag_literal, "beta");
        assert!(!config.git.check_history);
        let index = config.sources.package_index.unwrap();
        assert_eq!(index.url, "https://pypi.org/pypi/demo/json");
        assert_eq!(index.mode, CheckMode::Report);
        assert!(config.sources.secondary_index.is_none());
    }

    #[test]
    fn test_registry_needs_name_and_repository() {
        let mut args = BumpArgs::new(Request::CheckCurrent);
        args.registry_name = Some("myacr".to_string());

        let config = resolve_config(Config::default(), &args);
        assert!(config.sources.container_registry.is_none());

        args.registry_repository = Some("team/app".to_string());
        let config = resolve_config(Config::default(), &args);
        assert_eq!(source_checks(&config, &args).len(), 1);
    }

    #[test]
    fn test_bump_options_from_config() {
        let mut args = BumpArgs::new(Request::Bump(BumpLevel::Minor));
        args.push = true;
        args.dry_run = true;
        args.user_name = Some("bot".to_string());
        args.user_email = Some("bot@example.com".to_string());

        let config = resolve_config(Config::default(), &args);
        let options = bump_options(&config, &args);

        assert!(options.push);
        assert!(options.dry_run);
        assert!(options.check_git_history);
        assert_eq!(options.identity.unwrap().name, "bot");
    }

    #[test]
    fn test_request_into_candidate() {
        assert_eq!(Candidate::from(Request::CheckCurrent), Candidate::Current);
        assert_eq!(
            Candidate::from(Request::Bump(BumpLevel::Major)),
            Candidate::Bump(BumpLevel::Major)
        );
    }
}
