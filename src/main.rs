use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bumpy_project::cli::{run_bump, BumpArgs, Request};
use bumpy_project::config;
use bumpy_project::domain::BumpLevel;
use bumpy_project::ui;

#[derive(clap::Parser)]
#[command(
    name = "bumpy",
    version,
    about = "Bump, validate, commit and tag project versions"
)]
struct Args {
    #[arg(help = "Bump level: major, minor, patch, pre-release (or pre)")]
    level: Option<BumpLevel>,

    #[arg(
        long,
        conflicts_with = "level",
        help = "Take the bump level from a [major]/[minor]/[patch]/[pre] marker in the HEAD commit message"
    )]
    from_commit_message: bool,

    #[arg(
        long,
        conflicts_with_all = ["level", "from_commit_message"],
        help = "Validate the current manifest version without bumping"
    )]
    check_current: bool,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, env = "GIT_ROOT_DIR", help = "Repository root")]
    root: Option<PathBuf>,

    #[arg(long, env = "PYPROJECT_TOML", help = "Primary manifest, relative to the root")]
    pyproject: Option<PathBuf>,

    #[arg(long, env = "PACKAGE_JSON", help = "Secondary manifest, relative to the root")]
    package_json: Option<PathBuf>,

    #[arg(long, env = "RELEASE_TAG", help = "Pre-release tag literal [default: alpha]")]
    tag_literal: Option<String>,

    #[arg(long, help = "Skip the dirty check, the commit, the tag and the push")]
    ignore_git_state: bool,

    #[arg(long, help = "Do not compare against the last pushed version")]
    skip_git_history: bool,

    #[arg(long, help = "Push the bump commit and tag to the remote")]
    push: bool,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, env = "GITHUB_USER", help = "Commit author name")]
    user_name: Option<String>,

    #[arg(long, env = "GITHUB_USER_EMAIL", help = "Commit author email")]
    user_email: Option<String>,

    #[arg(long, env = "PYPI_URL", help = "Package index JSON endpoint to check against")]
    pypi_url: Option<String>,

    #[arg(long, env = "CONDA_URL", help = "Secondary index JSON endpoint to check against")]
    conda_url: Option<String>,

    #[arg(long, env = "AZ_ACR_NAME", help = "Container registry name")]
    registry_name: Option<String>,

    #[arg(long, env = "AZ_ACR_REPO_NAME", help = "Container registry repository")]
    registry_repository: Option<String>,

    #[arg(long, env = "AZ_ACR_SERVICE_PRINCIPAL_USERNAME", hide_env_values = true)]
    registry_username: Option<String>,

    #[arg(long, env = "AZ_ACR_SERVICE_PRINCIPAL_PASSWORD", hide_env_values = true)]
    registry_password: Option<String>,

    #[arg(long, help = "Report already-published versions as signals instead of failing")]
    report: bool,

    #[arg(long, env = "GITHUB_OUTPUT", help = "File receiving KEY=VALUE outputs")]
    ci_output: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl Args {
    fn request(&self) -> Result<Request> {
        if self.check_current {
            return Ok(Request::CheckCurrent);
        }
        if self.from_commit_message {
            return Ok(Request::FromCommitMessage);
        }
        match self.level {
            Some(level) => Ok(Request::Bump(level)),
            None => bail!("a bump level, --from-commit-message or --check-current is required"),
        }
    }

    fn into_bump_args(self) -> Result<BumpArgs> {
        let mut bump = BumpArgs::new(self.request()?);
        bump.config_path = self.config;
        bump.root = self.root;
        bump.pyproject = self.pyproject;
        bump.package_json = self.package_json;
        bump.tag_literal = self.tag_literal;
        bump.ignore_git_state = self.ignore_git_state;
        bump.skip_git_history = self.skip_git_history;
        bump.push = self.push;
        bump.dry_run = self.dry_run;
        bump.user_name = self.user_name;
        bump.user_email = self.user_email;
        bump.pypi_url = self.pypi_url;
        bump.conda_url = self.conda_url;
        bump.registry_name = self.registry_name;
        bump.registry_repository = self.registry_repository;
        bump.registry_username = self.registry_username;
        bump.registry_password = self.registry_password;
        bump.report = self.report;
        bump.ci_output = self.ci_output;
        Ok(bump)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let bump_args = match args.into_bump_args() {
        Ok(bump_args) => bump_args,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(2);
        }
    };

    // Load configuration
    let config = match config::load_config(bump_args.config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    match run_bump(&bump_args, config) {
        Ok(outcome) => {
            ui::display_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
