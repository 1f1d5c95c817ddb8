//! Repository sources.
//!
//! A [`RepositorySource`] materializes `(git_url, branch)` onto local disk
//! as a [`Checkout`]. Temporary checkouts are removed when the checkout is
//! dropped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors while materializing a repository. Fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to run git: {0}")]
    GitUnavailable(String),

    #[error("git clone of {url} (branch {branch}) failed: {stderr}")]
    CloneFailed {
        url: String,
        branch: String,
        stderr: String,
    },

    #[error("invalid {name} {value:?}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A repository available on local disk.
#[derive(Debug)]
pub struct Checkout {
    root: PathBuf,
    repo_name: String,
    branch: String,
    workspace: Option<TempDir>,
}

impl Checkout {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Whether the checkout is deleted on drop.
    pub fn is_temporary(&self) -> bool {
        self.workspace.is_some()
    }
}

/// Materializes repositories for analysis.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn checkout(&self, git_url: &str, branch: &str) -> Result<Checkout, SourceError>;
}

/// Repository name from a clone URL: last path segment without `.git`.
pub fn repo_name_from_url(git_url: &str) -> String {
    let trimmed = git_url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Reject clone arguments git could read as options.
fn check_clone_args(git_url: &str, branch: &str) -> Result<(), SourceError> {
    let checks = [("git_url", git_url), ("branch", branch)];
    for (name, value) in checks {
        let reason = if value.trim().is_empty() {
            "must not be empty"
        } else if value.starts_with('-') {
            "must not start with '-'"
        } else {
            continue;
        };
        return Err(SourceError::InvalidArgument {
            name,
            value: value.to_string(),
            reason,
        });
    }
    Ok(())
}

/// Shallow-clones a single branch into a temporary directory.
#[derive(Debug, Clone)]
pub struct GitCloneSource {
    git_bin: String,
}

impl Default for GitCloneSource {
    fn default() -> Self {
        Self {
            git_bin: "git".to_string(),
        }
    }
}

impl GitCloneSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable.
    pub fn with_git(mut self, git_bin: &str) -> Self {
        self.git_bin = git_bin.to_string();
        self
    }
}

#[async_trait]
impl RepositorySource for GitCloneSource {
    async fn checkout(&self, git_url: &str, branch: &str) -> Result<Checkout, SourceError> {
        check_clone_args(git_url, branch)?;
        let repo_name = repo_name_from_url(git_url);
        let workspace = tempfile::Builder::new().prefix("remedy-").tempdir()?;
        let dir_name = if repo_name.is_empty() { "repo" } else { repo_name.as_str() };
        let root = workspace.path().join(dir_name);

        info!(url = %git_url, branch = %branch, "cloning repository");
        let output = Command::new(&self.git_bin)
            .args(["clone", "--depth", "1", "--branch", branch, "--"])
            .arg(git_url)
            .arg(&root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| SourceError::GitUnavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(SourceError::CloneFailed {
                url: git_url.to_string(),
                branch: branch.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(root = %root.display(), "clone complete");
        Ok(Checkout {
            root,
            repo_name,
            branch: branch.to_string(),
            workspace: Some(workspace),
        })
    }
}

/// Analyses an existing directory in place. The URL only names the repo.
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    root: PathBuf,
}

impl LocalDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RepositorySource for LocalDirectorySource {
    async fn checkout(&self, git_url: &str, branch: &str) -> Result<Checkout, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::NotADirectory {
                path: self.root.display().to_string(),
            });
        }

        let mut repo_name = repo_name_from_url(git_url);
        if repo_name.is_empty() {
            repo_name = self
                .root
                .canonicalize()?
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "repo".to_string());
        }

        Ok(Checkout {
            root: self.root.clone(),
            repo_name,
            branch: branch.to_string(),
            workspace: None,
        })
    }
}
