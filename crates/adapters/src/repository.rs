//! Repository adapter contract (§6): "is this path a source, and where is
//! the repository root" — the one question the coordinator needs answered
//! by whatever version-control backend is in use.

use crate::error::AdapterError;
use crate::subprocess::{run_with_timeout, GIT_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[async_trait]
pub trait RepositoryAdapter: Send + Sync {
    /// Whether `path` is tracked by the repository, i.e. a *source* rather
    /// than a generated artifact the build engine may own (§4.1 step 2).
    async fn is_source(&self, path: &Path) -> Result<bool, AdapterError>;

    /// Root of the repository `path` lives under.
    fn repo_root(&self) -> &Path;
}

/// Git-backed [`RepositoryAdapter`]. Shells out to `git` rather than linking
/// a git implementation directly, mirroring how the rest of the workspace
/// treats version control as an external collaborator (§1).
pub struct GitRepositoryAdapter {
    repo_root: PathBuf,
}

impl GitRepositoryAdapter {
    /// Discover the repository root starting from `start_dir` via
    /// `git rev-parse --show-toplevel`.
    pub async fn discover(start_dir: &Path) -> Result<Self, AdapterError> {
        let mut cmd = Command::new("git");
        cmd.arg("rev-parse")
            .arg("--show-toplevel")
            .current_dir(start_dir);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git rev-parse --show-toplevel")
            .await
            .map_err(AdapterError::GitFailed)?;
        if !output.status.success() {
            return Err(AdapterError::GitFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self {
            repo_root: PathBuf::from(stdout.trim()),
        })
    }
}

#[async_trait]
impl RepositoryAdapter for GitRepositoryAdapter {
    async fn is_source(&self, path: &Path) -> Result<bool, AdapterError> {
        let mut cmd = Command::new("git");
        cmd.arg("ls-files")
            .arg("--error-unmatch")
            .arg(path)
            .current_dir(&self.repo_root);
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git ls-files --error-unmatch")
            .await
            .map_err(AdapterError::GitFailed)?;
        Ok(output.status.success())
    }

    fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
