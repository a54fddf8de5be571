//! Git metadata used to fill tag templates

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployError;

/// Source control queries backing the tag template variables
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Current branch name
    async fn branch(&self) -> Result<String, DeployError>;

    /// Number of commits reachable from HEAD
    async fn rev_count(&self) -> Result<String, DeployError>;

    /// Abbreviated HEAD revision
    async fn rev_short(&self) -> Result<String, DeployError>;
}

/// Reads metadata by shelling out to the `git` binary
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String, DeployError> {
        debug!("Running git {} in {}", args.join(" "), self.work_dir.display());
        let output = Command::new("git")
            .current_dir(&self.work_dir)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                DeployError::SourceControlError(format!("Failed to run git {}: {}", args.join(" "), e))
            })?;

        if !output.status.success() {
            return Err(DeployError::SourceControlError(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn branch(&self) -> Result<String, DeployError> {
        self.git(&["symbolic-ref", "--short", "HEAD"]).await
    }

    async fn rev_count(&self) -> Result<String, DeployError> {
        self.git(&["rev-list", "--count", "HEAD"]).await
    }

    async fn rev_short(&self) -> Result<String, DeployError> {
        self.git(&["rev-parse", "--short", "HEAD"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_git_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path());
        match git.rev_short().await {
            Err(DeployError::SourceControlError(msg)) => assert!(msg.contains("rev-parse")),
            other => panic!("expected source control error, got {:?}", other),
        }
    }
}
