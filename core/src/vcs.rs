use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{DeployError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub commit: String,
    pub branch: String,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Short hash of `HEAD` and the name of the checked out branch.
    async fn revision(&self, dir: &Path) -> Result<Revision>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn capture(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DeployError::ProcessLaunch {
                program: "git".to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::Vcs(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(DeployError::Vcs(format!(
                "git {} returned nothing",
                args.join(" ")
            )));
        }

        Ok(value)
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn revision(&self, dir: &Path) -> Result<Revision> {
        let commit = self.capture(dir, &["rev-parse", "--short", "HEAD"]).await?;
        let branch = self.capture(dir, &["symbolic-ref", "--short", "HEAD"]).await?;

        tracing::debug!(%commit, %branch, "resolved revision");

        Ok(Revision { commit, branch })
    }
}
