// restic CLI adapter: runs `restic -r <repo> ... --no-lock` and decodes its JSON output

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::instrument;

use super::{ProbeError, RepositoryProbe, StatsMode};
use crate::config::TargetConfig;
use crate::models::{RepoStats, Snapshot};

/// Substring restic prints when another process holds an exclusive lock.
pub const LOCKED_MARKER: &str = "repository is already locked";

pub struct ResticProbe {
    binary: String,
}

impl ResticProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, target: &TargetConfig, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-r")
            .arg(&target.path)
            .args(args)
            .arg("--no-lock")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env_remove("RESTIC_PASSWORD")
            .env_remove("RESTIC_PASSWORD_FILE");
        if let Some(password) = &target.password {
            cmd.env("RESTIC_PASSWORD", password);
        }
        if let Some(file) = &target.password_file {
            cmd.env("RESTIC_PASSWORD_FILE", file);
        }
        cmd
    }

    async fn run(
        &self,
        operation: &'static str,
        target: &TargetConfig,
        args: &[&str],
    ) -> Result<Vec<u8>, ProbeError> {
        let output = self
            .command(target, args)
            .output()
            .await
            .map_err(|source| ProbeError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        classify_output(operation, output)
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &TargetConfig,
        args: &[&str],
    ) -> Result<T, ProbeError> {
        let stdout = self.run(operation, target, args).await?;
        serde_json::from_slice(&stdout).map_err(|source| ProbeError::Decode { operation, source })
    }
}

/// Maps a finished restic process to its stdout, [`ProbeError::Locked`] or
/// [`ProbeError::Failed`]. The lock marker may appear on either stream.
pub fn classify_output(operation: &'static str, output: Output) -> Result<Vec<u8>, ProbeError> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stdout.contains(LOCKED_MARKER) || stderr.contains(LOCKED_MARKER) {
        return Err(ProbeError::Locked);
    }
    Err(ProbeError::Failed {
        operation,
        status: output.status.to_string(),
        output: format!("{}{}", stdout, stderr).trim().to_string(),
    })
}

#[async_trait]
impl RepositoryProbe for ResticProbe {
    #[instrument(skip(self, target), fields(probe = "restic", operation = "check", repository = %target.path))]
    async fn check_integrity(&self, target: &TargetConfig) -> Result<(), ProbeError> {
        self.run("check", target, &["check"]).await.map(|_| ())
    }

    #[instrument(skip(self, target), fields(probe = "restic", operation = "stats", repository = %target.path))]
    async fn stats(&self, target: &TargetConfig, mode: StatsMode) -> Result<RepoStats, ProbeError> {
        self.run_json("stats", target, &["stats", "--mode", mode.as_arg(), "--json"])
            .await
    }

    #[instrument(skip(self, target), fields(probe = "restic", operation = "snapshots", repository = %target.path))]
    async fn list_snapshots(&self, target: &TargetConfig) -> Result<Vec<Snapshot>, ProbeError> {
        self.run_json("snapshots", target, &["snapshots", "--json"])
            .await
    }
}
