// Repository probes: integrity check, stats and snapshot listing against a backup repository

mod restic;

pub use restic::{LOCKED_MARKER, ResticProbe, classify_output};

use async_trait::async_trait;

use crate::config::TargetConfig;
use crate::models::{RepoStats, Snapshot};

/// `restic stats --mode` values the exporter reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsMode {
    RestoreSize,
    FilesByContents,
}

impl StatsMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            StatsMode::RestoreSize => "restore-size",
            StatsMode::FilesByContents => "files-by-contents",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Another process holds the repository lock. Not a failure of the repository itself.
    #[error("repository is locked")]
    Locked,
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} exited with {status}: {output}")]
    Failed {
        operation: &'static str,
        status: String,
        output: String,
    },
    #[error("could not decode {operation} output: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProbeError {
    pub fn is_locked(&self) -> bool {
        matches!(self, ProbeError::Locked)
    }
}

/// Queries against one backup repository. Implementations may block for a long time; the
/// collector bounds each target with a timeout and drops the future on cancellation.
#[async_trait]
pub trait RepositoryProbe: Send + Sync {
    async fn check_integrity(&self, target: &TargetConfig) -> Result<(), ProbeError>;

    async fn stats(&self, target: &TargetConfig, mode: StatsMode) -> Result<RepoStats, ProbeError>;

    async fn list_snapshots(&self, target: &TargetConfig) -> Result<Vec<Snapshot>, ProbeError>;
}
