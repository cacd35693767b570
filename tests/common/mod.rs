// Shared test helpers: snapshot builders and a scripted RepositoryProbe

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use restic_exporter::config::TargetConfig;
use restic_exporter::metrics::{Metric, MetricRecord};
use restic_exporter::models::{GroupBy, RepoStats, Snapshot};
use restic_exporter::probe::{ProbeError, RepositoryProbe, StatsMode};
use std::collections::HashMap;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn snapshot(time: DateTime<Utc>, host: &str, paths: &[&str], tags: &[&str]) -> Snapshot {
    Snapshot::new(
        time,
        host,
        paths.iter().map(|s| s.to_string()).collect(),
        tags.iter().map(|s| s.to_string()).collect(),
    )
}

/// Snapshot `age` before `fixed_now()` on host "alpha" backing up `/home`.
pub fn snapshot_aged(age: Duration) -> Snapshot {
    snapshot(fixed_now() - age, "alpha", &["/home"], &[])
}

pub fn target(path: &str, alias: &str) -> TargetConfig {
    TargetConfig {
        alias: alias.to_string(),
        path: path.to_string(),
        password: Some("secret".to_string()),
        password_file: None,
        group_by: None,
    }
}

pub fn target_grouped(path: &str, alias: &str, group_by: GroupBy) -> TargetConfig {
    TargetConfig {
        group_by: Some(group_by),
        ..target(path, alias)
    }
}

#[derive(Clone, Debug)]
pub enum Outcome<T> {
    Ok(T),
    Locked,
    Fail,
    /// Exits cleanly but prints output that is not JSON.
    Garbled,
    /// Never completes in practice (sleeps an hour).
    Hang,
}

impl<T: Clone> Outcome<T> {
    async fn resolve(&self, operation: &'static str) -> Result<T, ProbeError> {
        match self {
            Outcome::Ok(v) => Ok(v.clone()),
            Outcome::Locked => Err(ProbeError::Locked),
            Outcome::Fail => Err(ProbeError::Failed {
                operation,
                status: "exit status: 1".to_string(),
                output: "Fatal: unable to open repository".to_string(),
            }),
            Outcome::Garbled => Err(ProbeError::Decode {
                operation,
                source: serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
            }),
            Outcome::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Err(ProbeError::Failed {
                    operation,
                    status: "killed".to_string(),
                    output: String::new(),
                })
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct FakeRepo {
    pub integrity: Outcome<()>,
    pub restore_size: Outcome<RepoStats>,
    pub files_by_contents: Outcome<RepoStats>,
    pub snapshots: Outcome<Vec<Snapshot>>,
}

impl FakeRepo {
    pub fn healthy(snapshots: Vec<Snapshot>) -> Self {
        Self {
            integrity: Outcome::Ok(()),
            restore_size: Outcome::Ok(RepoStats {
                total_size: 2048,
                total_file_count: 20,
            }),
            files_by_contents: Outcome::Ok(RepoStats {
                total_size: 1024,
                total_file_count: 10,
            }),
            snapshots: Outcome::Ok(snapshots),
        }
    }
}

/// Probe answering from a table keyed by repository path.
#[derive(Default)]
pub struct FakeProbe {
    repos: HashMap<String, FakeRepo>,
}

impl FakeProbe {
    pub fn with(mut self, path: &str, repo: FakeRepo) -> Self {
        self.repos.insert(path.to_string(), repo);
        self
    }

    fn repo(&self, target: &TargetConfig) -> &FakeRepo {
        self.repos
            .get(&target.path)
            .unwrap_or_else(|| panic!("no fake repo for {}", target.path))
    }
}

#[async_trait]
impl RepositoryProbe for FakeProbe {
    async fn check_integrity(&self, target: &TargetConfig) -> Result<(), ProbeError> {
        self.repo(target).integrity.resolve("check").await
    }

    async fn stats(&self, target: &TargetConfig, mode: StatsMode) -> Result<RepoStats, ProbeError> {
        let repo = self.repo(target);
        match mode {
            StatsMode::RestoreSize => repo.restore_size.resolve("stats").await,
            StatsMode::FilesByContents => repo.files_by_contents.resolve("stats").await,
        }
    }

    async fn list_snapshots(&self, target: &TargetConfig) -> Result<Vec<Snapshot>, ProbeError> {
        self.repo(target).snapshots.resolve("snapshots").await
    }
}

/// Records of `metric` for repository `path`.
pub fn find<'a>(records: &'a [MetricRecord], metric: Metric, path: &str) -> Vec<&'a MetricRecord> {
    records
        .iter()
        .filter(|r| r.metric == metric && r.label("repository") == path)
        .collect()
}

/// Value of the single `metric` record for `path`; panics if absent or duplicated.
pub fn value(records: &[MetricRecord], metric: Metric, path: &str) -> f64 {
    let found = find(records, metric, path);
    assert_eq!(
        found.len(),
        1,
        "expected one {} for {}, got {:?}",
        metric.name(),
        path,
        found
    );
    found[0].value
}
