// Collection cycle: probe every target concurrently and merge the resulting metric records.
// One task per target; each task has its own error boundary and timeout.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant, timeout};
use tracing::{debug, warn};

use crate::config::{AppConfig, GlobalConfig, TargetConfig};
use crate::coverage::{Granularity, snapshot_streak};
use crate::grouping::{GroupKey, group_snapshots};
use crate::metrics::{Metric, MetricRecord, target_labels};
use crate::models::{GroupBy, Snapshot};
use crate::probe::{ProbeError, RepositoryProbe, StatsMode};

/// Write side of the cycle's output stream, cloned into every target task.
#[derive(Clone)]
pub struct MetricSink(mpsc::UnboundedSender<MetricRecord>);

impl MetricSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MetricRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub fn push(&self, record: MetricRecord) {
        // A closed receiver means the cycle was cancelled; nothing left to report to.
        let _ = self.0.send(record);
    }

    pub fn send(&self, metric: Metric, labels: Vec<(String, String)>, value: f64) {
        self.push(MetricRecord::new(metric, labels, value));
    }
}

pub struct Collector {
    config: Arc<AppConfig>,
    probe: Arc<dyn RepositoryProbe>,
}

impl Collector {
    pub fn new(config: Arc<AppConfig>, probe: Arc<dyn RepositoryProbe>) -> Self {
        Self { config, probe }
    }

    /// Runs one collection cycle over all targets and returns every record produced.
    ///
    /// Waits for all target tasks. Dropping the returned future aborts the tasks still running
    /// (and with them any restic child processes).
    pub async fn collect_all(&self) -> Vec<MetricRecord> {
        let now = Utc::now();
        let started = Instant::now();
        let (sink, mut rx) = MetricSink::channel();
        let limit = Duration::from_secs(self.config.global.target_timeout_secs);

        let mut tasks = JoinSet::new();
        for index in 0..self.config.targets.len() {
            let config = self.config.clone();
            let probe = self.probe.clone();
            let sink = sink.clone();
            tasks.spawn(async move {
                let target = &config.targets[index];
                run_target(probe.as_ref(), target, &config.global, now, limit, &sink).await;
            });
        }
        drop(sink);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, operation = "collect_target", "target task aborted");
            }
        }

        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        debug!(
            targets = self.config.targets.len(),
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection cycle complete"
        );
        records
    }
}

/// Error boundary for one target: a failure or timeout is logged and reported through
/// `restic_target_collect_success`, never propagated to other targets.
async fn run_target(
    probe: &dyn RepositoryProbe,
    target: &TargetConfig,
    global: &GlobalConfig,
    now: DateTime<Utc>,
    limit: Duration,
    sink: &MetricSink,
) {
    let started = Instant::now();
    let success = match timeout(limit, collect_target(probe, target, global, now, sink)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(
                repository = %target.path,
                alias = %target.alias,
                error = %e,
                operation = "collect_target",
                "target collection failed"
            );
            false
        }
        Err(_) => {
            warn!(
                repository = %target.path,
                alias = %target.alias,
                timeout_secs = limit.as_secs(),
                operation = "collect_target",
                "target collection timed out"
            );
            false
        }
    };

    let labels = target_labels(&target.path, &target.alias);
    sink.send(
        Metric::CollectSuccess,
        labels.clone(),
        if success { 1.0 } else { 0.0 },
    );
    sink.send(
        Metric::CollectDuration,
        labels,
        started.elapsed().as_secs_f64(),
    );
}

/// Probes one target and sends its records to `sink`.
///
/// A locked repository degrades only the affected metric: integrity reports 0.5, stats and
/// snapshot metrics are left out. Any other stats or snapshot failure ends the target's cycle;
/// records already sent stay in the output.
pub async fn collect_target(
    probe: &dyn RepositoryProbe,
    target: &TargetConfig,
    global: &GlobalConfig,
    now: DateTime<Utc>,
    sink: &MetricSink,
) -> Result<(), ProbeError> {
    let labels = target_labels(&target.path, &target.alias);

    let integrity = match probe.check_integrity(target).await {
        Ok(()) => 1.0,
        Err(ProbeError::Locked) => 0.5,
        Err(e) => {
            warn!(
                repository = %target.path,
                error = %e,
                operation = "check",
                "integrity check failed"
            );
            0.0
        }
    };
    sink.send(Metric::Integrity, labels.clone(), integrity);

    let stats_metrics = [
        (
            StatsMode::RestoreSize,
            Metric::RestoreSize,
            Metric::RestoreFileCount,
        ),
        (
            StatsMode::FilesByContents,
            Metric::FilesByContentSize,
            Metric::FilesByContentFileCount,
        ),
    ];
    for (mode, size_metric, count_metric) in stats_metrics {
        match probe.stats(target, mode).await {
            Ok(stats) => {
                sink.send(size_metric, labels.clone(), stats.total_size as f64);
                sink.send(count_metric, labels.clone(), stats.total_file_count as f64);
            }
            Err(ProbeError::Locked) => {
                debug!(repository = %target.path, mode = mode.as_arg(), "repository locked; stats skipped");
            }
            Err(e) => return Err(e),
        }
    }

    let snapshots = match probe.list_snapshots(target).await {
        Ok(s) => s,
        Err(ProbeError::Locked) => {
            debug!(repository = %target.path, "repository locked; snapshot metrics skipped");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    sink.send(Metric::TotalSnapshots, labels.clone(), snapshots.len() as f64);

    let group_by = target.effective_group_by(global);
    for (key, group) in group_snapshots(snapshots, group_by) {
        for record in group_records(&labels, &key, group_by, &group, now) {
            sink.push(record);
        }
    }
    Ok(())
}

/// Group snapshot count plus one streak gauge per granularity.
pub fn group_records(
    target_labels: &[(String, String)],
    key: &GroupKey,
    group_by: GroupBy,
    snapshots: &[Snapshot],
    now: DateTime<Utc>,
) -> Vec<MetricRecord> {
    let mut labels = target_labels.to_vec();
    labels.extend(key.labels(group_by));

    let mut out = Vec::with_capacity(1 + Granularity::ALL.len());
    out.push(MetricRecord::new(
        Metric::GroupTotalSnapshots,
        labels.clone(),
        snapshots.len() as f64,
    ));
    for granularity in Granularity::ALL {
        out.push(MetricRecord::new(
            Metric::GroupStreak(granularity),
            labels.clone(),
            snapshot_streak(snapshots, granularity, now) as f64,
        ));
    }
    out
}
