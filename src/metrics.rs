// Metric records produced by a collection cycle and their Prometheus text encoding

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::coverage::Granularity;

const TARGET_LABELS: &[&str] = &["repository", "alias"];
const GROUP_LABELS: &[&str] = &["repository", "alias", "host", "paths", "tags"];

/// Every gauge the exporter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Integrity,
    TotalSnapshots,
    RestoreSize,
    RestoreFileCount,
    FilesByContentSize,
    FilesByContentFileCount,
    GroupTotalSnapshots,
    GroupStreak(Granularity),
    CollectSuccess,
    CollectDuration,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Integrity => "restic_repository_integrity",
            Metric::TotalSnapshots => "restic_repository_total_snapshots",
            Metric::RestoreSize => "restic_repository_restore_size",
            Metric::RestoreFileCount => "restic_repository_restore_file_count",
            Metric::FilesByContentSize => "restic_repository_files_by_content_size",
            Metric::FilesByContentFileCount => "restic_repository_files_by_content_file_count",
            Metric::GroupTotalSnapshots => "restic_group_total_snapshots",
            Metric::GroupStreak(g) => match g {
                Granularity::Hours => "restic_group_hours_with_snapshots",
                Granularity::Days => "restic_group_days_with_snapshots",
                Granularity::Weeks => "restic_group_weeks_with_snapshots",
                Granularity::Months => "restic_group_months_with_snapshots",
                Granularity::Years => "restic_group_years_with_snapshots",
            },
            Metric::CollectSuccess => "restic_target_collect_success",
            Metric::CollectDuration => "restic_target_collect_duration_seconds",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Metric::Integrity => {
                "Result of restic check (1 = healthy, 0 = failed, 0.5 = repository locked)."
            }
            Metric::TotalSnapshots => "The number of snapshots in this repository.",
            Metric::RestoreSize => "The restore size in bytes.",
            Metric::RestoreFileCount => "The number of files in restore-size mode.",
            Metric::FilesByContentSize => "The size in bytes of unique file contents.",
            Metric::FilesByContentFileCount => "The number of files in files-by-contents mode.",
            Metric::GroupTotalSnapshots => "The number of snapshots in this snapshot group.",
            Metric::GroupStreak(g) => match g {
                Granularity::Hours => {
                    "Consecutive hours, counted back from now, with at least one snapshot."
                }
                Granularity::Days => {
                    "Consecutive days, counted back from now, with at least one snapshot."
                }
                Granularity::Weeks => {
                    "Consecutive 7-day periods, counted back from now, with at least one snapshot."
                }
                Granularity::Months => {
                    "Consecutive 30-day periods, counted back from now, with at least one snapshot."
                }
                Granularity::Years => {
                    "Consecutive 365-day periods, counted back from now, with at least one snapshot."
                }
            },
            Metric::CollectSuccess => {
                "Whether the last collection of this target completed (1) or failed/timed out (0)."
            }
            Metric::CollectDuration => "Wall time spent collecting this target.",
        }
    }

    /// Group metrics always carry all three dimension labels; unselected ones are empty, which
    /// Prometheus treats as absent.
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Metric::GroupTotalSnapshots | Metric::GroupStreak(_) => GROUP_LABELS,
            _ => TARGET_LABELS,
        }
    }
}

/// One gauge sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub metric: Metric,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl MetricRecord {
    pub fn new(metric: Metric, labels: Vec<(String, String)>, value: f64) -> Self {
        Self {
            metric,
            labels,
            value,
        }
    }

    /// Value of label `name`, or `""` when the record does not carry it.
    pub fn label(&self, name: &str) -> &str {
        self.labels
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

/// Label pairs identifying a target (`repository`, `alias`).
pub fn target_labels(path: &str, alias: &str) -> Vec<(String, String)> {
    vec![
        ("repository".to_string(), path.to_string()),
        ("alias".to_string(), alias.to_string()),
    ]
}

/// Encodes records in the Prometheus text exposition format.
///
/// A fresh registry is built per call; the exporter keeps no metric state between scrapes.
/// A record whose metric and label values repeat an earlier record is dropped with a warning;
/// the first value wins.
pub fn encode_text(records: &[MetricRecord]) -> prometheus::Result<Vec<u8>> {
    let registry = Registry::new();
    let mut families: HashMap<Metric, GaugeVec> = HashMap::new();
    let mut written: HashSet<(Metric, Vec<&str>)> = HashSet::new();

    for record in records {
        let gauge_vec = match families.entry(record.metric) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let v = GaugeVec::new(
                    Opts::new(record.metric.name(), record.metric.help()),
                    record.metric.label_names(),
                )?;
                registry.register(Box::new(v.clone()))?;
                e.insert(v)
            }
        };
        let values: Vec<&str> = record
            .metric
            .label_names()
            .iter()
            .map(|name| record.label(name))
            .collect();
        if !written.insert((record.metric, values.clone())) {
            warn!(
                metric = record.metric.name(),
                labels = ?values,
                "duplicate series dropped"
            );
            continue;
        }
        gauge_vec
            .get_metric_with_label_values(&values)?
            .set(record.value);
    }

    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    Ok(buf)
}
