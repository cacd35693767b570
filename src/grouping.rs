// Snapshot grouping: partition a snapshot list by a composite key of selected dimensions.

use std::collections::BTreeMap;

use crate::models::{GroupBy, Snapshot};

/// Identity of a snapshot group. Unselected dimensions are left empty; paths and tags are
/// sorted so their original order never affects equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GroupKey {
    pub hostname: String,
    pub paths: Vec<String>,
    pub tags: Vec<String>,
}

impl GroupKey {
    /// Projects `snapshot` onto the dimensions in `group_by`. The snapshot itself is not touched.
    pub fn for_snapshot(snapshot: &Snapshot, group_by: GroupBy) -> Self {
        let hostname = if group_by.host {
            snapshot.hostname.clone()
        } else {
            String::new()
        };
        let paths = if group_by.paths {
            sorted(&snapshot.paths)
        } else {
            Vec::new()
        };
        let tags = if group_by.tags {
            sorted(&snapshot.tags)
        } else {
            Vec::new()
        };
        Self {
            hostname,
            paths,
            tags,
        }
    }

    /// Metric labels for this group: one pair per selected dimension, in host/paths/tags order.
    /// Paths and tags are joined with `,`; a `,` or `\` inside an element is backslash-escaped so
    /// distinct keys never share a label set.
    pub fn labels(&self, group_by: GroupBy) -> Vec<(String, String)> {
        let mut labels = Vec::with_capacity(3);
        if group_by.host {
            labels.push(("host".to_string(), self.hostname.clone()));
        }
        if group_by.paths {
            labels.push(("paths".to_string(), join_escaped(&self.paths)));
        }
        if group_by.tags {
            labels.push(("tags".to_string(), join_escaped(&self.tags)));
        }
        labels
    }
}

fn join_escaped(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.replace('\\', "\\\\").replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(",")
}

fn sorted(values: &[String]) -> Vec<String> {
    let mut v = values.to_vec();
    v.sort();
    v
}

/// Groups keyed by [`GroupKey`], ordered by key so output is deterministic.
pub type SnapshotGroups = BTreeMap<GroupKey, Vec<Snapshot>>;

/// Partitions `snapshots` by the dimensions in `group_by`.
///
/// Every snapshot lands in exactly one group and input order is kept within a group. With no
/// dimensions selected, a non-empty input yields a single group under the default key.
pub fn group_snapshots(snapshots: Vec<Snapshot>, group_by: GroupBy) -> SnapshotGroups {
    let mut groups = SnapshotGroups::new();
    for snapshot in snapshots {
        let key = GroupKey::for_snapshot(&snapshot, group_by);
        groups.entry(key).or_default().push(snapshot);
    }
    groups
}
