// Snapshot and repository statistics as reported by `restic ... --json`

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One backup point-in-time. Field names follow restic's `snapshots --json` output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub paths: Vec<String>,
    /// restic omits the field entirely when a snapshot has no tags.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub tree: String,
}

impl Snapshot {
    /// Snapshot with only the fields the grouping and coverage engines look at.
    pub fn new(
        time: DateTime<Utc>,
        hostname: impl Into<String>,
        paths: Vec<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            time,
            hostname: hostname.into(),
            paths,
            tags,
            id: String::new(),
            short_id: String::new(),
            username: String::new(),
            tree: String::new(),
        }
    }
}

/// Output of `restic stats --json` in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct RepoStats {
    pub total_size: u64,
    pub total_file_count: u64,
}
