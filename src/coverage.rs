// Coverage streaks: consecutive fixed-width buckets, walking back from `now`, that hold a snapshot.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::Snapshot;

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(24 * 3600);

/// Bucket widths reported per snapshot group. Months and years are fixed 30 and 365 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Hours,
        Granularity::Days,
        Granularity::Weeks,
        Granularity::Months,
        Granularity::Years,
    ];

    pub fn width(self) -> Duration {
        match self {
            Granularity::Hours => HOUR,
            Granularity::Days => DAY,
            Granularity::Weeks => DAY * 7,
            Granularity::Months => DAY * 30,
            Granularity::Years => DAY * 365,
        }
    }

    /// Plural unit name as used in metric names (`restic_group_days_with_snapshots`).
    pub fn label(self) -> &'static str {
        match self {
            Granularity::Hours => "hours",
            Granularity::Days => "days",
            Granularity::Weeks => "weeks",
            Granularity::Months => "months",
            Granularity::Years => "years",
        }
    }
}

/// Index of the bucket holding `time`, where bucket `i` is `[now - (i+1)*width, now - i*width)`.
/// `None` for instants at or after `now`.
fn bucket_index(time: DateTime<Utc>, now: DateTime<Utc>, width_ns: i128) -> Option<u64> {
    if time >= now {
        return None;
    }
    let age = now - time;
    let age_ns = age
        .num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(age.num_seconds()) * 1_000_000_000);
    // age_ns > 0, so an age of exactly k*width falls into bucket k-1 (start is inclusive).
    u64::try_from((age_ns - 1) / width_ns).ok()
}

/// Number of consecutive populated buckets counted back from `now`, stopping at the first
/// empty one.
///
/// Each timestamp is mapped to its bucket index once; the streak is the length of the run
/// `0, 1, 2, ...` in the sorted, deduplicated indices. The result never exceeds the number of
/// timestamps, so no scan of empty history takes place.
pub fn count_streak<I>(timestamps: I, width: Duration, now: DateTime<Utc>) -> u64
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let width_ns = width.as_nanos() as i128;
    if width_ns == 0 {
        return 0;
    }

    let mut indices: Vec<u64> = timestamps
        .into_iter()
        .filter_map(|t| bucket_index(t, now, width_ns))
        .collect();
    indices.sort_unstable();
    indices.dedup();

    indices
        .iter()
        .enumerate()
        .take_while(|&(expected, &idx)| idx == expected as u64)
        .count() as u64
}

/// [`count_streak`] over a snapshot group.
pub fn snapshot_streak(
    snapshots: &[Snapshot],
    granularity: Granularity,
    now: DateTime<Utc>,
) -> u64 {
    count_streak(snapshots.iter().map(|s| s.time), granularity.width(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn bucket_start_is_inclusive_end_exclusive() {
        let width = HOUR.as_nanos() as i128;
        let n = now();
        assert_eq!(bucket_index(n, n, width), None);
        assert_eq!(
            bucket_index(n - chrono::Duration::nanoseconds(1), n, width),
            Some(0)
        );
        assert_eq!(bucket_index(n - chrono::Duration::hours(1), n, width), Some(0));
        assert_eq!(
            bucket_index(
                n - chrono::Duration::hours(1) - chrono::Duration::nanoseconds(1),
                n,
                width
            ),
            Some(1)
        );
    }

    #[test]
    fn zero_width_is_zero() {
        let n = now();
        assert_eq!(
            count_streak([n - chrono::Duration::minutes(1)], Duration::ZERO, n),
            0
        );
    }

    #[test]
    fn granularity_widths() {
        assert_eq!(Granularity::Weeks.width(), Duration::from_secs(7 * 86_400));
        assert_eq!(Granularity::Months.width(), Duration::from_secs(30 * 86_400));
        assert_eq!(Granularity::Years.width(), Duration::from_secs(365 * 86_400));
        assert_eq!(Granularity::ALL.len(), 5);
    }
}
