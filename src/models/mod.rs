// Domain models

mod group_by;
mod snapshot;

pub use group_by::{Dimension, GroupBy};
pub use snapshot::{RepoStats, Snapshot};
