// Grouping dimensions: which snapshot fields define group identity

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single selectable grouping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Host,
    Paths,
    Tags,
}

/// Set of selected dimensions. The empty set puts every snapshot in one group.
///
/// In config files this is a list: `group_by = ["host", "paths"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupBy {
    pub host: bool,
    pub paths: bool,
    pub tags: bool,
}

impl GroupBy {
    pub const NONE: GroupBy = GroupBy {
        host: false,
        paths: false,
        tags: false,
    };

    pub fn from_dimensions(dims: impl IntoIterator<Item = Dimension>) -> Self {
        let mut out = Self::NONE;
        for d in dims {
            match d {
                Dimension::Host => out.host = true,
                Dimension::Paths => out.paths = true,
                Dimension::Tags => out.tags = true,
            }
        }
        out
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        let mut out = Vec::with_capacity(3);
        if self.host {
            out.push(Dimension::Host);
        }
        if self.paths {
            out.push(Dimension::Paths);
        }
        if self.tags {
            out.push(Dimension::Tags);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        !(self.host || self.paths || self.tags)
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self
            .dimensions()
            .into_iter()
            .map(|d| match d {
                Dimension::Host => "host",
                Dimension::Paths => "paths",
                Dimension::Tags => "tags",
            })
            .collect();
        f.write_str(&names.join(","))
    }
}

impl<'de> Deserialize<'de> for GroupBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dims = Vec::<Dimension>::deserialize(deserializer)?;
        Ok(Self::from_dimensions(dims))
    }
}

impl Serialize for GroupBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.dimensions().serialize(serializer)
    }
}
