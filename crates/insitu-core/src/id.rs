//! Strongly-typed identifiers for grids and ranks.

use std::fmt;

/// Identifies a grid across the whole distributed run.
///
/// Grid ids are assigned by the simulation and are unique process-wide.
/// Only grids owned by the current rank ever appear in the
/// [`LocalGridTable`](crate::LocalGridTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub i64);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GridId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Identifies the current process within the distributed run.
///
/// Used only for diagnostics; this crate never routes requests to other
/// ranks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub i32);

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Rank {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
