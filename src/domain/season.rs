//! Season dataset wire types.
//!
//! These are the shapes the dataset API serves. A `SeasonDataset` is created
//! once by the fetch stage's parse step and never mutated afterwards; every
//! transformation downstream produces new values.

use serde::{Deserialize, Serialize};

/// Numeric code naming a player's role specialization.
///
/// Deserialization is strict: only JSON numbers are accepted, so a
/// non-numeric spec id fails the containing payload rather than being
/// silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecId(pub u32);

impl std::fmt::Display for SpecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpecId {
    fn from(id: u32) -> Self {
        SpecId(id)
    }
}

/// One participant in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub spec: SpecId,
}

impl Member {
    pub fn new(spec: impl Into<SpecId>) -> Self {
        Self { spec: spec.into() }
    }
}

/// One completed competitive run. `members` is required; a run without it
/// is malformed and fails the containing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub members: Vec<Member>,
}

impl Run {
    pub fn new(specs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            members: specs.into_iter().map(Member::new).collect(),
        }
    }
}

/// The full set of run records for one competitive period, plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDataset {
    pub season_id: u32,
    pub season_name: String,
    /// Major content-version grouping under which seasons are nested
    pub expansion: String,
    pub patch: String,
    pub keys_count: u64,
    /// Run records in API order
    pub data: Vec<Run>,
}
