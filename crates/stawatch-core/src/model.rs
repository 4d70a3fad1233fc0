use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observation timestamps used throughout the core.
pub type Timestamp = DateTime<Utc>;

/// Reachability classification of one station.
///
/// The outage start lives inside the `Unreachable` variant, so a reachable
/// station can never carry a stale `unreachable_since`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StationState {
    /// Assumed state for a station until a probe says otherwise.
    #[default]
    Reachable,
    Unreachable {
        since: Timestamp,
    },
}

impl StationState {
    pub fn reachable(&self) -> bool {
        matches!(self, StationState::Reachable)
    }

    pub fn unreachable_since(&self) -> Option<Timestamp> {
        match self {
            StationState::Reachable => None,
            StationState::Unreachable { since } => Some(*since),
        }
    }
}
