use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a monitored station (address or hostname).
///
/// Equality is exact string match; no normalization happens here. Operator
/// input is trimmed by [`StationId::parse`] before it reaches the core.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Trim operator input; `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Collapse duplicates, keeping the first occurrence of each id.
pub fn dedup_stations<I>(stations: I) -> Vec<StationId>
where
    I: IntoIterator<Item = StationId>,
{
    let mut seen = std::collections::HashSet::new();
    stations
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
