use serde::Serialize;
use std::collections::BTreeMap;

use stawatch_core::{Event, OutageEvent, ReachabilityStore, Timestamp};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OutageRecord {
    pub station: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_secs: i64,
}

impl From<&OutageEvent> for OutageRecord {
    fn from(o: &OutageEvent) -> Self {
        Self {
            station: o.station.to_string(),
            start: o.start,
            end: o.end,
            duration_secs: o.duration.num_seconds(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OpenOutage {
    pub station: String,
    pub since: Timestamp,
}

/// What a finished monitoring run observed.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub stopped_early: bool,
    pub outages: Vec<OutageRecord>,
    /// Outages still open when the run ended; they are never closed.
    pub still_unreachable: Vec<OpenOutage>,
}

impl RunSummary {
    pub fn record_events(&mut self, events: &[Event]) {
        self.outages
            .extend(events.iter().filter_map(Event::outage).map(OutageRecord::from));
    }

    pub fn close(&mut self, store: &ReachabilityStore) {
        self.still_unreachable = store
            .unreachable()
            .into_iter()
            .map(|(station, since)| OpenOutage {
                station: station.to_string(),
                since,
            })
            .collect();
    }

    /// Total closed-outage time per station, in seconds.
    pub fn downtime_by_station(&self) -> BTreeMap<&str, i64> {
        let mut out = BTreeMap::new();
        for o in &self.outages {
            *out.entry(o.station.as_str()).or_insert(0) += o.duration_secs;
        }
        out
    }
}
