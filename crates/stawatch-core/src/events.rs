use chrono::TimeDelta;

use crate::{ids::StationId, model::Timestamp};

/// One closed outage. Produced exactly once, on recovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutageEvent {
    pub station: StationId,
    pub start: Timestamp,
    pub end: Timestamp,
    /// `end - start`. Negative if the wall clock went backwards mid-outage.
    pub duration: TimeDelta,
}

impl OutageEvent {
    pub fn between(station: StationId, start: Timestamp, end: Timestamp) -> Self {
        Self {
            station,
            start,
            end,
            duration: end - start,
        }
    }
}

/// What the evaluator has to say about a single probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Informational: the station just went down. No duration yet.
    OutageStarted { station: StationId, at: Timestamp },
    /// Informational: the station is still down.
    StillUnreachable { station: StationId, since: Timestamp },
    /// The station came back; carries the closed outage.
    Recovered(OutageEvent),
}

impl Event {
    pub fn station(&self) -> &StationId {
        match self {
            Event::OutageStarted { station, .. } | Event::StillUnreachable { station, .. } => station,
            Event::Recovered(outage) => &outage.station,
        }
    }

    pub fn outage(&self) -> Option<&OutageEvent> {
        match self {
            Event::Recovered(outage) => Some(outage),
            _ => None,
        }
    }
}
