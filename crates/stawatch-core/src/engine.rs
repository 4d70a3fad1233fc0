use crate::{
    error::CoreError,
    events::{Event, OutageEvent},
    ids::StationId,
    model::{StationState, Timestamp},
    store::{ReachabilityStore, Reconciliation},
};

/// Pure transition table:
///
/// | prior       | now   | result                                   |
/// |-------------|-------|------------------------------------------|
/// | reachable   | up    | unchanged, no event                      |
/// | reachable   | down  | `Unreachable { since: t }`, OutageStarted |
/// | unreachable | up    | `Reachable`, Recovered(outage)           |
/// | unreachable | down  | unchanged, StillUnreachable              |
pub fn transition(
    station: &StationId,
    prior: StationState,
    reachable_now: bool,
    t: Timestamp,
) -> (StationState, Option<Event>) {
    match (prior, reachable_now) {
        (StationState::Reachable, true) => (prior, None),
        (StationState::Reachable, false) => (
            StationState::Unreachable { since: t },
            Some(Event::OutageStarted {
                station: station.clone(),
                at: t,
            }),
        ),
        (StationState::Unreachable { since }, true) => (
            StationState::Reachable,
            Some(Event::Recovered(OutageEvent::between(station.clone(), since, t))),
        ),
        (StationState::Unreachable { since }, false) => (
            prior,
            Some(Event::StillUnreachable {
                station: station.clone(),
                since,
            }),
        ),
    }
}

/// Owns the reachability store and applies probe outcomes to it.
#[derive(Debug, Default)]
pub struct TransitionEvaluator {
    store: ReachabilityStore,
}

impl TransitionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view for reporting.
    pub fn store(&self) -> &ReachabilityStore {
        &self.store
    }

    pub fn reconcile(&mut self, monitored: &[StationId]) -> Reconciliation {
        self.store.reconcile(monitored)
    }

    /// Fold one probe outcome into the station's state.
    pub fn observe(
        &mut self,
        station: &StationId,
        reachable_now: bool,
        t: Timestamp,
    ) -> Result<Option<Event>, CoreError> {
        let prior = self.store.get(station)?;
        let (next, event) = transition(station, prior, reachable_now, t);
        if next != prior {
            self.store.set(station, next)?;
        }
        Ok(event)
    }
}
