use std::collections::{BTreeMap, HashSet};

use crate::{error::CoreError, ids::StationId, model::StationState, model::Timestamp};

/// Per-station reachability state.
///
/// Not synchronized: the evaluator owns it and only the coordinating task
/// touches the evaluator.
#[derive(Clone, Debug, Default)]
pub struct ReachabilityStore {
    states: BTreeMap<StationId, StationState>,
}

/// Membership changes applied by [`ReachabilityStore::reconcile`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<StationId>,
    pub removed: Vec<StationId>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl ReachabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a station as reachable if it has no entry. Returns true when an
    /// entry was created.
    pub fn ensure(&mut self, station: &StationId) -> bool {
        if self.states.contains_key(station) {
            return false;
        }
        self.states.insert(station.clone(), StationState::Reachable);
        true
    }

    /// Forget a station. Re-adding it later starts from a clean slate, even
    /// if it was down when removed.
    pub fn remove(&mut self, station: &StationId) -> bool {
        self.states.remove(station).is_some()
    }

    pub fn get(&self, station: &StationId) -> Result<StationState, CoreError> {
        self.states
            .get(station)
            .copied()
            .ok_or_else(|| CoreError::UnknownStation(station.clone()))
    }

    pub fn set(&mut self, station: &StationId, state: StationState) -> Result<(), CoreError> {
        match self.states.get_mut(station) {
            Some(slot) => {
                *slot = state;
                Ok(())
            }
            None => Err(CoreError::UnknownStation(station.clone())),
        }
    }

    /// Make membership match `monitored` exactly.
    pub fn reconcile(&mut self, monitored: &[StationId]) -> Reconciliation {
        let wanted: HashSet<&StationId> = monitored.iter().collect();

        let removed: Vec<StationId> = self
            .states
            .keys()
            .filter(|s| !wanted.contains(s))
            .cloned()
            .collect();
        for s in &removed {
            self.states.remove(s);
        }

        let mut added = Vec::new();
        for s in monitored {
            if self.ensure(s) {
                added.push(s.clone());
            }
        }

        Reconciliation { added, removed }
    }

    pub fn contains(&self, station: &StationId) -> bool {
        self.states.contains_key(station)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Entries ordered by station id.
    pub fn iter(&self) -> impl Iterator<Item = (&StationId, &StationState)> {
        self.states.iter()
    }

    /// Stations currently down, with the start of their open outage.
    pub fn unreachable(&self) -> Vec<(StationId, Timestamp)> {
        self.states
            .iter()
            .filter_map(|(id, st)| st.unreachable_since().map(|since| (id.clone(), since)))
            .collect()
    }
}
