use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use stawatch_core::{dedup_stations, CoreError, Event, StationId, Timestamp, TransitionEvaluator};

use crate::prober::Prober;
use crate::render::render_event;
use crate::reporter::{log_or_warn, outage_or_warn, Reporter};

/// Runs one probe round over the monitored set and folds the outcomes into
/// the reachability state.
pub struct CycleCoordinator {
    prober: Arc<dyn Prober>,
    reporter: Arc<dyn Reporter>,
    evaluator: TransitionEvaluator,
    max_concurrent: usize,
    cycles: u64,
}

impl CycleCoordinator {
    pub fn new(prober: Arc<dyn Prober>, reporter: Arc<dyn Reporter>, max_concurrent: usize) -> Self {
        Self {
            prober,
            reporter,
            evaluator: TransitionEvaluator::new(),
            max_concurrent: max_concurrent.max(1),
            cycles: 0,
        }
    }

    pub fn evaluator(&self) -> &TransitionEvaluator {
        &self.evaluator
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Probe every station concurrently and wait for all of them.
    ///
    /// Results come back in input order. A probe that errors or panics
    /// counts as unreachable and is reported as a warning.
    pub async fn probe_all(&self, stations: &[StationId]) -> Vec<(StationId, bool)> {
        if stations.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.max_concurrent.min(stations.len())));
        let mut set = JoinSet::new();
        let mut owner = HashMap::with_capacity(stations.len());

        for (idx, station) in stations.iter().enumerate() {
            let prober = Arc::clone(&self.prober);
            let permits = Arc::clone(&permits);
            let station = station.clone();
            let handle = set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = prober.probe(&station).await;
                (idx, outcome)
            });
            owner.insert(handle.id(), idx);
        }

        let mut outcomes = vec![false; stations.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(up))) => outcomes[idx] = up,
                Ok((idx, Err(e))) => {
                    let station = &stations[idx];
                    let error = format!("{e:#}");
                    warn!(station = %station, %error, "probe failed to run");
                    log_or_warn(self.reporter.as_ref(), &format!("Error probing {station}: {error}"));
                }
                Err(join_err) => {
                    let name = owner
                        .get(&join_err.id())
                        .map(|idx| stations[*idx].to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    warn!(station = %name, error = %join_err, "probe task aborted");
                    log_or_warn(self.reporter.as_ref(), &format!("Error probing {name}: {join_err}"));
                }
            }
        }

        stations.iter().cloned().zip(outcomes).collect()
    }

    /// One full cycle: probe, barrier, reconcile, evaluate, report.
    ///
    /// Returns the events in the order they were produced. `CoreError` only
    /// escapes if reconciliation was skipped, which is a bug.
    pub async fn run_cycle(&mut self, stations: &[StationId], t: Timestamp) -> Result<Vec<Event>, CoreError> {
        let stations = dedup_stations(stations.iter().cloned());
        let outcomes = self.probe_all(&stations).await;

        let membership = self.evaluator.reconcile(&stations);
        if self.cycles > 0 {
            for s in &membership.added {
                log_or_warn(self.reporter.as_ref(), &format!("Station {s} added to monitoring."));
            }
            for s in &membership.removed {
                log_or_warn(self.reporter.as_ref(), &format!("Station {s} removed from monitoring."));
            }
        }

        let mut events = Vec::new();
        for (station, up) in &outcomes {
            if let Some(event) = self.evaluator.observe(station, *up, t)? {
                events.push(event);
            }
        }

        for event in &events {
            log_or_warn(self.reporter.as_ref(), &render_event(event));
            if let Some(outage) = event.outage() {
                outage_or_warn(self.reporter.as_ref(), outage);
            }
        }

        self.cycles += 1;
        debug!(cycle = self.cycles, stations = stations.len(), events = events.len(), "cycle complete");
        Ok(events)
    }
}
