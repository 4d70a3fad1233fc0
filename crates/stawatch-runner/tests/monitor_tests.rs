//! Integration tests for the cycle coordinator and the monitor loop.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use stawatch_core::{Event, OutageEvent, StationId, Timestamp};
use stawatch_runner::{
    wait_for_shutdown, Clock, CycleCoordinator, ManualClock, MemoryReporter, Monitor, MonitorSettings, Prober,
    Reporter, TargetSource,
};
use tokio::sync::oneshot;

/// Replays a fixed outcome script per station; reachable once exhausted.
#[derive(Default)]
struct ScriptedProber {
    script: Mutex<HashMap<String, VecDeque<bool>>>,
}

impl ScriptedProber {
    fn with(station: &str, outcomes: &[bool]) -> Self {
        let p = Self::default();
        p.script
            .lock()
            .unwrap()
            .insert(station.to_string(), outcomes.iter().copied().collect());
        p
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, station: &StationId) -> anyhow::Result<bool> {
        let mut script = self.script.lock().unwrap();
        Ok(script
            .get_mut(station.as_str())
            .and_then(|q| q.pop_front())
            .unwrap_or(true))
    }
}

/// Wall time that follows tokio's (pausable) clock.
struct TokioClock {
    base: Timestamp,
    origin: tokio::time::Instant,
}

impl TokioClock {
    fn new(base: Timestamp) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let elapsed = tokio::time::Instant::now() - self.origin;
        self.base + TimeDelta::from_std(elapsed).unwrap()
    }
}

fn base() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 9, 1, 6, 0, 0).unwrap()
}

fn settings(interval_secs: u64, duration_secs: u64) -> MonitorSettings {
    MonitorSettings {
        interval: Duration::from_secs(interval_secs),
        duration: Duration::from_secs(duration_secs),
        max_concurrent_probes: 8,
    }
}

#[tokio::test]
async fn outage_closed_once_at_third_cycle() {
    let sta = StationId::from("10.0.0.1");
    let reporter = Arc::new(MemoryReporter::new());
    let prober = Arc::new(ScriptedProber::with("10.0.0.1", &[false, false, true]));
    let mut coord = CycleCoordinator::new(prober, reporter.clone(), 4);
    let clock = ManualClock::new(base());
    let set = vec![sta.clone()];

    let c1 = coord.run_cycle(&set, clock.now()).await.unwrap();
    clock.advance(TimeDelta::seconds(5));
    let c2 = coord.run_cycle(&set, clock.now()).await.unwrap();
    clock.advance(TimeDelta::seconds(7));
    let c3 = coord.run_cycle(&set, clock.now()).await.unwrap();

    assert!(c1.iter().all(|e| e.outage().is_none()));
    assert!(c2.iter().all(|e| e.outage().is_none()));
    assert_eq!(
        c3,
        vec![Event::Recovered(OutageEvent::between(
            sta,
            base(),
            base() + TimeDelta::seconds(12)
        ))]
    );

    let outages = reporter.outages();
    assert_eq!(outages.len(), 1);
    assert_eq!(outages[0].duration, TimeDelta::seconds(12));
    assert_eq!(
        reporter.lines().last().unwrap(),
        "STA 10.0.0.1 reconnected after being down for 0:00:12."
    );
}

/// Completes in reverse order of dispatch; up iff the last octet is even.
struct StaggeredProber {
    count: u64,
}

#[async_trait]
impl Prober for StaggeredProber {
    async fn probe(&self, station: &StationId) -> anyhow::Result<bool> {
        let n: u64 = station
            .as_str()
            .rsplit('.')
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("bad test station {station}"))?;
        tokio::time::sleep(Duration::from_millis((self.count - n) * 3)).await;
        Ok(n % 2 == 0)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn outcomes_stay_with_their_station() {
    let count = 16;
    let stations: Vec<StationId> = (0..count).map(|i| StationId::new(format!("10.1.0.{i}"))).collect();
    let coord = CycleCoordinator::new(
        Arc::new(StaggeredProber { count }),
        Arc::new(MemoryReporter::new()),
        16,
    );

    let out = coord.probe_all(&stations).await;
    assert_eq!(out.len(), stations.len());
    for (i, (station, up)) in out.iter().enumerate() {
        assert_eq!(station, &stations[i]);
        assert_eq!(*up, i % 2 == 0, "wrong outcome for {station}");
    }
}

#[tokio::test(start_paused = true)]
async fn monitor_runs_until_budget_is_spent() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut monitor = Monitor::new(
        Arc::new(ScriptedProber::with("sta-1", &[false, false, true])),
        reporter.clone(),
        Arc::new(TokioClock::new(base())),
        TargetSource::from_list(["sta-1", "sta-2"]),
        settings(5, 12),
    );

    let summary = monitor.run(std::future::pending::<()>()).await.unwrap();

    // cycles start at 0s, 5s, 10s; the check at 15s ends the run
    assert_eq!(summary.cycles, 3);
    assert!(!summary.stopped_early);
    assert_eq!(summary.outages.len(), 1);
    assert_eq!(summary.outages[0].station, "sta-1");
    assert_eq!(summary.outages[0].duration_secs, 10);
    assert!(summary.still_unreachable.is_empty());

    let lines = reporter.lines();
    assert_eq!(lines.first().unwrap(), "Stability test started.");
    assert_eq!(lines[1], "Monitoring 2 station(s): sta-1, sta-2");
    assert!(lines.contains(&"STA sta-1 is still unreachable.".to_string()));
    assert!(lines.contains(&"Cycle 1: 1/2 station(s) reachable.".to_string()));
    assert!(lines.contains(&"Cycle 3: 2/2 station(s) reachable.".to_string()));
    assert_eq!(lines.last().unwrap(), "Stability test completed.");
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_honoured_between_cycles() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut monitor = Monitor::new(
        Arc::new(ScriptedProber::with("sta-1", &[false])),
        reporter.clone(),
        Arc::new(TokioClock::new(base())),
        TargetSource::from_list(["sta-1"]),
        settings(5, 3600),
    );

    let summary = monitor.run(async {}).await.unwrap();

    assert_eq!(summary.cycles, 1);
    assert!(summary.stopped_early);
    assert_eq!(summary.still_unreachable.len(), 1);
    assert_eq!(summary.still_unreachable[0].since, base());
    assert_eq!(reporter.lines().last().unwrap(), "Stability test stopped by operator.");
}

/// Requests shutdown from inside the first cycle, then answers down.
struct InterruptingProber {
    trigger: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl Prober for InterruptingProber {
    async fn probe(&self, _station: &StationId) -> anyhow::Result<bool> {
        if let Some(tx) = self.trigger.lock().unwrap().take() {
            let _ = tx.send(());
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(false)
    }
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_first_cycle_lets_it_finish() {
    let (tx, rx) = oneshot::channel();
    let reporter = Arc::new(MemoryReporter::new());
    let mut monitor = Monitor::new(
        Arc::new(InterruptingProber {
            trigger: Mutex::new(Some(tx)),
        }),
        reporter.clone(),
        Arc::new(TokioClock::new(base())),
        TargetSource::from_list(["sta-1", "sta-2"]),
        settings(5, 3600),
    );

    let summary = monitor.run(wait_for_shutdown(rx)).await.unwrap();

    assert_eq!(summary.cycles, 1);
    assert!(summary.stopped_early);
    assert_eq!(summary.still_unreachable.len(), 2);

    let lines = reporter.lines();
    assert!(lines.iter().any(|l| l.starts_with("STA sta-1 is NOT reachable!")));
    assert!(lines.iter().any(|l| l.starts_with("STA sta-2 is NOT reachable!")));
    assert!(lines.contains(&"Cycle 1: 0/2 station(s) reachable.".to_string()));
    assert_eq!(lines.last().unwrap(), "Stability test stopped by operator.");
}

#[tokio::test(start_paused = true)]
async fn zero_budget_runs_no_cycles() {
    let reporter = Arc::new(MemoryReporter::new());
    let mut monitor = Monitor::new(
        Arc::new(ScriptedProber::default()),
        reporter.clone(),
        Arc::new(TokioClock::new(base())),
        TargetSource::from_list(["sta-1"]),
        settings(5, 0),
    );
    let summary = monitor.run(std::future::pending::<()>()).await.unwrap();
    assert_eq!(summary.cycles, 0);
    assert_eq!(reporter.lines().last().unwrap(), "Stability test completed.");
}

/// Rewrites the targets file the first time it probes `a`.
struct FileSwapProber {
    path: PathBuf,
}

#[async_trait]
impl Prober for FileSwapProber {
    async fn probe(&self, station: &StationId) -> anyhow::Result<bool> {
        if station.as_str() == "a" {
            std::fs::write(&self.path, "b\n")?;
            return Ok(false);
        }
        Ok(true)
    }
}

#[tokio::test(start_paused = true)]
async fn targets_file_edits_reconcile_between_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("targets.txt");
    std::fs::write(&path, "a\n").unwrap();

    let reporter = Arc::new(MemoryReporter::new());
    let mut monitor = Monitor::new(
        Arc::new(FileSwapProber { path: path.clone() }),
        reporter.clone(),
        Arc::new(TokioClock::new(base())),
        TargetSource::File(path),
        settings(5, 7),
    );

    let summary = monitor.run(std::future::pending::<()>()).await.unwrap();

    assert_eq!(summary.cycles, 2);
    // `a` left while down: its outage is dropped, never closed.
    assert!(summary.outages.is_empty());
    assert!(summary.still_unreachable.is_empty());

    let lines = reporter.lines();
    assert!(lines.contains(&"Station b added to monitoring.".to_string()));
    assert!(lines.contains(&"Station a removed from monitoring.".to_string()));
    let store = monitor.coordinator().evaluator().store();
    assert!(store.contains(&StationId::from("b")));
    assert!(!store.contains(&StationId::from("a")));
}

/// Every write fails.
struct BrokenReporter;

impl Reporter for BrokenReporter {
    fn log_general(&self, _message: &str) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }

    fn log_outage(&self, _outage: &OutageEvent) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
}

#[tokio::test(start_paused = true)]
async fn log_failures_do_not_stop_monitoring() {
    let mut monitor = Monitor::new(
        Arc::new(ScriptedProber::with("sta-1", &[false, true])),
        Arc::new(BrokenReporter),
        Arc::new(TokioClock::new(base())),
        TargetSource::from_list(["sta-1"]),
        settings(5, 8),
    );
    let summary = monitor.run(std::future::pending::<()>()).await.unwrap();
    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.outages.len(), 1);
    assert_eq!(summary.outages[0].duration_secs, 5);
}
