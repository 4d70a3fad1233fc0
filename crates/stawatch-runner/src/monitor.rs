use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use stawatch_core::StationId;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::coordinator::CycleCoordinator;
use crate::prober::{prober_from_config, Prober};
use crate::reporter::{log_or_warn, FileReporter, Reporter};
use crate::summary::RunSummary;
use crate::targets::TargetSource;

#[derive(Clone, Copy, Debug)]
pub struct MonitorSettings {
    /// Fixed sleep after each cycle; the period is probe time plus this.
    pub interval: Duration,
    /// Observation budget, checked between cycles only.
    pub duration: Duration,
    pub max_concurrent_probes: usize,
}

impl From<&Config> for MonitorSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.interval(),
            duration: cfg.duration(),
            max_concurrent_probes: cfg.monitor.max_concurrent_probes,
        }
    }
}

/// Drives cycles until the duration budget runs out or shutdown is asked.
pub struct Monitor {
    coordinator: CycleCoordinator,
    reporter: Arc<dyn Reporter>,
    targets: TargetSource,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(
        prober: Arc<dyn Prober>,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
        targets: TargetSource,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            coordinator: CycleCoordinator::new(prober, Arc::clone(&reporter), settings.max_concurrent_probes),
            reporter,
            targets,
            clock,
            settings,
        }
    }

    /// Wire up the production collaborators described by `cfg`.
    pub fn from_config(cfg: &Config, targets: TargetSource) -> Result<Self> {
        cfg.validate()?;
        let log_dir = cfg.logs.dir_path();
        let reporter = FileReporter::new(&log_dir, &cfg.logs.general_file, cfg.logs.echo_console)
            .context("set up stability logs")?;
        if cfg.logs.clear_general_on_start {
            reporter.truncate_general()?;
        }
        info!(log_dir = %log_dir.display(), method = ?cfg.probe.method, "monitor configured");
        Ok(Self::new(
            prober_from_config(&cfg.probe),
            Arc::new(reporter),
            Arc::new(SystemClock),
            targets,
            MonitorSettings::from(cfg),
        ))
    }

    pub fn coordinator(&self) -> &CycleCoordinator {
        &self.coordinator
    }

    /// Run until the budget is spent. `shutdown` is only looked at while
    /// sleeping between cycles; a cycle in flight always finishes.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut stations = self.targets.load().context("load monitored stations")?;

        log_or_warn(self.reporter.as_ref(), "Stability test started.");
        log_or_warn(self.reporter.as_ref(), &monitoring_line(&stations));
        info!(
            source = %self.targets.describe(),
            interval_secs = self.settings.interval.as_secs(),
            duration_secs = self.settings.duration.as_secs(),
            "stability test running"
        );

        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();

        while started.elapsed() < self.settings.duration {
            if summary.cycles > 0 {
                match self.targets.load() {
                    Ok(fresh) => stations = fresh,
                    Err(e) => {
                        let error = format!("{e:#}");
                        warn!(%error, "keeping previous station list");
                        log_or_warn(
                            self.reporter.as_ref(),
                            &format!("Could not reload targets, keeping previous list: {error}"),
                        );
                    }
                }
            }

            let t = self.clock.now();
            let events = self.coordinator.run_cycle(&stations, t).await?;
            summary.cycles += 1;
            summary.record_events(&events);
            log_or_warn(self.reporter.as_ref(), &self.cycle_line(summary.cycles));

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = &mut shutdown => {
                    summary.stopped_early = true;
                    break;
                }
            }
        }

        summary.close(self.coordinator.evaluator().store());
        let closing = if summary.stopped_early {
            "Stability test stopped by operator."
        } else {
            "Stability test completed."
        };
        log_or_warn(self.reporter.as_ref(), closing);
        info!(cycles = summary.cycles, outages = summary.outages.len(), "stability test finished");
        Ok(summary)
    }

    fn cycle_line(&self, cycle: u64) -> String {
        let store = self.coordinator.evaluator().store();
        let up = store.iter().filter(|(_, s)| s.reachable()).count();
        format!("Cycle {cycle}: {up}/{} station(s) reachable.", store.len())
    }
}

fn monitoring_line(stations: &[StationId]) -> String {
    let names: Vec<&str> = stations.iter().map(|s| s.as_str()).collect();
    format!("Monitoring {} station(s): {}", stations.len(), names.join(", "))
}
