use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use stawatch_core::OutageEvent;

use crate::render::{format_duration, format_timestamp};
use crate::util::station_file_stem;

/// Sink for the stability logs. Append-only and best-effort: an `Err` is
/// surfaced to the operator but never stops monitoring.
pub trait Reporter: Send + Sync {
    fn log_general(&self, message: &str) -> Result<()>;
    fn log_outage(&self, outage: &OutageEvent) -> Result<()>;
}

/// Write a general line, downgrading I/O failures to a warning.
pub fn log_or_warn(reporter: &dyn Reporter, message: &str) {
    if let Err(e) = reporter.log_general(message) {
        let error = format!("{e:#}");
        warn!(%error, "could not write general log line");
    }
}

pub fn outage_or_warn(reporter: &dyn Reporter, outage: &OutageEvent) {
    if let Err(e) = reporter.log_outage(outage) {
        let error = format!("{e:#}");
        warn!(station = %outage.station, %error, "could not write outage record");
    }
}

/// Shared general log plus one `<station>_disconnections.log` per station.
#[derive(Debug)]
pub struct FileReporter {
    dir: PathBuf,
    general_path: PathBuf,
    echo_console: bool,
}

impl FileReporter {
    pub fn new(dir: impl Into<PathBuf>, general_file: &str, echo_console: bool) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).with_context(|| format!("create log dir {}", dir.display()))?;
        let general_path = dir.join(general_file);
        Ok(Self {
            dir,
            general_path,
            echo_console,
        })
    }

    /// Start the general log from scratch.
    pub fn truncate_general(&self) -> Result<()> {
        match std::fs::remove_file(&self.general_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.general_path.display())),
        }
    }

    pub fn general_path(&self) -> &Path {
        &self.general_path
    }

    pub fn outage_path(&self, station: &str) -> PathBuf {
        self.dir
            .join(format!("{}_disconnections.log", station_file_stem(station)))
    }
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    f.write_all(text.as_bytes())
        .with_context(|| format!("append to {}", path.display()))?;
    Ok(())
}

/// The per-station record block, blank-line terminated.
pub fn render_outage_record(outage: &OutageEvent) -> String {
    format!(
        "PC-NAME: {}\n- Disconnection Time: {}\n- Reconnection Time: {}\n- Duration: {}\n\n",
        outage.station,
        format_timestamp(outage.start),
        format_timestamp(outage.end),
        format_duration(outage.duration),
    )
}

impl Reporter for FileReporter {
    fn log_general(&self, message: &str) -> Result<()> {
        let line = format!("[{}] {}", format_timestamp(Utc::now()), message);
        if self.echo_console {
            println!("{line}");
        }
        append(&self.general_path, &format!("{line}\n"))
    }

    fn log_outage(&self, outage: &OutageEvent) -> Result<()> {
        append(&self.outage_path(outage.station.as_str()), &render_outage_record(outage))
    }
}

/// In-memory reporter for tests. Lines are kept without timestamps.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
    outages: Mutex<Vec<OutageEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn outages(&self) -> Vec<OutageEvent> {
        self.outages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Reporter for MemoryReporter {
    fn log_general(&self, message: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(())
    }

    fn log_outage(&self, outage: &OutageEvent) -> Result<()> {
        self.outages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outage.clone());
        Ok(())
    }
}
