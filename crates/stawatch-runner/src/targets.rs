use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use stawatch_core::{dedup_stations, StationId};

/// Where the monitored set comes from on each cycle.
#[derive(Clone, Debug)]
pub enum TargetSource {
    Static(Vec<StationId>),
    /// Re-read at the start of every cycle, so edits add or drop stations
    /// while the monitor runs.
    File(PathBuf),
}

impl TargetSource {
    pub fn from_list<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Static(dedup_stations(
            raw.into_iter().filter_map(|s| StationId::parse(s.as_ref())),
        ))
    }

    pub fn load(&self) -> Result<Vec<StationId>> {
        match self {
            TargetSource::Static(list) => Ok(list.clone()),
            TargetSource::File(path) => read_targets_file(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TargetSource::Static(list) => format!("{} station(s) given up front", list.len()),
            TargetSource::File(path) => format!("targets file {}", path.display()),
        }
    }
}

/// One station per line; blank lines and `#` comments are skipped.
pub fn parse_targets(text: &str) -> Vec<StationId> {
    dedup_stations(text.lines().filter_map(|line| {
        let line = line.split('#').next().unwrap_or_default();
        StationId::parse(line)
    }))
}

pub fn read_targets_file(path: &Path) -> Result<Vec<StationId>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read targets file {}", path.display()))?;
    Ok(parse_targets(&text))
}
