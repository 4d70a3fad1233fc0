use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use stawatch_core::{dedup_stations, StationId};

/// Ask for station addresses one per line until `done` (or end of input).
pub fn prompt_stations<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Vec<StationId>> {
    writeln!(out, "Please provide the IP addresses of all STAs (stations) you want to monitor.")?;
    let mut stations = Vec::new();
    loop {
        write!(out, "Enter an STA IP address (or type 'done' to finish): ")?;
        out.flush()?;

        let mut line = String::new();
        let n = input.read_line(&mut line).context("read station address")?;
        if n == 0 || line.trim().eq_ignore_ascii_case("done") {
            break;
        }
        if let Some(id) = StationId::parse(&line) {
            stations.push(id);
        }
    }
    Ok(dedup_stations(stations))
}

/// Only an explicit `yes` counts; end of input declines.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    write!(out, "{question} (yes/no): ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("read confirmation")?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}
