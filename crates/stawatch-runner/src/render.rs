//! Human-readable rendering of events for the stability logs.

use chrono::{Local, TimeDelta};
use stawatch_core::{Event, Timestamp};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(t: Timestamp) -> String {
    t.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// `H:MM:SS`, with a leading `N day(s), ` past 24 hours and a `-` for
/// negative spans. Sub-second precision is dropped.
pub fn format_duration(d: TimeDelta) -> String {
    let sign = if d < TimeDelta::zero() { "-" } else { "" };
    let total = d.num_seconds().unsigned_abs();
    let days = total / 86_400;
    let rem = total % 86_400;
    let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => format!("{sign}{h}:{m:02}:{s:02}"),
        1 => format!("{sign}1 day, {h}:{m:02}:{s:02}"),
        n => format!("{sign}{n} days, {h}:{m:02}:{s:02}"),
    }
}

pub fn render_event(event: &Event) -> String {
    match event {
        Event::OutageStarted { station, at } => format!(
            "STA {station} is NOT reachable! Disconnection started at {}.",
            format_timestamp(*at)
        ),
        Event::StillUnreachable { station, .. } => format!("STA {station} is still unreachable."),
        Event::Recovered(outage) => format!(
            "STA {} reconnected after being down for {}.",
            outage.station,
            format_duration(outage.duration)
        ),
    }
}
