//! Rendering of arrival reports for the console.
//!
//! Supports the plain-text report and a JSON document of the same data.

use std::io::Write;

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::arrivals::Arrival;

/// Timestamp layout used in every report line.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

const RULE: &str = "##################################################################";

/// Everything known about one arrivals query, serialized for `--json`.
#[derive(Debug, Serialize)]
pub struct ArrivalReport<'a> {
    pub route_id: &'a str,
    pub stop_id: &'a str,
    pub generated_at: DateTime<Tz>,
    pub arrivals: &'a [Arrival],
}

/// Writes the current-time banner that heads a report.
pub fn write_banner<W: Write>(out: &mut W, now: &DateTime<Tz>) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Current time: {}", now.format(TIME_FORMAT))?;
    writeln!(out, "{RULE}")?;
    writeln!(out)
}

/// Writes one line per arrival, in the order given.
pub fn write_arrivals<W: Write>(
    out: &mut W,
    route_id: &str,
    arrivals: &[Arrival],
) -> std::io::Result<()> {
    for arrival in arrivals {
        writeln!(
            out,
            "{route_id} Train arriving in {} minutes at {}",
            arrival.minutes_remaining,
            arrival.arrival_time.format(TIME_FORMAT)
        )?;
    }
    Ok(())
}

/// Writes every stop name with its 1-based position.
pub fn write_stop_list<W: Write, S: AsRef<str>>(out: &mut W, names: &[S]) -> std::io::Result<()> {
    writeln!(out, "Available Stops:")?;
    for (idx, name) in names.iter().enumerate() {
        writeln!(out, "{}. {}", idx + 1, name.as_ref())?;
    }
    Ok(())
}

/// Writes the report as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(out: &mut W, report: &ArrivalReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
