/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedule output files.
//!
//! | Writer | Format |
//! |---|---|
//! | [`write_gantt_csv`] | `Task,Start,Finish,Resource` rows for Gantt chart tools |
//! | [`write_report`] | YAML document with `makespan` and `entries` |
//!
//! Gantt rows group bars by machine: the `Task` column holds the machine name
//! and `Resource` holds the task, so each machine gets one chart lane.  Time
//! unit `n` is rendered as `anchor + n hours`.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeDelta};
use tracing::info;

use crate::task::Schedule;

/// Timestamp format of the `Start` / `Finish` columns.
pub const GANTT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the Gantt CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GanttRow {
    pub lane: String,
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub resource: String,
}

/// Map every schedule entry onto wall-clock time starting at `anchor`.
///
/// # Errors
/// Fails if a time falls outside the range `chrono` can represent.
pub fn gantt_rows(schedule: &Schedule, anchor: NaiveDateTime) -> Result<Vec<GanttRow>> {
    schedule
        .entries
        .iter()
        .map(|entry| -> Result<GanttRow> {
            Ok(GanttRow {
                lane: entry.machine.clone(),
                start: offset(anchor, entry.start)
                    .with_context(|| format!("start of task '{}'", entry.task))?,
                finish: offset(anchor, entry.finish)
                    .with_context(|| format!("finish of task '{}'", entry.task))?,
                resource: entry.task.clone(),
            })
        })
        .collect()
}

/// The full CSV document, header included.
pub fn render_gantt_csv(schedule: &Schedule, anchor: NaiveDateTime) -> Result<String> {
    let mut out = String::from("Task,Start,Finish,Resource\n");
    for row in gantt_rows(schedule, anchor)? {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(&row.lane),
            row.start.format(GANTT_TIME_FORMAT),
            row.finish.format(GANTT_TIME_FORMAT),
            csv_field(&row.resource),
        );
    }
    Ok(out)
}

pub fn write_gantt_csv(path: &Path, schedule: &Schedule, anchor: NaiveDateTime) -> Result<()> {
    let csv = render_gantt_csv(schedule, anchor)?;
    std::fs::write(path, csv)
        .with_context(|| format!("Cannot write Gantt CSV: {}", path.display()))?;
    info!(path = %path.display(), rows = schedule.len(), "Gantt CSV written");
    Ok(())
}

/// Serialise `schedule` as YAML into `path`.
pub fn write_report(path: &Path, schedule: &Schedule) -> Result<()> {
    let yaml = serde_yaml::to_string(schedule).context("Failed to serialise schedule")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Cannot write schedule report: {}", path.display()))?;
    info!(path = %path.display(), makespan = schedule.makespan, "schedule report written");
    Ok(())
}

fn offset(anchor: NaiveDateTime, hours: u64) -> Result<NaiveDateTime> {
    i64::try_from(hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|delta| anchor.checked_add_signed(delta))
        .with_context(|| format!("{hours} hours after {anchor} is out of range"))
}

/// Quote a field if it contains a delimiter, a quote or a line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
