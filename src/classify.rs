//! Scan classification: decides Present or Late for an identifier scanned
//! at a given local instant.

use crate::error::{TrackerError, TrackerResult};
use crate::model::{AttendanceRecord, Status};
use crate::registry::UserRegistry;
use crate::schedule::Schedule;
use chrono::{Local, NaiveDateTime};
use std::fmt::Write as _;

/// Source of the current local wall-clock time
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Status of a scan at `now`. A scan exactly on the threshold is Present.
pub fn status_at(now: NaiveDateTime, schedule: &Schedule) -> Status {
    match schedule.late_threshold(now.date()) {
        Some(threshold) if now > threshold => Status::Late,
        Some(_) => Status::Present,
        None => {
            tracing::warn!(
                work_start = %schedule.work_start,
                "work start is not a time of day, scan counted as present"
            );
            Status::Present
        }
    }
}

/// Render `at` with a strftime `format`, or None if chrono cannot.
/// Patterns such as `%z` parse fine but need an offset a local clock lacks.
pub fn format_timestamp(at: NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", at.format(format)).ok()?;
    Some(out)
}

/// Build the attendance record for `scanned_id`.
///
/// Fails with `UnknownIdentifier` when nobody on the roster has that id,
/// and with `TimestampFormat` when `timestamp_format` cannot render `now`.
/// The caller appends the record; nothing is mutated here.
pub fn classify(
    scanned_id: &str,
    now: NaiveDateTime,
    schedule: &Schedule,
    registry: &UserRegistry,
    timestamp_format: &str,
) -> TrackerResult<AttendanceRecord> {
    let user = registry
        .get(scanned_id)
        .ok_or_else(|| TrackerError::UnknownIdentifier(scanned_id.to_string()))?;
    let timestamp = format_timestamp(now, timestamp_format)
        .ok_or_else(|| TrackerError::TimestampFormat(timestamp_format.to_string()))?;

    Ok(AttendanceRecord {
        user_id: user.id.clone(),
        name: user.name.clone(),
        timestamp,
        date: now.date(),
        status: status_at(now, schedule),
    })
}
