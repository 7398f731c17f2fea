use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::{AttendanceRecord, User};
use crate::schedule::Schedule;

/// Append-only JSONL audit trail for one session
pub struct Journal {
    pub path: PathBuf,
    session_id: String,
    cwd: PathBuf,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    cwd: &'a Path,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn new(path: &Path, session_id: &str, cwd: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            cwd: cwd.to_path_buf(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            cwd: &self.cwd,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn scan_recorded(&mut self, record: &AttendanceRecord) -> Result<()> {
        self.log(
            "scan_recorded",
            serde_json::json!({
                "user_id": record.user_id,
                "timestamp": record.timestamp,
                "status": record.status,
            }),
        )
    }

    pub fn scan_rejected(&mut self, scanned: &str) -> Result<()> {
        self.log("scan_rejected", serde_json::json!({ "scanned": scanned }))
    }

    pub fn user_added(&mut self, user: &User) -> Result<()> {
        self.log("user_added", serde_json::json!({ "user": user }))
    }

    pub fn user_edited(&mut self, previous_id: &str, user: &User) -> Result<()> {
        self.log(
            "user_edited",
            serde_json::json!({ "previous_id": previous_id, "user": user }),
        )
    }

    pub fn user_renamed(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        self.log(
            "user_renamed",
            serde_json::json!({ "old_id": old_id, "new_id": new_id }),
        )
    }

    /// `removed` is false when the id was not on the roster
    pub fn user_deleted(&mut self, id: &str, removed: bool) -> Result<()> {
        self.log(
            "user_deleted",
            serde_json::json!({ "id": id, "removed": removed }),
        )
    }

    pub fn schedule_saved(&mut self, schedule: &Schedule) -> Result<()> {
        self.log("schedule_saved", serde_json::json!({ "schedule": schedule }))
    }

    pub fn access_denied(&mut self, role: &str, operation: &str) -> Result<()> {
        self.log(
            "access_denied",
            serde_json::json!({ "role": role, "operation": operation }),
        )
    }

    pub fn report_exported(&mut self, path: &Path, rows: usize) -> Result<()> {
        self.log(
            "report_exported",
            serde_json::json!({ "path": path, "rows": rows }),
        )
    }
}
