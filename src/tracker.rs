//! The application state and the gated operations over it.
//!
//! `Tracker` owns the roster, the ledger and the schedule together with the
//! store they persist to. Every operation checks the session's role first,
//! builds the new value off to the side, writes the touched key, and only
//! then swaps it into memory. A failed write leaves memory untouched.

use crate::classify::classify;
use crate::error::{TrackerError, TrackerResult};
use crate::journal::Journal;
use crate::ledger::Ledger;
use crate::model::{AttendanceRecord, User};
use crate::policy::{self, Operation, Session};
use crate::registry::UserRegistry;
use crate::report::{generate_report, Report};
use crate::schedule::Schedule;
use crate::store::{Store, ATTENDANCE_KEY, CONFIG_KEY, USERS_KEY};
use anyhow::{Context as _, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the tracker keeps between runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub users: UserRegistry,
    pub ledger: Ledger,
    pub schedule: Schedule,
}

impl AppState {
    /// Read all three keys. Missing keys fall back to empty/default values.
    pub fn load(store: &dyn Store) -> Result<Self> {
        let users: Vec<User> = load_key(store, USERS_KEY)?.unwrap_or_default();
        let records: Vec<AttendanceRecord> = load_key(store, ATTENDANCE_KEY)?.unwrap_or_default();
        let schedule: Schedule = load_key(store, CONFIG_KEY)?.unwrap_or_default();
        Ok(Self {
            users: UserRegistry::from_users(users),
            ledger: Ledger::from_records(records),
            schedule,
        })
    }

    /// Write all three keys
    pub fn save(&self, store: &mut dyn Store) -> Result<()> {
        store.set(USERS_KEY, &serde_json::to_string(self.users.users())?)?;
        store.set(ATTENDANCE_KEY, &serde_json::to_string(self.ledger.records())?)?;
        store.set(CONFIG_KEY, &serde_json::to_string(&self.schedule)?)?;
        Ok(())
    }
}

fn load_key<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).with_context(|| format!("corrupt '{}' data", key))?;
    Ok(Some(value))
}

/// User-facing message for a scan, mirroring the kiosk notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn for_scan(result: &TrackerResult<AttendanceRecord>) -> Self {
        match result {
            Ok(r) => Self::Success(format!(
                "Success: {} scanned at {} ({})",
                r.name, r.timestamp, r.status
            )),
            Err(TrackerError::UnknownIdentifier(_)) => {
                Self::Error("Error: Invalid barcode.".to_string())
            }
            Err(e) => Self::Error(format!("Error: {}", e)),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

pub struct Tracker<S: Store> {
    state: AppState,
    store: S,
    journal: Option<Journal>,
    timestamp_format: String,
}

impl<S: Store> Tracker<S> {
    /// Load state from `store`
    pub fn open(store: S) -> Result<Self> {
        let state = AppState::load(&store)?;
        tracing::info!(
            users = state.users.len(),
            records = state.ledger.len(),
            "tracker state loaded"
        );
        Ok(Self {
            state,
            store,
            journal: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        })
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Format used for the display timestamp of new records. A pattern
    /// chrono cannot render fails each scan with `TimestampFormat`.
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn journal_path(&self) -> Option<&Path> {
        self.journal.as_ref().map(|j| j.path.as_path())
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    /// Classify a scan of `scanned` at `now` and append it to the ledger
    pub fn scan(
        &mut self,
        session: &Session,
        scanned: &str,
        now: NaiveDateTime,
    ) -> TrackerResult<AttendanceRecord> {
        self.gate(session, Operation::Scan)?;

        let record = match classify(
            scanned,
            now,
            &self.state.schedule,
            &self.state.users,
            &self.timestamp_format,
        ) {
            Ok(record) => record,
            Err(e) => {
                self.journal_event(|j| j.scan_rejected(scanned));
                return Err(e);
            }
        };

        let records: Vec<&AttendanceRecord> = self
            .state
            .ledger
            .records()
            .iter()
            .chain(std::iter::once(&record))
            .collect();
        let raw = serde_json::to_string(&records).map_err(anyhow::Error::from)?;
        self.store.set(ATTENDANCE_KEY, &raw)?;
        self.state.ledger.append(record.clone());

        tracing::info!(user_id = %record.user_id, status = %record.status, "scan recorded");
        self.journal_event(|j| j.scan_recorded(&record));
        Ok(record)
    }

    /// The full attendance log in scan order
    pub fn log(&mut self, session: &Session) -> TrackerResult<&[AttendanceRecord]> {
        self.gate(session, Operation::ViewLog)?;
        Ok(self.state.ledger.records())
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn list_users(&mut self, session: &Session) -> TrackerResult<&[User]> {
        self.gate(session, Operation::ListUsers)?;
        Ok(self.state.users.users())
    }

    pub fn add_user(&mut self, session: &Session, user: User) -> TrackerResult<()> {
        self.gate(session, Operation::AddUser)?;
        let mut users = self.state.users.clone();
        users.add(user.clone())?;
        self.commit_users(users)?;
        self.journal_event(|j| j.user_added(&user));
        Ok(())
    }

    /// Replace user `id` with `updated` (delete-then-insert)
    pub fn edit_user(&mut self, session: &Session, id: &str, updated: User) -> TrackerResult<()> {
        self.gate(session, Operation::EditUser)?;
        let mut users = self.state.users.clone();
        users.edit(id, updated.clone())?;
        self.commit_users(users)?;
        if updated.id != id {
            tracing::warn!(
                old_id = id,
                new_id = %updated.id,
                "id changed by edit; earlier attendance stays under the old id"
            );
        }
        self.journal_event(|j| j.user_edited(id, &updated));
        Ok(())
    }

    /// Change a user's id. Ledger records keep the id they were scanned with.
    pub fn rename_user(
        &mut self,
        session: &Session,
        old_id: &str,
        new_id: &str,
    ) -> TrackerResult<()> {
        self.gate(session, Operation::RenameUser)?;
        let mut users = self.state.users.clone();
        users.rename(old_id, new_id)?;
        if users == self.state.users {
            return Ok(());
        }
        self.commit_users(users)?;
        self.journal_event(|j| j.user_renamed(old_id, new_id));
        Ok(())
    }

    /// Remove `id` from the roster. Returns false if it was not there.
    pub fn delete_user(&mut self, session: &Session, id: &str) -> TrackerResult<bool> {
        self.gate(session, Operation::DeleteUser)?;
        let mut users = self.state.users.clone();
        let removed = users.delete(id).is_some();
        if removed {
            self.commit_users(users)?;
        }
        self.journal_event(|j| j.user_deleted(id, removed));
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    pub fn report(&mut self, session: &Session, date: Option<NaiveDate>) -> TrackerResult<Report> {
        self.gate(session, Operation::ViewReport)?;
        Ok(generate_report(&self.state.ledger, &self.state.users, date))
    }

    /// Write the CSV export for `date` into `dir`; returns the file path
    pub fn export_report(
        &mut self,
        session: &Session,
        date: Option<NaiveDate>,
        dir: &Path,
    ) -> TrackerResult<PathBuf> {
        self.gate(session, Operation::ExportReport)?;
        let report = generate_report(&self.state.ledger, &self.state.users, date);
        let path = dir.join(report.export_file_name());
        let csv = report.to_csv()?;
        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, csv))
            .with_context(|| format!("failed to write {}", path.display()))?;
        let rows = report.present.len();
        self.journal_event(|j| j.report_exported(&path, rows));
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Schedule
    // ------------------------------------------------------------------

    pub fn schedule(&mut self, session: &Session) -> TrackerResult<&Schedule> {
        self.gate(session, Operation::ViewSchedule)?;
        Ok(&self.state.schedule)
    }

    /// Overwrite the schedule wholesale. Values are stored as given.
    pub fn save_schedule(&mut self, session: &Session, schedule: Schedule) -> TrackerResult<()> {
        self.gate(session, Operation::SaveSchedule)?;
        let raw = serde_json::to_string(&schedule).map_err(anyhow::Error::from)?;
        self.store.set(CONFIG_KEY, &raw)?;
        self.state.schedule = schedule;
        let saved = self.state.schedule.clone();
        self.journal_event(|j| j.schedule_saved(&saved));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn gate(&mut self, session: &Session, op: Operation) -> TrackerResult<()> {
        let result = policy::check(session, op);
        if result.is_err() {
            let role = session.role.as_str();
            self.journal_event(|j| j.access_denied(role, op.describe()));
        }
        result
    }

    fn commit_users(&mut self, users: UserRegistry) -> TrackerResult<()> {
        let raw = serde_json::to_string(users.users()).map_err(anyhow::Error::from)?;
        self.store.set(USERS_KEY, &raw)?;
        self.state.users = users;
        Ok(())
    }

    fn journal_event<F>(&mut self, write: F)
    where
        F: FnOnce(&mut Journal) -> Result<()>,
    {
        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = write(journal) {
                tracing::warn!(error = %e, "failed to write journal event");
            }
        }
    }
}
