//! Attendance reports: who scanned on a day, who on the roster did not, and
//! the CSV form of the same data.

use crate::ledger::Ledger;
use crate::model::{AttendanceRecord, User};
use crate::registry::UserRegistry;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;

pub const CSV_HEADER: [&str; 4] = ["Name", "ID", "Date", "Status"];

/// A derived view over the ledger and the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Day the report covers; None means the whole ledger
    pub date: Option<NaiveDate>,
    /// Matching records in scan order
    pub present: Vec<AttendanceRecord>,
    /// Non-admin users with no matching record, in roster order
    pub absent: Vec<User>,
}

/// Build the report for `date`. Reads only; never changes its inputs.
pub fn generate_report(
    ledger: &Ledger,
    registry: &UserRegistry,
    date: Option<NaiveDate>,
) -> Report {
    let present: Vec<AttendanceRecord> = ledger.on(date).cloned().collect();
    let seen: HashSet<&str> = present.iter().map(|r| r.user_id.as_str()).collect();
    let absent = registry
        .non_admins()
        .filter(|u| !seen.contains(u.id.as_str()))
        .cloned()
        .collect();

    Report {
        date,
        present,
        absent,
    }
}

impl Report {
    /// `attendance_report_<date>.csv`, or `attendance_report_all.csv`
    pub fn export_file_name(&self) -> String {
        match self.date {
            Some(date) => format!("attendance_report_{}.csv", date.format("%Y-%m-%d")),
            None => "attendance_report_all.csv".to_string(),
        }
    }

    /// Present records as comma-separated text with a `Name,ID,Date,Status` header
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for record in &self.present {
            writer.write_record([
                record.name.as_str(),
                record.user_id.as_str(),
                record.timestamp.as_str(),
                record.status.as_str(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("csv flush failed: {}", e.error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Plain-text tables for the terminal
    pub fn format_display(&self) -> String {
        let mut out = String::new();
        let title = match self.date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => "all dates".to_string(),
        };
        out.push_str(&format!("Attendance report ({})\n", title));
        out.push_str(&format_records(&self.present));

        out.push_str(&format!("\nAbsent ({}):\n", self.absent.len()));
        if self.absent.is_empty() {
            out.push_str("  (none)\n");
        }
        for user in &self.absent {
            out.push_str(&format!("  {:<24} {}\n", user.name, user.id));
        }
        out
    }
}

/// Render records as the attendance log table
pub fn format_records(records: &[AttendanceRecord]) -> String {
    let mut out = format!(
        "  {:<24} {:<12} {:<22} {}\n",
        "Name", "ID", "Date", "Status"
    );
    if records.is_empty() {
        out.push_str("  (no records)\n");
    }
    for r in records {
        out.push_str(&format!(
            "  {:<24} {:<12} {:<22} {}\n",
            r.name, r.user_id, r.timestamp, r.status
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, Status};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn record(user_id: &str, name: &str, d: u32, status: Status) -> AttendanceRecord {
        AttendanceRecord {
            user_id: user_id.to_string(),
            name: name.to_string(),
            timestamp: format!("{} 08:05:00", day(d)),
            date: day(d),
            status,
        }
    }

    fn registry() -> UserRegistry {
        UserRegistry::from_users(vec![
            User::new("A1", "Ann", "Ops", Role::Admin),
            User::new("E1", "Bob", "IT", Role::Employee),
            User::new("E2", "Cid", "Sales", Role::Employee),
            User::new("E3", "Dee", "IT", Role::Employee),
        ])
    }

    fn ledger() -> Ledger {
        Ledger::from_records(vec![
            record("E1", "Bob", 4, Status::Present),
            record("E2", "Cid", 5, Status::Late),
            record("E3", "Dee", 4, Status::Late),
            record("E1", "Bob", 5, Status::Present),
        ])
    }

    #[test]
    fn test_report_for_day() {
        let report = generate_report(&ledger(), &registry(), Some(day(4)));
        let present: Vec<&str> = report.present.iter().map(|r| r.user_id.as_str()).collect();
        let absent: Vec<&str> = report.absent.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(present, vec!["E1", "E3"]);
        assert_eq!(absent, vec!["E2"]);
    }

    #[test]
    fn test_report_all_dates() {
        let report = generate_report(&ledger(), &registry(), None);
        assert_eq!(report.present.len(), 4);
        assert!(report.absent.is_empty());
    }

    #[test]
    fn test_admins_never_absent() {
        let report = generate_report(&Ledger::new(), &registry(), Some(day(6)));
        assert!(report.absent.iter().all(|u| u.role != Role::Admin));
        assert_eq!(report.absent.len(), 3);
    }

    #[test]
    fn test_present_and_absent_partition_non_admins() {
        let reg = registry();
        for d in [4, 5] {
            let report = generate_report(&ledger(), &reg, Some(day(d)));
            let seen: HashSet<&str> = report.present.iter().map(|r| r.user_id.as_str()).collect();
            for user in reg.non_admins() {
                let in_present = seen.contains(user.id.as_str());
                let in_absent = report.absent.iter().any(|u| u.id == user.id);
                assert!(in_present ^ in_absent, "{} on day {}", user.id, d);
            }
        }
    }

    #[test]
    fn test_report_is_stable() {
        let (l, r) = (ledger(), registry());
        assert_eq!(
            generate_report(&l, &r, Some(day(5))),
            generate_report(&l, &r, Some(day(5)))
        );
    }

    #[test]
    fn test_deleted_user_records_still_reported() {
        let mut reg = registry();
        reg.delete("E3");
        let report = generate_report(&ledger(), &reg, Some(day(4)));
        assert!(report.present.iter().any(|r| r.user_id == "E3"));
        assert!(report.absent.iter().all(|u| u.id != "E3"));
    }

    #[test]
    fn test_to_csv() {
        let report = generate_report(&ledger(), &registry(), Some(day(4)));
        let csv = report.to_csv().unwrap();
        assert_eq!(
            csv,
            "Name,ID,Date,Status\n\
             Bob,E1,2024-03-04 08:05:00,Present\n\
             Dee,E3,2024-03-04 08:05:00,Late\n"
        );
    }

    #[test]
    fn test_to_csv_quotes_commas() {
        let mut l = Ledger::new();
        l.append(record("E1", "Doe, Jane", 4, Status::Present));
        let csv = generate_report(&l, &registry(), None).to_csv().unwrap();
        assert!(csv.contains("\"Doe, Jane\",E1,"));
    }

    #[test]
    fn test_export_file_name() {
        let report = generate_report(&ledger(), &registry(), Some(day(4)));
        assert_eq!(report.export_file_name(), "attendance_report_2024-03-04.csv");
        let report = generate_report(&ledger(), &registry(), None);
        assert_eq!(report.export_file_name(), "attendance_report_all.csv");
    }

    #[test]
    fn test_format_display() {
        let report = generate_report(&ledger(), &registry(), Some(day(4)));
        let text = report.format_display();
        assert!(text.contains("Attendance report (2024-03-04)"));
        assert!(text.contains("Absent (1):"));
        assert!(text.contains("Cid"));
    }
}
