//! Append-only attendance ledger.

use crate::model::AttendanceRecord;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<AttendanceRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AttendanceRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: AttendanceRecord) {
        self.records.push(record);
    }

    /// All records in scan order
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for one calendar day, or every record when `date` is None
    pub fn on(&self, date: Option<NaiveDate>) -> impl Iterator<Item = &AttendanceRecord> {
        self.records
            .iter()
            .filter(move |r| date.map_or(true, |d| r.date == d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn record(user_id: &str, day: u32) -> AttendanceRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        AttendanceRecord {
            user_id: user_id.to_string(),
            name: user_id.to_lowercase(),
            timestamp: format!("{} 08:00:00", date),
            date,
            status: Status::Present,
        }
    }

    #[test]
    fn test_append_keeps_order() {
        let mut ledger = Ledger::new();
        ledger.append(record("B", 4));
        ledger.append(record("A", 4));
        let ids: Vec<&str> = ledger.records().iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_filter_by_day() {
        let ledger = Ledger::from_records(vec![record("A", 4), record("B", 5), record("C", 4)]);
        let day = NaiveDate::from_ymd_opt(2024, 3, 4);
        let ids: Vec<&str> = ledger.on(day).map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(ledger.on(None).count(), 3);
    }
}
