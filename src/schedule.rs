//! Work schedule: the singleton that drives late classification.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Working hours and the grace period after work start.
///
/// Times are stored as entered; nothing checks their format or ordering
/// when the schedule is saved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default = "default_work_start")]
    pub work_start: String,
    #[serde(default = "default_work_end")]
    pub work_end: String,
    /// Minutes after work start that still count as on time
    #[serde(default = "default_late_tolerance")]
    pub late_tolerance: u32,
}

fn default_work_start() -> String {
    "08:00".to_string()
}

fn default_work_end() -> String {
    "17:00".to_string()
}

fn default_late_tolerance() -> u32 {
    15
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            late_tolerance: default_late_tolerance(),
        }
    }
}

impl Schedule {
    pub fn new(work_start: &str, work_end: &str, late_tolerance: u32) -> Self {
        Self {
            work_start: work_start.to_string(),
            work_end: work_end.to_string(),
            late_tolerance,
        }
    }

    /// Last instant on `date` that still classifies as Present.
    /// None when `work_start` is not a readable time of day.
    pub fn late_threshold(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        let start = parse_time_of_day(&self.work_start)?;
        Some(date.and_time(start) + Duration::minutes(i64::from(self.late_tolerance)))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("08:00"),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(
            parse_time_of_day(" 08:30:15 "),
            NaiveTime::from_hms_opt(8, 30, 15)
        );
        assert!(parse_time_of_day("8am").is_none());
        assert!(parse_time_of_day("").is_none());
    }

    #[test]
    fn test_late_threshold_adds_tolerance() {
        let schedule = Schedule::new("08:00", "17:00", 15);
        let threshold = schedule.late_threshold(day()).unwrap();
        assert_eq!(threshold, day().and_hms_opt(8, 15, 0).unwrap());
    }

    #[test]
    fn test_late_threshold_crosses_midnight() {
        let schedule = Schedule::new("23:50", "06:00", 30);
        let threshold = schedule.late_threshold(day()).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(threshold, next.and_hms_opt(0, 20, 0).unwrap());
    }

    #[test]
    fn test_unreadable_work_start() {
        let schedule = Schedule::new("soon", "17:00", 15);
        assert!(schedule.late_threshold(day()).is_none());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let schedule: Schedule = serde_json::from_str(r#"{"workStart":"09:00"}"#).unwrap();
        assert_eq!(schedule.work_start, "09:00");
        assert_eq!(schedule.work_end, "17:00");
        assert_eq!(schedule.late_tolerance, 15);
    }
}
