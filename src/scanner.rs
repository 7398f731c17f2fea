//! Scanner input as a stream of detections.
//!
//! A scanner (keyboard-wedge reader, pipe, or a person typing) yields one
//! identifier per line. The feed trims each line, drops blanks, and can
//! suppress a re-read of the same code within a cooldown window.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use std::io::BufRead;

const MAX_COOLDOWN_MS: u64 = 86_400_000;

#[derive(Debug, Clone)]
pub struct ScanFeed {
    cooldown: Duration,
    last: Option<(String, NaiveDateTime)>,
}

impl ScanFeed {
    /// `cooldown_ms` of 0 accepts every detection; values above a day are capped
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown: Duration::milliseconds(cooldown_ms.min(MAX_COOLDOWN_MS) as i64),
            last: None,
        }
    }

    /// Turn a raw line read at `at` into an identifier to classify, or None
    /// if it is blank or a repeat inside the cooldown window.
    pub fn detect(&mut self, raw: &str, at: NaiveDateTime) -> Option<String> {
        let code = raw.trim();
        if code.is_empty() {
            return None;
        }
        if let Some((last_code, last_at)) = &self.last {
            if last_code == code && at - *last_at < self.cooldown {
                tracing::debug!(code, "repeat detection inside cooldown dropped");
                return None;
            }
        }
        self.last = Some((code.to_string(), at));
        Some(code.to_string())
    }
}

/// Raw lines from a reader, one detection candidate per line
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<String>> {
    reader.lines().map(|line| line.map_err(anyhow::Error::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(s: u32, ms: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 0, s)
            .unwrap()
            + Duration::milliseconds(ms)
    }

    #[test]
    fn test_trims_and_skips_blank() {
        let mut feed = ScanFeed::new(0);
        assert_eq!(feed.detect("  E1 \r", at(0, 0)), Some("E1".to_string()));
        assert_eq!(feed.detect("   ", at(0, 0)), None);
    }

    #[test]
    fn test_no_cooldown_accepts_repeats() {
        let mut feed = ScanFeed::new(0);
        assert!(feed.detect("E1", at(0, 0)).is_some());
        assert!(feed.detect("E1", at(0, 0)).is_some());
    }

    #[test]
    fn test_cooldown_drops_same_code() {
        let mut feed = ScanFeed::new(2000);
        assert!(feed.detect("E1", at(0, 0)).is_some());
        assert!(feed.detect("E1", at(1, 999)).is_none());
        assert!(feed.detect("E2", at(1, 999)).is_some());
        assert!(feed.detect("E2", at(4, 0)).is_some());
    }

    #[test]
    fn test_cooldown_window_ends() {
        let mut feed = ScanFeed::new(2000);
        assert!(feed.detect("E1", at(0, 0)).is_some());
        assert!(feed.detect("E1", at(2, 0)).is_some());
    }

    #[test]
    fn test_read_lines() {
        let input = "E1\n\nE2\n";
        let lines: Vec<String> = read_lines(input.as_bytes())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["E1", "", "E2"]);
    }
}
