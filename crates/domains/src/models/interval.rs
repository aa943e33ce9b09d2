//! # Date Ranges
//!
//! Stays are half-open: `[start, end)` covers the nights `start ..= end - 1`,
//! so a checkout on day X never collides with a check-in on day X.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// Wire format for dates: ISO `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated, non-empty date range. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = BookingError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(BookingError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses two form fields. A malformed field is reported by name before
    /// the ordering of the two dates is checked.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date("start", start)?;
        let end = parse_date("end", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The single overlap predicate used by every store and check.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parses one ISO date, naming the offending field on failure.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| BookingError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn range(s: &str, e: &str) -> DateRange {
        DateRange::new(d(s), d(e)).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(matches!(
            DateRange::new(d("2025-06-05"), d("2025-06-05")),
            Err(BookingError::InvalidRange { .. })
        ));
        assert!(matches!(
            DateRange::new(d("2025-06-06"), d("2025-06-05")),
            Err(BookingError::InvalidRange { .. })
        ));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = range("2025-06-01", "2025-06-05");
        let b = range("2025-06-05", "2025-06-10");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn overlap_is_symmetric() {
        let days = [
            "2025-06-01", "2025-06-02", "2025-06-03", "2025-06-04", "2025-06-05",
        ];
        let mut ranges = Vec::new();
        for (i, s) in days.iter().enumerate() {
            for e in &days[i + 1..] {
                ranges.push(range(s, e));
            }
        }
        for a in &ranges {
            for b in &ranges {
                assert_eq!(a.overlaps(b), b.overlaps(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn containment_and_partial_overlap() {
        let outer = range("2025-06-01", "2025-06-30");
        let inner = range("2025-06-10", "2025-06-12");
        let tail = range("2025-06-29", "2025-07-03");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&tail));
        assert!(!inner.overlaps(&tail));
    }

    #[test]
    fn parse_reports_the_bad_field() {
        match DateRange::parse("2025-01-01", "12/12/2025") {
            Err(BookingError::InvalidDate { field, value }) => {
                assert_eq!(field, "end");
                assert_eq!(value, "12/12/2025");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            DateRange::parse("2025-12-12", "2025-01-01"),
            Err(BookingError::InvalidRange { .. })
        ));
    }

    #[test]
    fn deserializing_enforces_ordering() {
        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2025-01-01","end":"2025-01-03"}"#).unwrap();
        assert_eq!(ok.nights(), 2);
        assert!(ok.contains(d("2025-01-02")));
        assert!(!ok.contains(d("2025-01-03")));

        let bad = serde_json::from_str::<DateRange>(r#"{"start":"2025-01-03","end":"2025-01-01"}"#);
        assert!(bad.is_err());
    }
}
