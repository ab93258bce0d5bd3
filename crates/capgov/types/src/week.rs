//! ISO calendar week keys.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The Monday-aligned ISO calendar week a date falls in.
///
/// The year component is the ISO week-numbering year, which can differ from
/// the calendar year near year boundaries (Jan 1 may belong to the previous
/// ISO year's final week). Ordering is chronological.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// All weeks spanned by `[start, end]`, inclusive on both ends.
    ///
    /// Both endpoints are snapped to their Monday, then the span is walked
    /// week by week. Callers guarantee `end >= start`; a reversed range
    /// yields an empty span rather than a panic.
    pub fn span(start: NaiveDate, end: NaiveDate) -> Vec<WeekKey> {
        let mut cursor = monday_of(start);
        let last = monday_of(end);
        let mut keys = Vec::new();
        while cursor <= last {
            keys.push(WeekKey::from_date(cursor));
            cursor += Duration::days(7);
        }
        keys
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Malformed week-key literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ISO week key: {0:?}")]
pub struct ParseWeekKeyError(pub String);

impl FromStr for WeekKey {
    type Err = ParseWeekKeyError;

    /// Parses the report format, e.g. `"2025-W37"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseWeekKeyError(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let week: u32 = week.parse().map_err(|_| err())?;
        if !(1..=53).contains(&week) {
            return Err(err());
        }
        Ok(WeekKey { year, week })
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
