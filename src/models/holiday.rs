// src/models/holiday.rs

//! Calendar day classification.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a calendar day differs from an ordinary working day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    /// Just an ordinary weekend day
    Weekend,
    /// A holiday, real or shifted from the weekend
    Holiday,
    /// A preholiday day with shortened working hours
    Preholiday,
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayKind::Weekend => "weekend",
            DayKind::Holiday => "holiday",
            DayKind::Preholiday => "preholiday",
        };
        f.write_str(s)
    }
}

/// A single classified calendar day.
///
/// Equality, hashing and ordering only look at `day`: two records for the
/// same day are the same key regardless of their kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRecord {
    /// Calendar day (no time-of-day component)
    pub day: NaiveDate,

    /// Classification of the day
    pub kind: DayKind,
}

impl DateRecord {
    pub fn new(day: NaiveDate, kind: DayKind) -> Self {
        Self { day, kind }
    }
}

impl PartialEq for DateRecord {
    fn eq(&self, other: &Self) -> bool {
        self.day == other.day
    }
}

impl Eq for DateRecord {}

impl Hash for DateRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.day.hash(state);
    }
}

impl PartialOrd for DateRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day.cmp(&other.day)
    }
}

impl fmt::Display for DateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.kind)
    }
}

/// Sort records ascending by day.
pub fn sort_by_day(records: &mut [DateRecord]) {
    records.sort_unstable();
}
