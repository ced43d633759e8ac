//! Utility functions and helpers.

pub mod http;

use chrono::{Datelike, NaiveDate};

/// Month from which the next calendar year is fetched instead of the current one.
pub const NEXT_YEAR_FROM_MONTH: u32 = 11;

/// Calendar year a refresh should target on `today`.
///
/// Late in the year the next year's calendar is fetched so it is in place
/// before year-end.
pub fn target_year(today: NaiveDate) -> i32 {
    if today.month() >= NEXT_YEAR_FROM_MONTH {
        today.year() + 1
    } else {
        today.year()
    }
}
