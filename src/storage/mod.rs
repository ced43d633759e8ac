//! Storage abstractions for classified calendar days.
//!
//! - `MemoryStore`: in-process table keyed by day, guarded by a reader/writer lock
//! - `RetentionStack`: bounded list of snapshot file names, oldest evicted first

pub mod memory;
pub mod retention;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::DateRecord;

// Re-export for convenience
pub use memory::MemoryStore;
pub use retention::RetentionStack;

/// Read access to stored days.
pub trait HolidayGetter: Send + Sync {
    /// Find the record for a day, if any.
    fn get(&self, day: NaiveDate) -> Option<DateRecord>;

    /// Records between `from` and `to` inclusive, ascending by day.
    ///
    /// Fails with `InvalidRange` when `to` precedes `from`.
    fn get_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DateRecord>>;
}

/// Trait for holiday storage backends.
pub trait HolidayStore: HolidayGetter {
    /// Merge records into the table by day.
    ///
    /// Days absent from `records` are left untouched.
    fn set(&self, records: Vec<DateRecord>) -> Result<()>;

    /// All stored records in unspecified order.
    fn dump(&self) -> Vec<DateRecord>;
}
