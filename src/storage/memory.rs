//! In-memory holiday storage.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::error::{AppError, Result};
use crate::models::DateRecord;
use crate::storage::{HolidayGetter, HolidayStore};

/// Simple in-memory storage keyed by day.
#[derive(Debug, Default)]
pub struct MemoryStore {
    by_day: RwLock<HashMap<NaiveDate, DateRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored days.
    pub fn len(&self) -> usize {
        self.by_day.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.read().is_empty()
    }
}

impl HolidayGetter for MemoryStore {
    fn get(&self, day: NaiveDate) -> Option<DateRecord> {
        self.by_day.read().get(&day).copied()
    }

    // Naive scan over every day in the range; spans are a few years at most.
    fn get_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DateRecord>> {
        if to < from {
            return Err(AppError::InvalidRange { from, to });
        }

        let by_day = self.by_day.read();
        let records = from
            .iter_days()
            .take_while(|day| *day <= to)
            .filter_map(|day| by_day.get(&day).copied())
            .collect();

        Ok(records)
    }
}

impl HolidayStore for MemoryStore {
    fn set(&self, records: Vec<DateRecord>) -> Result<()> {
        let mut by_day = self.by_day.write();
        for record in records {
            by_day.insert(record.day, record);
        }
        Ok(())
    }

    fn dump(&self) -> Vec<DateRecord> {
        self.by_day.read().values().copied().collect()
    }
}
