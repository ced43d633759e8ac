//! Calendar sources.
//!
//! A `Crawler` turns an external calendar into classified days for one year.
//! The service treats it as an opaque, possibly slow and possibly failing call.

mod consultant;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::DateRecord;

pub use consultant::{ConsultantCrawler, parse_calendar};

/// Source of classified calendar days.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Fetch every classified day of the given calendar year.
    async fn scrape_year(&self, year: i32) -> Result<Vec<DateRecord>>;
}
