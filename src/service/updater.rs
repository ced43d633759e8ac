// src/service/updater.rs

//! Periodic calendar refresh.
//!
//! Every tick (and once right after `run`) the crawler is asked for the
//! target year and the result is merged into the store. A failed crawl
//! leaves the stored data untouched.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;

use crate::crawler::Crawler;
use crate::error::{AppError, Result};
use crate::service::MIN_PERIOD;
use crate::service::worker::{Job, PeriodicTask, TaskState};
use crate::storage::HolidayStore;
use crate::utils::target_year;

/// Performs periodic holiday updates in storage.
pub struct Updater {
    task: PeriodicTask<UpdateJob>,
}

impl Updater {
    /// Create an updater. Fails if `period` is below one minute.
    pub fn new(
        store: Arc<dyn HolidayStore>,
        crawler: Arc<dyn Crawler>,
        period: Duration,
    ) -> Result<Self> {
        if period < MIN_PERIOD {
            return Err(AppError::PeriodTooShort {
                period,
                min: MIN_PERIOD,
            });
        }

        let job = Arc::new(UpdateJob {
            store,
            crawler,
            period,
        });
        Ok(Self {
            task: PeriodicTask::new(job, period).run_immediately(true),
        })
    }

    /// Start the update loop. Repeated calls do nothing.
    pub fn run(&self) {
        self.task.run();
    }

    /// Stop the update loop. Repeated calls do nothing.
    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    pub fn period(&self) -> Duration {
        self.task.period()
    }

    /// Crawl one year and merge it into the store, returning the day count.
    pub async fn refresh(&self, year: i32) -> Result<usize> {
        self.task.job().refresh(year).await
    }
}

struct UpdateJob {
    store: Arc<dyn HolidayStore>,
    crawler: Arc<dyn Crawler>,
    period: Duration,
}

impl UpdateJob {
    async fn refresh(&self, year: i32) -> Result<usize> {
        let records = self.crawler.scrape_year(year).await?;
        let count = records.len();
        self.store.set(records)?;
        Ok(count)
    }
}

impl fmt::Display for UpdateJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updater {{period: {:?}}}", self.period)
    }
}

#[async_trait]
impl Job for UpdateJob {
    async fn perform(&self) {
        let started = Instant::now();
        let year = target_year(Local::now().date_naive());
        log::debug!("perform {} for {}", self, year);

        match self.refresh(year).await {
            Ok(count) => log::info!("Updated {} days for {}", count, year),
            Err(e) => log::error!("Update for {} failed: {}", year, e),
        }

        log::info!("{} perform finished in {:?}", self, started.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;
    use crate::models::{DateRecord, DayKind};
    use crate::storage::{HolidayGetter, MemoryStore};

    const PERIOD: Duration = Duration::from_secs(60);

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed_records() -> Vec<DateRecord> {
        vec![
            DateRecord::new(day(2024, 1, 1), DayKind::Holiday),
            DateRecord::new(day(2024, 1, 6), DayKind::Weekend),
            DateRecord::new(day(2024, 2, 22), DayKind::Preholiday),
        ]
    }

    struct StubCrawler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubCrawler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Crawler for StubCrawler {
        async fn scrape_year(&self, _year: i32) -> Result<Vec<DateRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::crawl("stub", "site is down"));
            }
            Ok(fixed_records())
        }
    }

    #[test]
    fn test_new_rejects_short_period() {
        let result = Updater::new(
            Arc::new(MemoryStore::new()),
            StubCrawler::new(false),
            Duration::from_secs(59),
        );
        assert!(matches!(result, Err(AppError::PeriodTooShort { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_fills_store() {
        let store = Arc::new(MemoryStore::new());
        let crawler = StubCrawler::new(false);
        let updater = Updater::new(store.clone(), crawler.clone(), PERIOD).unwrap();

        updater.run();
        tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;

        // Once on start, once on the first tick.
        assert_eq!(crawler.calls(), 2);
        for record in fixed_records() {
            let stored = store.get(record.day).expect("record not found");
            assert_eq!(stored.kind, record.kind);
        }
        assert!(store.get(day(2024, 3, 1)).is_none());

        updater.stop();
        updater.stop();
        assert_eq!(updater.state(), TaskState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_crawl_keeps_existing_data() {
        let store = Arc::new(MemoryStore::new());
        let existing = DateRecord::new(day(2023, 12, 31), DayKind::Weekend);
        store.set(vec![existing]).unwrap();

        let crawler = StubCrawler::new(true);
        let updater = Updater::new(store.clone(), crawler.clone(), PERIOD).unwrap();
        updater.run();
        tokio::time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;
        updater.stop();

        assert_eq!(crawler.calls(), 3);
        assert_eq!(store.len(), 1);
        assert!(store.get(existing.day).is_some());
    }

    #[tokio::test]
    async fn test_refresh_reports_count() {
        let store = Arc::new(MemoryStore::new());
        let updater = Updater::new(store.clone(), StubCrawler::new(false), PERIOD).unwrap();

        assert_eq!(updater.refresh(2024).await.unwrap(), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_propagates_crawl_error() {
        let updater = Updater::new(
            Arc::new(MemoryStore::new()),
            StubCrawler::new(true),
            PERIOD,
        )
        .unwrap();

        let result = updater.refresh(2024).await;
        assert!(matches!(result, Err(AppError::Crawl { .. })));
    }
}
