//! Holiday storage with optional maintenance.
//!
//! - `Updater`: periodic refresh from a `Crawler`
//! - `Backuper`: periodic snapshots with bounded retention, and restore
//! - `Service`: both loops plus the store behind one lifecycle

mod backuper;
mod updater;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::crawler::Crawler;
use crate::error::{AppError, Result};
use crate::models::{Config, DateRecord};
use crate::storage::{HolidayGetter, HolidayStore, MemoryStore};

pub use backuper::Backuper;
pub use updater::Updater;
pub use worker::TaskState;

/// Shortest period either loop accepts.
pub const MIN_PERIOD: Duration = Duration::from_secs(60);

/// Holiday storage with periodic updates and backups.
pub struct Service {
    store: Arc<dyn HolidayStore>,
    updater: Option<Updater>,
    backuper: Option<Backuper>,
}

impl Service {
    /// Create a service over a fresh in-memory store.
    pub async fn new(config: Config, crawler: Option<Arc<dyn Crawler>>) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()), crawler).await
    }

    /// Create a service over the given store.
    ///
    /// The crawler is required unless `updater.disabled` is set. When
    /// snapshotting is enabled, existing snapshot files are scanned here.
    pub async fn with_store(
        mut config: Config,
        store: Arc<dyn HolidayStore>,
        crawler: Option<Arc<dyn Crawler>>,
    ) -> Result<Self> {
        config.defaultize();
        config.validate()?;

        let updater = if config.updater.disabled {
            None
        } else {
            let crawler = crawler.ok_or_else(|| {
                AppError::config("a crawler is required unless updater.disabled is set")
            })?;
            Some(Updater::new(
                Arc::clone(&store),
                crawler,
                config.updater.period(),
            )?)
        };

        let backuper = if config.backuper.disabled {
            None
        } else {
            Some(
                Backuper::new(
                    Arc::clone(&store),
                    config.backuper.period(),
                    config.backuper.base_path.clone(),
                    config.backuper.max_backups,
                )
                .await?,
            )
        };

        Ok(Self {
            store,
            updater,
            backuper,
        })
    }

    /// Start the enabled periodic jobs.
    pub fn run(&self) {
        if let Some(updater) = &self.updater {
            updater.run();
        }
        if let Some(backuper) = &self.backuper {
            backuper.run();
        }
    }

    /// Stop all periodic jobs.
    pub fn stop(&self) {
        if let Some(updater) = &self.updater {
            updater.stop();
        }
        if let Some(backuper) = &self.backuper {
            backuper.stop();
        }
    }

    /// Load the newest snapshot into the store.
    pub async fn restore_storage(&self) -> Result<()> {
        match &self.backuper {
            Some(backuper) => backuper.restore_storage().await,
            None => Err(AppError::BackuperDisabled),
        }
    }

    pub fn store(&self) -> &Arc<dyn HolidayStore> {
        &self.store
    }

    pub fn updater(&self) -> Option<&Updater> {
        self.updater.as_ref()
    }

    pub fn backuper(&self) -> Option<&Backuper> {
        self.backuper.as_ref()
    }
}

impl HolidayGetter for Service {
    fn get(&self, day: NaiveDate) -> Option<DateRecord> {
        self.store.get(day)
    }

    fn get_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DateRecord>> {
        self.store.get_range(from, to)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::DayKind;

    struct FixedCrawler;

    #[async_trait]
    impl Crawler for FixedCrawler {
        async fn scrape_year(&self, _year: i32) -> Result<Vec<DateRecord>> {
            Ok(vec![
                DateRecord::new(day(2024, 1, 1), DayKind::Holiday),
                DateRecord::new(day(2024, 1, 7), DayKind::Weekend),
                DateRecord::new(day(2024, 3, 7), DayKind::Preholiday),
            ])
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(base_path: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.updater.period_secs = 60;
        config.backuper.period_secs = 60;
        config.backuper.base_path = base_path.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_requires_crawler_when_updater_enabled() {
        let tmp = TempDir::new().unwrap();
        let result = Service::new(config(tmp.path()), None).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_requires_base_path_when_backuper_enabled() {
        let mut config = Config::default();
        config.updater.disabled = true;
        let result = Service::new(config, None).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_rejects_short_periods() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(tmp.path());
        config.backuper.period_secs = 30;
        let result = Service::new(config, Some(Arc::new(FixedCrawler))).await;
        assert!(matches!(result, Err(AppError::PeriodTooShort { .. })));
    }

    #[tokio::test]
    async fn test_everything_disabled() {
        let mut config = Config::default();
        config.updater.disabled = true;
        config.backuper.disabled = true;

        let service = Service::new(config, None).await.unwrap();
        assert!(service.updater().is_none());
        assert!(service.backuper().is_none());
        assert!(matches!(
            service.restore_storage().await,
            Err(AppError::BackuperDisabled)
        ));

        service.run();
        service.stop();
        assert!(service.get(day(2024, 1, 1)).is_none());
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.updater.period_secs = 0;
        config.backuper.period_secs = 0;
        config.backuper.base_path = tmp.path().to_path_buf();

        let service = Service::new(config, Some(Arc::new(FixedCrawler))).await.unwrap();
        assert_eq!(
            service.updater().unwrap().period(),
            Duration::from_secs(86_400)
        );
    }

    #[tokio::test]
    async fn test_injected_crawler_ignores_http_settings() {
        let mut config = Config::default();
        config.backuper.disabled = true;
        config.crawler.base_url = "not a url".to_string();
        config.crawler.user_agent = String::new();

        let service = Service::new(config, Some(Arc::new(FixedCrawler))).await.unwrap();
        assert!(service.updater().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_then_query() {
        let mut config = Config::default();
        config.updater.period_secs = 60;
        config.backuper.disabled = true;

        let service = Service::new(config, Some(Arc::new(FixedCrawler))).await.unwrap();
        service.run();
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(service.get(day(2024, 1, 7)).unwrap().kind, DayKind::Weekend);
        assert!(service.get(day(2024, 1, 2)).is_none());

        let range = service.get_range(day(2024, 1, 1), day(2024, 1, 31)).unwrap();
        assert_eq!(range.len(), 2);
        assert!(matches!(
            service.get_range(day(2024, 2, 1), day(2024, 1, 1)),
            Err(AppError::InvalidRange { .. })
        ));

        service.stop();
        service.stop();
        assert_eq!(service.updater().unwrap().state(), TaskState::Stopped);
    }

    #[tokio::test]
    async fn test_restore_after_restart() {
        let tmp = TempDir::new().unwrap();

        let first = Service::new(config(tmp.path()), Some(Arc::new(FixedCrawler)))
            .await
            .unwrap();
        first.updater().unwrap().refresh(2024).await.unwrap();
        first.backuper().unwrap().snapshot().await.unwrap();
        drop(first);

        let second = Service::new(config(tmp.path()), Some(Arc::new(FixedCrawler)))
            .await
            .unwrap();
        assert!(second.store().dump().is_empty());
        second.restore_storage().await.unwrap();

        let mut restored = second.store().dump();
        restored.sort();
        let days: Vec<_> = restored.iter().map(|r| r.day).collect();
        assert_eq!(days, vec![day(2024, 1, 1), day(2024, 1, 7), day(2024, 3, 7)]);
    }
}
