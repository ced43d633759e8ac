// src/service/backuper.rs

//! Periodic snapshots of the store with bounded retention.
//!
//! ## Snapshot Layout
//!
//! ```text
//! {base_path}/
//! ├── holidays.2024-11-01T09-00-00.json   # oldest retained
//! ├── holidays.2024-11-08T09-00-00.json
//! └── holidays.2024-11-15T09-00-00.json   # head, used by restore
//! ```
//!
//! Names carry a fixed-width UTC timestamp so lexicographic order is
//! creation order. Files are written under a `.tmp` name and renamed into
//! place, so a failed write never leaves a file the startup scan would pick up.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{DateRecord, sort_by_day};
use crate::service::MIN_PERIOD;
use crate::service::worker::{Job, PeriodicTask, TaskState};
use crate::storage::{HolidayStore, RetentionStack};

const FILE_PREFIX: &str = "holidays.";
const FILE_SUFFIX: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";
const TIMESTAMP_LEN: usize = 19;

/// Performs periodic backups of the store and restores the latest one.
pub struct Backuper {
    task: PeriodicTask<BackupJob>,
}

impl Backuper {
    /// Create a backuper writing into `base_path`.
    ///
    /// Existing snapshot files in `base_path` are registered oldest first, so
    /// the newest becomes the restore candidate and retention applies to them
    /// as if they had been written by this instance.
    pub async fn new(
        store: Arc<dyn HolidayStore>,
        period: Duration,
        base_path: impl Into<PathBuf>,
        max_backups: usize,
    ) -> Result<Self> {
        Self::open(store, period, base_path.into(), max_backups, true).await
    }

    /// Like [`Backuper::new`], but the startup scan never deletes files.
    ///
    /// Snapshots beyond `max_backups` are only left out of the list, so
    /// looking at a directory with a lowered retention loses nothing.
    pub async fn inspect(
        store: Arc<dyn HolidayStore>,
        period: Duration,
        base_path: impl Into<PathBuf>,
        max_backups: usize,
    ) -> Result<Self> {
        Self::open(store, period, base_path.into(), max_backups, false).await
    }

    async fn open(
        store: Arc<dyn HolidayStore>,
        period: Duration,
        base_path: PathBuf,
        max_backups: usize,
        purge: bool,
    ) -> Result<Self> {
        if period < MIN_PERIOD {
            return Err(AppError::PeriodTooShort {
                period,
                min: MIN_PERIOD,
            });
        }

        let metadata = tokio::fs::metadata(&base_path).await?;
        if !metadata.is_dir() {
            return Err(AppError::config(format!(
                "'{}' is not a directory",
                base_path.display()
            )));
        }

        let job = BackupJob {
            store,
            period,
            base_path,
            files: Mutex::new(RetentionStack::new(max_backups)),
        };
        job.restore_list(purge).await?;

        Ok(Self {
            task: PeriodicTask::new(Arc::new(job), period),
        })
    }

    /// Start the backup loop. Repeated calls do nothing.
    pub fn run(&self) {
        self.task.run();
    }

    /// Stop the backup loop. Repeated calls do nothing.
    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    pub fn base_path(&self) -> &Path {
        &self.task.job().base_path
    }

    /// Retained snapshot files, newest first.
    pub fn backups(&self) -> Vec<PathBuf> {
        self.task.job().files.lock().list()
    }

    /// Write one snapshot now, returning its path.
    pub async fn snapshot(&self) -> Result<PathBuf> {
        self.task.job().snapshot().await
    }

    /// Load the newest retained snapshot into the store.
    pub async fn restore_storage(&self) -> Result<()> {
        self.task.job().restore_storage().await
    }
}

struct BackupJob {
    store: Arc<dyn HolidayStore>,
    period: Duration,
    base_path: PathBuf,
    files: Mutex<RetentionStack>,
}

impl BackupJob {
    async fn restore_list(&self, purge: bool) -> Result<()> {
        let mut matches = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_str().is_some_and(is_backup_name) && entry.file_type().await?.is_file() {
                matches.push(entry.path());
            }
        }

        // Fixed-width timestamps: name order is creation order.
        matches.sort();
        log::debug!("Found backups: {:?}", matches);

        for path in matches {
            self.preserve_file(path, purge).await;
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<PathBuf> {
        let path = self.base_path.join(generate_backup_name());
        self.collect_and_write(&path).await?;
        self.preserve_file(path.clone(), true).await;
        Ok(path)
    }

    async fn collect_and_write(&self, path: &Path) -> Result<()> {
        let mut records = self.store.dump();
        sort_by_day(&mut records);
        let bytes = serde_json::to_vec_pretty(&records)
            .map_err(|e| AppError::backup(path.display(), format!("error marshaling data: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_atomic(&tmp, path, &bytes).await {
            // Remove the partial file on error
            if let Err(rm) = tokio::fs::remove_file(&tmp).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove '{}': {}", tmp.display(), rm);
                }
            }
            return Err(AppError::backup(path.display(), format!("error writing data: {e}")));
        }
        Ok(())
    }

    /// Register a file in the retention list. The evicted one, if any, is
    /// deleted when `purge` is set.
    async fn preserve_file(&self, path: PathBuf, purge: bool) {
        let purged = {
            let mut files = self.files.lock();
            // Same-second snapshot overwrote the head file in place.
            if files.head() == Some(path.as_path()) {
                return;
            }
            files.put(path)
        };

        if let Some(purged) = purged.filter(|_| purge) {
            match tokio::fs::remove_file(&purged).await {
                Ok(()) => log::debug!("Purged backup '{}'", purged.display()),
                Err(e) => log::warn!("Failed to purge '{}': {}", purged.display(), e),
            }
        }
    }

    async fn restore_storage(&self) -> Result<()> {
        let path = self
            .files
            .lock()
            .head()
            .map(Path::to_path_buf)
            .ok_or(AppError::NoBackupAvailable)?;
        log::debug!("Restoring last backup from '{}'", path.display());

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::backup(path.display(), format!("error reading backup: {e}")))?;
        let records: Vec<DateRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::backup(path.display(), format!("error unmarshaling data: {e}")))?;

        let count = records.len();
        self.store.set(records)?;

        log::info!("Backup '{}' restored OK ({} days)", path.display(), count);
        Ok(())
    }
}

impl fmt::Display for BackupJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Backuper {{period: {:?}}}", self.period)
    }
}

#[async_trait]
impl Job for BackupJob {
    async fn perform(&self) {
        let started = Instant::now();
        log::debug!("perform {}", self);

        match self.snapshot().await {
            Ok(path) => log::info!("Backup written to '{}'", path.display()),
            Err(e) => log::error!("{}", e),
        }

        log::info!("{} perform finished in {:?}", self, started.elapsed());
    }
}

/// Write bytes to `tmp`, sync them, then rename over `path`.
async fn write_atomic(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, path).await
}

fn generate_backup_name() -> String {
    format!(
        "{FILE_PREFIX}{}{FILE_SUFFIX}",
        Utc::now().format(TIMESTAMP_FORMAT)
    )
}

fn is_backup_name(name: &str) -> bool {
    name.strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
        .is_some_and(|ts| {
            ts.len() == TIMESTAMP_LEN && NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok()
        })
}
