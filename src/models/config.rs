//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Periodic calendar refresh settings
    #[serde(default)]
    pub updater: UpdaterConfig,

    /// Periodic snapshot settings
    #[serde(default)]
    pub backuper: BackuperConfig,

    /// HTTP settings for the calendar crawler
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Replace unset (zero) periods with their defaults.
    pub fn defaultize(&mut self) {
        if self.updater.period_secs == 0 {
            self.updater.period_secs = defaults::update_period();
        }
        if self.backuper.period_secs == 0 {
            self.backuper.period_secs = defaults::backup_period();
        }
        if self.crawler.timeout_secs == 0 {
            self.crawler.timeout_secs = defaults::timeout();
        }
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Period floors are enforced when the loops are constructed, and the
    /// `[crawler]` section by `CrawlerConfig::validate`.
    pub fn validate(&self) -> Result<()> {
        if !self.backuper.disabled && self.backuper.base_path.as_os_str().is_empty() {
            return Err(AppError::config("backuper.base_path can't be empty"));
        }
        Ok(())
    }
}

/// Calendar refresh loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Skip periodic refreshes entirely
    #[serde(default)]
    pub disabled: bool,

    /// Refresh period in seconds
    #[serde(default = "defaults::update_period")]
    pub period_secs: u64,
}

impl UpdaterConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            period_secs: defaults::update_period(),
        }
    }
}

/// Snapshot loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackuperConfig {
    /// Skip snapshots and restore entirely
    #[serde(default)]
    pub disabled: bool,

    /// Snapshot period in seconds
    #[serde(default = "defaults::backup_period")]
    pub period_secs: u64,

    /// Existing directory holding snapshot files
    #[serde(default)]
    pub base_path: PathBuf,

    /// Number of snapshot files to retain
    #[serde(default = "defaults::max_backups")]
    pub max_backups: usize,
}

impl BackuperConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for BackuperConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            period_secs: defaults::backup_period(),
            base_path: PathBuf::new(),
            max_backups: defaults::max_backups(),
        }
    }
}

/// HTTP client settings for the calendar crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Calendar page prefix; the year and a trailing slash are appended
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl CrawlerConfig {
    /// Check the HTTP settings. Only the built-in crawler reads them.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        Url::parse(&self.base_url)?;
        Ok(())
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    // Loop defaults
    pub fn update_period() -> u64 {
        24 * 60 * 60
    }
    pub fn backup_period() -> u64 {
        7 * 24 * 60 * 60
    }
    pub fn max_backups() -> usize {
        4
    }

    // Crawler defaults
    pub fn base_url() -> String {
        "http://www.consultant.ru/law/ref/calendar/proizvodstvennye/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; holidays/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}
