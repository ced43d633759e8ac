// src/error.rs

//! Unified error handling for the holiday calendar service.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Loop period below the allowed floor
    #[error("Period is too low: {period:?} < {min:?}")]
    PeriodTooShort { period: Duration, min: Duration },

    /// Range query with `to` before `from`
    #[error("Invalid range: {from} > {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Restore requested but no snapshot is retained
    #[error("No backup files available")]
    NoBackupAvailable,

    /// Restore requested on a service without snapshotting
    #[error("Backuper is disabled")]
    BackuperDisabled,

    /// Snapshot file could not be written, read or decoded
    #[error("Backup error for {path}: {message}")]
    Backup { path: String, message: String },

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a snapshot error with the offending path.
    pub fn backup(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Backup {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
