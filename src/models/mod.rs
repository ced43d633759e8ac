// src/models/mod.rs

//! Domain models for the holiday calendar service.

mod config;
mod holiday;

// Re-export all public types
pub use config::{BackuperConfig, Config, CrawlerConfig, UpdaterConfig};
pub use holiday::{DateRecord, DayKind, sort_by_day};
