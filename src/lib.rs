// src/lib.rs

//! Holiday calendar keeper
//!
//! Keeps weekends, holidays and preholiday days for a year in memory,
//! refreshes them from a calendar crawler and snapshots them to disk so a
//! restart can pick up where the last run left off.

pub mod crawler;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;
pub mod utils;
