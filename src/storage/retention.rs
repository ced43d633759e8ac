//! Bounded FIFO of snapshot file paths.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Keeps at most `max_len` paths; pushing past the bound evicts the oldest.
#[derive(Debug, Clone)]
pub struct RetentionStack {
    entries: VecDeque<PathBuf>,
    max_len: usize,
}

impl RetentionStack {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len.saturating_add(1)),
            max_len,
        }
    }

    /// Add a path. Returns the evicted oldest path if `max_len` is exceeded.
    pub fn put(&mut self, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.entries.push_back(path.into());
        if self.entries.len() > self.max_len {
            return self.entries.pop_front();
        }
        None
    }

    /// Most recently added path.
    pub fn head(&self) -> Option<&Path> {
        self.entries.back().map(PathBuf::as_path)
    }

    /// All retained paths, newest first.
    pub fn list(&self) -> Vec<PathBuf> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
