//! Scoped staging files and atomic replacement.
//!
//! A [`StagedFile`] is a private, uniquely named file that is deleted when it
//! goes out of scope unless it was persisted. Persisting renames it over its
//! destination, so readers of the destination path only ever see a complete
//! file: either the previous one or the new one.

mod error;
mod staged;

pub use error::{Error, Result};
pub use staged::{StagedFile, ensure_dir, remove_dir_if_exists};

use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct ReplaceOptions {
    retry_count: u32,
    retry_delay: Duration,
}

impl Default for ReplaceOptions {
    fn default() -> Self { Self::new() }
}

impl ReplaceOptions {
    pub fn new() -> Self {
        Self {
            retry_count: 5,
            retry_delay: Duration::from_millis(20),
        }
    }

    /// Extra rename attempts made when the platform reports the destination busy.
    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Base delay; attempt `n` waits `retry_delay * n`.
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn get_retry_count(&self) -> u32 { self.retry_count }

    pub fn get_retry_delay(&self) -> Duration { self.retry_delay }
}
