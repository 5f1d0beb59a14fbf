//! Sliding-window rate limit for service-request creation
//!
//! Evaluated at request time against the live creation timestamps for the
//! table, never against a maintained counter. There is no cleanup task; old
//! rows simply fall out of the window.

use shared::error::{AppError, AppResult};

/// Per-table creation limit over a trailing time window.
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindow {
    max_requests: u32,
    window_ms: i64,
}

impl SlidingWindow {
    pub fn new(max_requests: u32, window_ms: i64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    /// Earliest creation timestamp that still counts at `now`.
    pub fn window_start(&self, now: i64) -> i64 {
        now - self.window_ms
    }

    /// Number of timestamps inside the window at `now`.
    pub fn count_in_window(&self, timestamps: &[i64], now: i64) -> u32 {
        let start = self.window_start(now);
        timestamps.iter().filter(|&&ts| ts >= start && ts <= now).count() as u32
    }

    /// Reject when the window already holds the maximum. The caller passes
    /// the creation timestamps it read for the same (tenant, table); nothing
    /// is written on rejection.
    pub fn check(&self, timestamps: &[i64], now: i64) -> AppResult<()> {
        if self.count_in_window(timestamps, now) >= self.max_requests {
            return Err(AppError::rate_limited());
        }
        Ok(())
    }
}
