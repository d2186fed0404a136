// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! All schedule math in [`crate::schedule`] and all task timestamps in
//! [`crate::task`] are expressed in epoch seconds, so the clock trait deals
//! only in that unit rather than [`std::time::Instant`] (which has no fixed
//! epoch and cannot be serialized).

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time as epoch seconds.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> i64;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<i64>>,
}

impl FakeClock {
    pub fn new(start: i64) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration.as_secs() as i64;
    }

    /// Set the clock to a specific epoch-seconds value.
    pub fn set(&self, epoch: i64) {
        *self.now.lock() = epoch;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> i64 {
        *self.now.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
