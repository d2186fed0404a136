// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in runners (`spec.md` §3 `runner`): `Demo` for exercising the
//! scheduler and lifecycle engine without a real upstream, and the `Exit0`
//! combinator used to adapt an exit-code-producing runner (the process
//! supervisor) to the boolean `Runner` trait. Ported from
//! `original_source/shine/helpers/{demo,exit0}.py`.

use crate::task::{Runner, TaskRecord};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Sleeps for a random duration (in whole minutes) within `[time_min,
/// time_max]`, then succeeds unless a `error_rate`-weighted coin flip fails
/// it. Useful for exercising the scheduler without spawning real processes.
pub struct Demo {
    time_min_minutes: u32,
    time_max_minutes: u32,
    error_rate: f64,
}

impl Demo {
    pub fn new(time_min_minutes: u32, time_max_minutes: u32, error_rate: f64) -> Self {
        Self { time_min_minutes, time_max_minutes, error_rate: error_rate.clamp(0.0, 1.0) }
    }
}

#[async_trait]
impl Runner for Demo {
    async fn run(&self, record: &TaskRecord) -> bool {
        let minutes = if self.time_max_minutes > self.time_min_minutes {
            rand::rng().random_range(self.time_min_minutes..=self.time_max_minutes)
        } else {
            self.time_min_minutes
        };
        tracing::debug!(task = %record.name, minutes, "demo runner sleeping");
        tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)).await;
        let roll: f64 = rand::rng().random();
        roll >= self.error_rate
    }
}

/// A runner that reports a process-style exit code rather than a plain
/// bool; the process supervisor implements this directly.
#[async_trait]
pub trait ExitCodeRunner: Send + Sync {
    async fn run(&self, record: &TaskRecord) -> i32;
}

/// Adapts an [`ExitCodeRunner`] to [`Runner`] by treating exit code `0` as
/// success.
pub struct Exit0 {
    inner: Arc<dyn ExitCodeRunner>,
}

impl Exit0 {
    pub fn new(inner: Arc<dyn ExitCodeRunner>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Runner for Exit0 {
    async fn run(&self, record: &TaskRecord) -> bool {
        self.inner.run(record).await == 0
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
