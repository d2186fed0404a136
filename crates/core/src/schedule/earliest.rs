// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition of multiple schedules (`spec.md` §4.B "Earliest"), ported
//! from `original_source/shine/helpers/earliest.py`.

use crate::task::{Schedule, TaskRecord};
use std::sync::Arc;

/// Fires at the earliest of its component schedules' next fire times.
pub struct Earliest {
    schedules: Vec<Arc<dyn Schedule>>,
}

impl Earliest {
    pub fn new(schedules: Vec<Arc<dyn Schedule>>) -> Self {
        Self { schedules }
    }
}

impl Schedule for Earliest {
    fn next(&self, now: i64, record: &TaskRecord) -> i64 {
        self.schedules
            .iter()
            .map(|s| s.next(now, record))
            .min()
            .unwrap_or(now)
    }
}

#[cfg(test)]
#[path = "earliest_tests.rs"]
mod tests;
