// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule evaluators (`spec.md` §4.B): pure `(now, task) -> next_epoch`
//! functions bound to a task's `schedule` capability. All date/time math is
//! performed in UTC — the original (`original_source/shine/helpers/{interval,cron}.py`)
//! used naive local time, which is not a meaningful concept for a daemon
//! with no fixed deployment timezone.

mod cron;
mod earliest;
mod interval;

pub use cron::Cron;
pub use earliest::Earliest;
pub use interval::Interval;

/// Errors raised while parsing a schedule specification at task-load time.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("interval must end with s/m/h/d/w: {0:?}")]
    BadIntervalUnit(String),
    #[error("invalid interval value: {0:?}")]
    InvalidInterval(String),
    #[error("interval must be within 10 years: {0}")]
    IntervalOutOfRange(i64),
    #[error("invalid avail_hours syntax: {0:?}")]
    BadAvailHours(String),
    #[error("no available hour in avail_hours spec")]
    NoAvailableHour,
    #[error("invalid cron syntax: expected 5 space-separated fields, got {0:?}")]
    BadCronArity(String),
    #[error("cron step must be positive: {0:?}")]
    BadCronStep(String),
    #[error("cron range {from}-{to} must be within {lower}-{upper}")]
    CronRangeOutOfBounds { from: i64, to: i64, lower: i64, upper: i64 },
    #[error("invalid cron field: {0:?}")]
    BadCronField(String),
    #[error("cron \"day in month\" condition can never be met: {0:?}")]
    ImpossibleCronDay(String),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
