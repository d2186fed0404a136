// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::{Schedule, TaskRecord};
use std::sync::Arc;

#[test]
fn earliest_of_an_interval_and_a_cron() {
    let interval = Interval::new("1h", "0", "0-23").unwrap();
    let cron = Cron::new("0 0 * * *").unwrap();
    let combined = Earliest::new(vec![Arc::new(interval), Arc::new(cron)]);
    let record = TaskRecord::new("debian", 1.0);
    let now = 1_780_000_000;
    let expected = [
        Interval::new("1h", "0", "0-23").unwrap().next(now, &record),
        Cron::new("0 0 * * *").unwrap().next(now, &record),
    ]
    .into_iter()
    .min()
    .unwrap();
    assert_eq!(combined.next(now, &record), expected);
}

#[test]
fn schedule_errors_describe_the_problem() {
    let err = Interval::new("abc", "0", "0-23").unwrap_err();
    assert!(err.to_string().contains("interval"));
}
