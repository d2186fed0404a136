// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn first_failure_backs_off_thirty_seconds() {
    assert_eq!(default_retry_next(1_000, 0, 10_000), 1_030);
}

#[test]
fn backoff_doubles_per_failure() {
    assert_eq!(default_retry_next(1_000, 1, 10_000), 1_060);
    assert_eq!(default_retry_next(1_000, 2, 10_000), 1_120);
    assert_eq!(default_retry_next(1_000, 3, 10_000), 1_240);
}

#[test]
fn never_retries_later_than_the_regular_schedule() {
    assert_eq!(default_retry_next(1_000, 10, 1_500), 1_500);
}

#[test]
fn fail_count_cannot_overflow_the_shift() {
    let next = default_retry_next(1_000, u32::MAX, 1_000_000_000);
    assert!(next <= 1_000_000_000);
    assert!(next > 1_000);
}
