// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::TaskRecord;

struct Fixed(i64);

impl Schedule for Fixed {
    fn next(&self, _now: i64, _record: &TaskRecord) -> i64 {
        self.0
    }
}

#[test]
fn picks_the_smallest_next_fire_time() {
    let earliest = Earliest::new(vec![Arc::new(Fixed(300)), Arc::new(Fixed(100)), Arc::new(Fixed(200))]);
    assert_eq!(earliest.next(0, &TaskRecord::new("debian", 1.0)), 100);
}

#[test]
fn single_schedule_passes_through() {
    let earliest = Earliest::new(vec![Arc::new(Fixed(42))]);
    assert_eq!(earliest.next(0, &TaskRecord::new("debian", 1.0)), 42);
}
