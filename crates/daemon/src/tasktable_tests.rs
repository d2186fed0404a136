// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use shine_core::{Runner, Schedule, Task, TaskRecord};
use std::sync::Arc;

struct NeverRuns;

#[async_trait]
impl Runner for NeverRuns {
    async fn run(&self, _record: &TaskRecord) -> bool {
        false
    }
}

struct FixedSchedule;

impl Schedule for FixedSchedule {
    fn next(&self, now: i64, _record: &TaskRecord) -> i64 {
        now + 100
    }
}

fn task(name: &str) -> Task {
    Task::new(TaskRecord::new(name, 1.0), 1.0, Arc::new(NeverRuns), Arc::new(FixedSchedule))
}

#[test]
fn insert_and_get_round_trip() {
    let mut table = TaskTable::new();
    table.insert(task("debian"));
    assert!(table.get("debian").is_some());
    assert_eq!(table.len(), 1);
}

#[test]
fn remove_drops_the_task() {
    let mut table = TaskTable::new();
    table.insert(task("debian"));
    assert!(table.remove("debian").is_some());
    assert!(table.is_empty());
}

#[test]
fn names_are_sorted_case_insensitively() {
    let mut table = TaskTable::new();
    table.insert(task("Zebra"));
    table.insert(task("alpine"));
    table.insert(task("Debian"));
    let names: Vec<String> = table.names_sorted_case_insensitive().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["alpine", "Debian", "Zebra"]);
}

#[test]
fn syncing_count_reflects_live_state() {
    let mut table = TaskTable::new();
    let mut t = task("debian");
    t.record.state = shine_core::TaskState::Syncing;
    table.insert(t);
    table.insert(task("alpine"));
    assert_eq!(table.syncing_count(), 1);
}
