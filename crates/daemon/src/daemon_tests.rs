// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shine_core::FakeClock;

fn daemon(dir: &std::path::Path) -> Daemon<FakeClock> {
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(StateStore::new(dir.join("state.json"), bus.clone()));
    Daemon::new(bus, store, FakeClock::new(1_700_000_000), dir.join("logs"))
}

#[test]
fn windup_starts_unset() {
    let dir = tempfile::tempdir().unwrap();
    let d = daemon(dir.path());
    assert!(!d.is_winding_up());
    d.begin_windup();
    assert!(d.is_winding_up());
}

#[test]
fn now_reads_through_the_injected_clock() {
    let dir = tempfile::tempdir().unwrap();
    let d = daemon(dir.path());
    assert_eq!(d.now(), 1_700_000_000);
}

#[test]
fn persist_writes_every_task_in_the_table() {
    use async_trait::async_trait;
    use shine_core::{Runner, Schedule, Task, TaskRecord};

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
            now + 1
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let d = daemon(dir.path());
    d.tasks.lock().insert(Task::new(TaskRecord::new("debian", 1.0), 1.0, Arc::new(NeverRuns), Arc::new(FixedSchedule)));
    assert!(d.persist());
    let loaded = d.store.load().unwrap();
    assert_eq!(loaded.len(), 1);
}
