// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{RunnerSpec, ScheduleSpec, TaskDef};
use crate::daemon::Daemon;
use shine_core::{EventBus, FakeClock, TaskState};
use shine_storage::StateStore;
use std::collections::HashMap;

fn def(name: &str) -> TaskDef {
    TaskDef {
        name: name.into(),
        on: true,
        priority: 5.0,
        runner: RunnerSpec::Demo { time_min_minutes: 0.0, time_max_minutes: 0.0, error_rate: 0.0 },
        schedule: ScheduleSpec::Interval { every: "1h".to_string(), randomize: None, avail_hours: None },
        retry: None,
        description: Some("a mirror".to_string()),
        category: None,
        url: None,
        upstream: None,
        help_url: None,
        extra: HashMap::new(),
    }
}

#[test]
fn a_fresh_task_starts_paused_with_the_given_priority() {
    let logs_dir = PathBuf::from("/tmp");
    let task = build_task(&def("debian"), &logs_dir).unwrap();
    assert_eq!(task.record.state, TaskState::Paused);
    assert_eq!(task.priority, 5.0);
    assert_eq!(task.record.description.as_deref(), Some("a mirror"));
}

#[test]
fn an_interval_schedule_with_defaulted_randomize_and_avail_hours_builds() {
    let logs_dir = PathBuf::from("/tmp");
    let task = build_task(&def("debian"), &logs_dir).unwrap();
    let now = 1_700_000_000;
    assert!(task.schedule.next(now, &task.record) > now);
}

#[test]
fn a_bad_schedule_spec_fails_to_build() {
    let logs_dir = PathBuf::from("/tmp");
    let mut d = def("debian");
    d.schedule = ScheduleSpec::Interval { every: "not-a-duration".to_string(), randomize: None, avail_hours: None };
    assert!(build_task(&d, &logs_dir).is_err());
}

#[test]
fn extra_keys_survive_into_the_persisted_record() {
    let logs_dir = PathBuf::from("/tmp");
    let mut d = def("debian");
    d.extra.insert("mirror_region".to_string(), toml::Value::String("us-east".to_string()));
    let task = build_task(&d, &logs_dir).unwrap();
    assert_eq!(task.record.extra.get("mirror_region").and_then(|v| v.as_str()), Some("us-east"));
}

#[test]
fn rebuilding_preserves_the_existing_lifecycle_state() {
    let logs_dir = PathBuf::from("/tmp");
    let mut task = build_task(&def("debian"), &logs_dir).unwrap();
    task.record.state = TaskState::Success;
    task.record.fail_count = 2;
    let rebuilt = rebuild_task(&def("debian"), &logs_dir, task).unwrap();
    assert_eq!(rebuilt.record.state, TaskState::Success);
    assert_eq!(rebuilt.record.fail_count, 2);
}

#[test]
fn seeding_a_persisted_record_preserves_its_lifecycle_fields_until_reconciled() {
    let mut record = TaskRecord::new("debian", 0.0);
    record.state = TaskState::Failed;
    record.fail_count = 4;
    record.next_sched = 1_700_000_500;

    let seeded = seed_task(record);
    assert_eq!(seeded.record.state, TaskState::Failed);
    assert_eq!(seeded.record.fail_count, 4);

    let rebuilt = rebuild_task(&def("debian"), &PathBuf::from("/tmp"), seeded).unwrap();
    assert_eq!(rebuilt.record.state, TaskState::Failed);
    assert_eq!(rebuilt.record.fail_count, 4);
    assert!(rebuilt.record.on);
}

#[test]
fn reconcile_orphans_tasks_not_re_seen_and_rebuilds_the_rest_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(StateStore::new(dir.path().join("state.json"), bus.clone()));
    let daemon = Daemon::new(bus, store, FakeClock::new(1_700_000_000), dir.path().join("logs"));

    let mut kept = build_task(&def("debian"), &daemon.logs_dir).unwrap();
    kept.record.state = TaskState::Success;
    kept.record.fail_count = 3;
    daemon.tasks.lock().insert(kept);
    daemon.tasks.lock().insert(build_task(&def("ubuntu"), &daemon.logs_dir).unwrap());

    let ok = reconcile(&daemon, vec![def("debian")]);
    assert!(ok);

    let tasks = daemon.tasks.lock();
    let debian = tasks.get("debian").unwrap();
    assert_eq!(debian.record.state, TaskState::Success);
    assert_eq!(debian.record.fail_count, 3);
    assert!(debian.record.on);

    let ubuntu = tasks.get("ubuntu").unwrap();
    assert!(!ubuntu.record.on);
}

#[test]
fn reconcile_reports_failure_and_drops_a_task_with_an_invalid_definition() {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(StateStore::new(dir.path().join("state.json"), bus.clone()));
    let daemon = Daemon::new(bus, store, FakeClock::new(1_700_000_000), dir.path().join("logs"));

    let mut bad = def("debian");
    bad.schedule = ScheduleSpec::Interval { every: "not-a-duration".to_string(), randomize: None, avail_hours: None };

    let ok = reconcile(&daemon, vec![bad]);
    assert!(!ok);
    assert!(!daemon.tasks.lock().contains("debian"));
}
