// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store(dir: &tempfile::TempDir) -> StateStore {
    StateStore::new(dir.path().join("state.json"), Arc::new(EventBus::new()))
}

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let records = store(&dir).load().unwrap();
    assert!(records.is_empty());
}

#[test]
fn malformed_file_is_a_fatal_load_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("state.json"), "not json").unwrap();
    assert!(store(&dir).load().is_err());
}

#[test]
fn save_then_load_round_trips_every_persisted_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let mut record = TaskRecord::new("debian", 5.0);
    record.fail_count = 3;
    record.last_finish = 1_700_000_000;
    assert!(store.save(&[record.clone()]));
    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, record.name);
    assert_eq!(loaded[0].fail_count, 3);
    assert_eq!(loaded[0].last_finish, 1_700_000_000);
}

#[test]
fn save_refuses_under_the_load_error_latch() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.set_load_error();
    assert!(!store.save(&[TaskRecord::new("debian", 1.0)]));
    assert!(!dir.path().join("state.json").exists());
}

#[test]
fn clearing_the_latch_allows_save_again() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.set_load_error();
    store.clear_load_error();
    assert!(store.save(&[TaskRecord::new("debian", 1.0)]));
}

#[test]
fn save_publishes_the_save_event_for_status_publishers() {
    let dir = tempfile::tempdir().unwrap();
    let bus = Arc::new(EventBus::new());
    let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let f = fired.clone();
    bus.register(":save", move |_| {
        f.store(true, Ordering::SeqCst);
    });
    let store = StateStore::new(dir.path().join("state.json"), bus);
    store.save(&[]);
    assert!(fired.load(Ordering::SeqCst));
}
