// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shine_core::EventBus;
use shine_storage::StateStore;
use std::sync::atomic::{AtomicUsize, Ordering};

fn loader(config_dir: &std::path::Path, plugins: Vec<Arc<dyn Plugin>>) -> (ConfigLoader, Arc<StateStore>) {
    let bus = Arc::new(EventBus::new());
    let store = Arc::new(StateStore::new(config_dir.join("state.json"), bus.clone()));
    (ConfigLoader::new(config_dir, bus, store.clone(), plugins), store)
}

#[test]
fn reload_with_no_config_directory_succeeds_with_no_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let (loader, store) = loader(dir.path(), vec![]);
    let ok = loader.reload(|_global, tasks| {
        assert!(tasks.is_empty());
        true
    });
    assert!(ok);
    assert!(!store.load_error_is_set());
}

#[test]
fn a_well_formed_task_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tasks")).unwrap();
    std::fs::write(
        dir.path().join("tasks/debian.toml"),
        r#"
name = "debian"
priority = 5.0

[runner]
kind = "demo"

[schedule]
kind = "interval"
every = "1h"
"#,
    )
    .unwrap();
    let (loader, _store) = loader(dir.path(), vec![]);
    let ok = loader.reload(|_global, tasks| {
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.as_str(), "debian");
        assert_eq!(tasks[0].priority, 5.0);
        true
    });
    assert!(ok);
}

#[test]
fn a_task_file_missing_name_latches_and_fails_the_reload() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tasks")).unwrap();
    std::fs::write(
        dir.path().join("tasks/broken.toml"),
        r#"
[runner]
kind = "demo"

[schedule]
kind = "interval"
every = "1h"
"#,
    )
    .unwrap();
    let (loader, store) = loader(dir.path(), vec![]);
    let ok = loader.reload(|_global, tasks| {
        assert!(tasks.is_empty());
        true
    });
    assert!(!ok);
    assert!(store.load_error_is_set());
}

#[test]
fn a_type_mismatched_built_in_field_is_skipped_not_fatal_to_the_task() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tasks")).unwrap();
    std::fs::write(
        dir.path().join("tasks/debian.toml"),
        r#"
name = "debian"
priority = "not-a-number"

[runner]
kind = "demo"

[schedule]
kind = "interval"
every = "1h"
"#,
    )
    .unwrap();
    let (loader, store) = loader(dir.path(), vec![]);
    let ok = loader.reload(|_global, tasks| {
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, 1.0);
        true
    });
    assert!(!ok);
    assert!(store.load_error_is_set());
}

#[test]
fn unknown_keys_land_in_the_extra_bag() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("tasks")).unwrap();
    std::fs::write(
        dir.path().join("tasks/debian.toml"),
        r#"
name = "debian"
mirror_region = "us-east"

[runner]
kind = "demo"

[schedule]
kind = "interval"
every = "1h"
"#,
    )
    .unwrap();
    let (loader, _store) = loader(dir.path(), vec![]);
    loader.reload(|_global, tasks| {
        assert_eq!(
            tasks[0].extra.get("mirror_region").and_then(|v| v.as_str()),
            Some("us-east")
        );
        true
    });
}

#[test]
fn plugins_are_cleared_and_re_registered_in_order_on_every_reload() {
    struct Counting(Arc<AtomicUsize>);
    impl Plugin for Counting {
        fn register(&self, bus: &EventBus) {
            let counter = self.0.clone();
            bus.register("demo:topic", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    }
    let dir = tempfile::tempdir().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let (loader, _store) = loader(dir.path(), vec![Arc::new(Counting(counter.clone()))]);
    loader.reload(|_global, _tasks| true);
    loader.reload(|_global, _tasks| true);
    // one subscriber registered per reload, stale ones cleared first
    assert_eq!(loader.bus().subscriber_count("demo:topic"), 1);
}
