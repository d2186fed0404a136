// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn subscribers_run_in_registration_order() {
    let bus = EventBus::new();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let o1 = order.clone();
    bus.register("task:done", move |_| o1.lock().push(1));
    let o2 = order.clone();
    bus.register("task:done", move |_| o2.lock().push(2));
    bus.publish("task:done", Payload::None);
    assert_eq!(*order.lock(), vec![1, 2]);
}

#[test]
fn prepend_runs_before_earlier_registrations() {
    let bus = EventBus::new();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let o1 = order.clone();
    bus.register("task:done", move |_| o1.lock().push("first"));
    let o2 = order.clone();
    bus.prepend("task:done", move |_| o2.lock().push("prepended"));
    bus.publish("task:done", Payload::None);
    assert_eq!(*order.lock(), vec!["prepended", "first"]);
}

#[test]
fn unrelated_topics_do_not_fire() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    bus.register("task:done", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    bus.publish("task:started", Payload::None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn a_panicking_subscriber_does_not_block_the_next() {
    let bus = EventBus::new();
    bus.register("task:done", |_| panic!("boom"));
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    bus.register("task:done", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    bus.publish("task:done", Payload::None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn clear_removes_all_subscribers_on_a_topic() {
    let bus = EventBus::new();
    bus.register("task:done", |_| panic!("should never run"));
    bus.clear("task:done");
    assert_eq!(bus.subscriber_count("task:done"), 0);
    bus.publish("task:done", Payload::None);
}

#[test]
fn clear_all_drops_every_topic() {
    let bus = EventBus::new();
    bus.register("task:done", |_| panic!("should never run"));
    bus.register("task:started", |_| panic!("should never run either"));
    bus.clear_all();
    assert_eq!(bus.subscriber_count("task:done"), 0);
    assert_eq!(bus.subscriber_count("task:started"), 0);
}

#[test]
fn sched_limit_veto_propagates_back_to_the_caller() {
    let bus = EventBus::new();
    bus.register("sched:limit", |payload| {
        if let Payload::SchedLimit { skip, .. } = payload {
            *skip = true;
        }
    });
    let result = bus.publish(
        "sched:limit",
        Payload::SchedLimit { task: TaskName::new("debian"), skip: false },
    );
    match result {
        Payload::SchedLimit { skip, .. } => assert!(skip),
        _ => panic!("expected SchedLimit payload back"),
    }
}
