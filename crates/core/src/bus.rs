// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous event bus (`spec.md` §4.A), ported from
//! `original_source/shine/eventmgr.py`'s `EventManager`: subscribers are
//! called in registration order, under a single lock, with exceptions
//! (panics, here) from one subscriber never stopping the rest.

use crate::id::TaskName;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Argument passed to subscribers. `SchedLimit` carries a mutable veto: any
/// subscriber may set `skip = true` to have the scheduler pass over a task
/// this tick (`spec.md` §4.E "load gate").
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Task(TaskName),
    SchedLimit { task: TaskName, skip: bool },
    Json(serde_json::Value),
}

impl Payload {
    pub fn task_name(&self) -> Option<&TaskName> {
        match self {
            Payload::Task(name) => Some(name),
            Payload::SchedLimit { task, .. } => Some(task),
            _ => None,
        }
    }
}

type Callback = dyn Fn(&mut Payload) + Send + Sync;

struct Registration {
    callback: Arc<Callback>,
}

/// A synchronous, in-process pub/sub bus. One instance is shared across the
/// daemon (scheduler, lifecycle engine, supervisor, control server,
/// publishers) via `Arc`.
#[derive(Default)]
pub struct EventBus {
    registry: parking_lot::Mutex<std::collections::HashMap<String, Vec<Registration>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber to `topic` (`spec.md` §4.A `register`).
    pub fn register(&self, topic: impl Into<String>, callback: impl Fn(&mut Payload) + Send + Sync + 'static) {
        self.insert(topic, callback, false);
    }

    /// Insert a subscriber at the front of `topic`'s list, so it runs before
    /// previously registered subscribers (`spec.md` §4.A `register(insert=true)`).
    pub fn prepend(&self, topic: impl Into<String>, callback: impl Fn(&mut Payload) + Send + Sync + 'static) {
        self.insert(topic, callback, true);
    }

    fn insert(&self, topic: impl Into<String>, callback: impl Fn(&mut Payload) + Send + Sync + 'static, front: bool) {
        let topic = topic.into();
        let mut registry = self.registry.lock();
        let subscribers = registry.entry(topic).or_default();
        let registration = Registration { callback: Arc::new(callback) };
        if front {
            subscribers.insert(0, registration);
        } else {
            subscribers.push(registration);
        }
    }

    /// Drop every subscriber on `topic`. Used by tests and by reload to
    /// re-register publishers against a fresh config.
    pub fn clear(&self, topic: &str) {
        self.registry.lock().remove(topic);
    }

    /// Drop every subscriber on every topic (`spec.md` §4.H step 1: "Clear
    /// registry, then load each [plugin] in registered order").
    pub fn clear_all(&self) {
        self.registry.lock().clear();
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry.lock().get(topic).map_or(0, Vec::len)
    }

    /// Call every subscriber of `topic` in order, under the bus lock, with
    /// `payload`. A subscriber that panics is caught and logged; it does not
    /// prevent later subscribers on the same topic from running
    /// (`original_source/shine/eventmgr.py`'s `except Exception`).
    pub fn publish(&self, topic: &str, mut payload: Payload) -> Payload {
        tracing::debug!(topic, "event published");
        // Clone the callback Arcs out from under the lock so a subscriber
        // that itself calls `publish` (e.g. a hook firing a nested event)
        // cannot deadlock on a non-reentrant mutex.
        let callbacks: Vec<Arc<Callback>> = {
            let registry = self.registry.lock();
            registry
                .get(topic)
                .map(|subs| subs.iter().map(|r| r.callback.clone()).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            let result = catch_unwind(AssertUnwindSafe(|| callback(&mut payload)));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(topic, message, "subscriber panicked handling event");
            }
        }
        payload
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
