// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared daemon state (`spec.md` §5): one task table behind one lock,
//! shared by the scheduler, lifecycle engine, control server, and
//! publishers.

use crate::config::GlobalConfig;
use crate::tasktable::TaskTable;
use shine_core::{Clock, EventBus};
use shine_storage::StateStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything the daemon's workers (scheduler tick, per-task lifecycle
/// worker, control-server handler) need, generic over [`Clock`] so tests
/// can drive time deterministically (`spec.md` §9, grounded in the
/// teacher's `Runtime<C: Clock>` pattern).
pub struct Daemon<C: Clock> {
    pub tasks: parking_lot::Mutex<TaskTable>,
    pub bus: Arc<EventBus>,
    pub store: Arc<StateStore>,
    pub clock: C,
    pub config: parking_lot::Mutex<GlobalConfig>,
    pub logs_dir: PathBuf,
    /// Set once windup (graceful shutdown) begins; the scheduler stops
    /// picking new work (`spec.md` §4.E step 2).
    windup: AtomicBool,
}

impl<C: Clock> Daemon<C> {
    pub fn new(bus: Arc<EventBus>, store: Arc<StateStore>, clock: C, logs_dir: PathBuf) -> Self {
        Self {
            tasks: parking_lot::Mutex::new(TaskTable::new()),
            bus,
            store,
            clock,
            config: parking_lot::Mutex::new(GlobalConfig::default()),
            logs_dir,
            windup: AtomicBool::new(false),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn begin_windup(&self) {
        self.windup.store(true, Ordering::SeqCst);
    }

    pub fn is_winding_up(&self) -> bool {
        self.windup.load(Ordering::SeqCst)
    }

    /// Persists every task's current record (`spec.md` §4.G `save()`).
    pub fn persist(&self) -> bool {
        self.persist_locked(&self.tasks.lock())
    }

    /// Persists while the caller already holds the task table lock
    /// (`parking_lot::Mutex` is not reentrant, so callers already inside a
    /// critical section must use this instead of [`Daemon::persist`]).
    pub fn persist_locked(&self, tasks: &TaskTable) -> bool {
        let records = tasks.iter().map(|t| t.record.clone()).collect::<Vec<_>>();
        self.store.save(&records)
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
