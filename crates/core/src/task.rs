// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task data model (`spec.md` §3): the persisted record plus the
//! capabilities (runner, schedule, condition, hooks, kill) a task is bound
//! to at load time.

use crate::id::TaskName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Lifecycle state of a task (`spec.md` §3 "Lifecycle").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Paused,
    Success,
    Syncing,
    Failed,
}

crate::simple_display! {
    TaskState {
        Paused => "paused",
        Success => "success",
        Syncing => "syncing",
        Failed => "failed",
    }
}

fn default_on() -> bool {
    true
}

/// The persisted view of a task: scalars, strings, and the `extra` bag only
/// (`spec.md` §3 invariant 5 — no callables cross into persisted state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: TaskName,
    #[serde(default = "default_on")]
    pub on: bool,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub last_update: i64,
    #[serde(default)]
    pub last_start: i64,
    #[serde(default)]
    pub last_finish: i64,
    #[serde(default)]
    pub next_sched: i64,
    #[serde(default)]
    pub fail_count: u32,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskRecord {
    /// A freshly configured task: `Paused`, never run (`spec.md` §3 "Lifecycle":
    /// "Initial state is Paused").
    pub fn new(name: impl Into<TaskName>, priority: f64) -> Self {
        let _ = priority; // priority is config-only, carried by `Task`, not the record
        Self {
            name: name.into(),
            on: true,
            state: TaskState::Paused,
            last_update: 0,
            last_start: 0,
            last_finish: 0,
            next_sched: 0,
            fail_count: 0,
            size: None,
            description: None,
            category: None,
            url: None,
            upstream: None,
            help_url: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Static, per-task eligibility gate (`spec.md` §3 `condition`, default true).
pub trait Condition: Send + Sync {
    fn check(&self, record: &TaskRecord) -> bool;
}

/// Always-eligible default condition.
pub struct AlwaysEligible;

impl Condition for AlwaysEligible {
    fn check(&self, _record: &TaskRecord) -> bool {
        true
    }
}

/// Next-fire calculator: `(now, task) -> epoch` (`spec.md` §3 `schedule_next`
/// / `retry_next`, and §4.B).
pub trait Schedule: Send + Sync {
    fn next(&self, now: i64, record: &TaskRecord) -> i64;
}

/// A task's runner: the work itself (`spec.md` §3 `runner`).
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, record: &TaskRecord) -> bool;
}

/// `pre`/`post` hooks around a run (`spec.md` §3 `pre`, `post`, default no-op).
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, record: &TaskRecord);
}

/// No-op hook, the default for `pre`/`post`.
pub struct NoopHook;

#[async_trait]
impl Hook for NoopHook {
    async fn call(&self, _record: &TaskRecord) {}
}

/// Capability to attempt termination of a running task (`spec.md` §3 `kill`).
/// Registered by the runner (typically the process supervisor) while a run
/// is in flight; absent otherwise.
#[async_trait]
pub trait Kill: Send + Sync {
    async fn kill(&self) -> bool;
}

/// The in-memory unit the scheduler and lifecycle engine operate on: a
/// [`TaskRecord`] bound to its capabilities. `priority` is config-only and
/// therefore lives here, not in the persisted record.
pub struct Task {
    pub record: TaskRecord,
    pub priority: f64,
    pub runner: Arc<dyn Runner>,
    pub schedule: Arc<dyn Schedule>,
    /// Custom `retry_next` override; `None` uses the default backoff in
    /// [`crate::retry::default_retry_next`].
    pub retry: Option<Arc<dyn Schedule>>,
    pub condition: Arc<dyn Condition>,
    pub pre: Arc<dyn Hook>,
    pub post: Arc<dyn Hook>,
    /// Set by the runner for the duration of a run; cleared on completion
    /// (`spec.md` §4.C step 6). Shared (not owned) so a runner built
    /// alongside the task — the process supervisor, typically — can hold
    /// the same handle and publish its kill capability without the
    /// `Runner` trait needing to thread the owning `Task` through `run`.
    pub kill: Arc<parking_lot::Mutex<Option<Arc<dyn Kill>>>>,
    /// Ticks this task has been runnable but passed over since it last won
    /// (`spec.md` §4.E step g/h, "Waited" in the glossary). Transient:
    /// resets across restarts along with scheduler fairness history.
    pub waited: AtomicU32,
}

impl Task {
    /// Builds a task with a fresh, unshared kill slot. Runners that need to
    /// publish a kill capability at runtime (the process supervisor) should
    /// instead use [`Task::with_kill_slot`], sharing the same slot the
    /// runner was built with.
    pub fn new(
        record: TaskRecord,
        priority: f64,
        runner: Arc<dyn Runner>,
        schedule: Arc<dyn Schedule>,
    ) -> Self {
        Self::with_kill_slot(record, priority, runner, schedule, Arc::new(parking_lot::Mutex::new(None)))
    }

    /// Builds a task whose kill slot is the same `Arc` the caller already
    /// handed to `runner` at construction time, so a kill request issued
    /// through the task reaches the capability the runner registered
    /// (`spec.md` §4.C step 3: "Record the child pid on the task, exposing
    /// a `kill()` capability").
    pub fn with_kill_slot(
        record: TaskRecord,
        priority: f64,
        runner: Arc<dyn Runner>,
        schedule: Arc<dyn Schedule>,
        kill: Arc<parking_lot::Mutex<Option<Arc<dyn Kill>>>>,
    ) -> Self {
        Self {
            record,
            priority,
            runner,
            schedule,
            retry: None,
            condition: Arc::new(AlwaysEligible),
            pre: Arc::new(NoopHook),
            post: Arc::new(NoopHook),
            kill,
            waited: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &TaskName {
        &self.record.name
    }

    /// `spec.md` §3 invariant 2: `state == Syncing` iff a worker is live.
    pub fn is_syncing(&self) -> bool {
        self.record.state == TaskState::Syncing
    }

    pub fn waited_count(&self) -> u32 {
        self.waited.load(Ordering::Relaxed)
    }

    pub fn bump_waited(&self) {
        self.waited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset_waited(&self) {
        self.waited.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
