// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler tick loop (`spec.md` §4.E), grounded in
//! `original_source/shine/scheduler.py` for control flow and the teacher's
//! `engine/src/runtime/gate.rs` for the `sched:limit` gate shape.

use crate::daemon::Daemon;
use crate::lifecycle;
use shine_core::{Clock, Payload, TaskName, TaskState};
use std::sync::Arc;
use std::time::Duration;

/// `spec.md` §4.E "Startup reconciliation": every task observed `Syncing`
/// in persisted state did not survive a restart, so it is moved to
/// `Failed` and given its retry backoff.
pub fn reconcile_startup_state<C: Clock>(daemon: &Daemon<C>) {
    let now = daemon.now();
    let mut tasks = daemon.tasks.lock();
    for task in tasks.iter_mut() {
        if task.record.state == TaskState::Syncing {
            task.record.state = TaskState::Failed;
            task.record.last_finish = now;
            let schedule_next = task.schedule.next(now, &task.record);
            task.record.next_sched = match &task.retry {
                Some(retry) => retry.next(now, &task.record),
                None => shine_core::default_retry_next(now, task.record.fail_count, schedule_next),
            };
        }
    }
    drop(tasks);
    daemon.persist();
}

/// Scores a runnable task for winner selection (`spec.md` §4.E step g,
/// variant (a) chosen per the spec's recommendation — see `DESIGN.md`).
fn score(priority: f64, ratio: f64, waited: u32) -> f64 {
    priority * ratio + f64::from(waited)
}

/// Runs the scheduler loop until windup is observed. Each iteration is
/// `spec.md` §4.E steps 1-5; a worker is spawned per winning task rather
/// than awaited in place, so the tick loop never blocks on a run.
pub async fn run<C: Clock + 'static>(daemon: Arc<Daemon<C>>) {
    loop {
        let interval = daemon.config.lock().interval_secs.max(1);
        tokio::time::sleep(Duration::from_secs(interval)).await;

        if daemon.is_winding_up() {
            return;
        }

        if gate_vetoes(&daemon) {
            continue;
        }

        daemon.bus.publish("sched:pre", Payload::None);

        let Some(winner) = select_winner(&daemon) else {
            daemon.bus.publish("sched:post", Payload::None);
            continue;
        };

        daemon.bus.publish("sched:selected", Payload::Task(winner.clone()));
        let worker_daemon = daemon.clone();
        tokio::spawn(async move {
            lifecycle::run(worker_daemon, winner).await;
        });

        daemon.bus.publish("sched:post", Payload::None);
    }
}

/// `spec.md` §4.E step 3.a: publish `sched:limit` with concurrency/load
/// limiters able to veto this tick by setting `skip = true`.
fn gate_vetoes<C: Clock>(daemon: &Daemon<C>) -> bool {
    let limits = daemon.config.lock().limits.clone();
    let syncing = daemon.tasks.lock().syncing_count();
    if limits.max_concurrent > 0 && syncing as u32 >= limits.max_concurrent {
        return true;
    }
    if let Some((load1, load5, load15)) = read_load_average() {
        if (limits.load1 > 0.0 && load1 > limits.load1)
            || (limits.load5 > 0.0 && load5 > limits.load5)
            || (limits.load15 > 0.0 && load15 > limits.load15)
        {
            return true;
        }
    }
    // This gate applies to the whole tick, not one task; `task` carries a
    // sentinel since `Payload::SchedLimit` is otherwise task-scoped.
    let result = daemon.bus.publish(
        "sched:limit",
        Payload::SchedLimit { task: TaskName::new("*"), skip: false },
    );
    matches!(result, Payload::SchedLimit { skip: true, .. })
}

/// Reads the 1/5/15-minute load averages (`spec.md` §4.E step 3.a "load"
/// limiter). `/proc/loadavg`'s first three fields, Linux-only like the
/// rest of the process supervisor's signal handling; absent or malformed
/// (e.g. in a sandboxed test environment) just disables the limiter for
/// that tick rather than failing it.
fn read_load_average() -> Option<(f64, f64, f64)> {
    let contents = std::fs::read_to_string("/proc/loadavg").ok()?;
    let mut fields = contents.split_whitespace();
    let load1: f64 = fields.next()?.parse().ok()?;
    let load5: f64 = fields.next()?.parse().ok()?;
    let load15: f64 = fields.next()?.parse().ok()?;
    Some((load1, load5, load15))
}

/// `spec.md` §4.E steps d-h: gather runnables, score them, crown a winner,
/// and update everyone's `waited` counter.
fn select_winner<C: Clock>(daemon: &Daemon<C>) -> Option<TaskName> {
    let now = daemon.now();
    let ratio = daemon.config.lock().priority_ratio;
    let mut tasks = daemon.tasks.lock();

    let runnable_names: Vec<TaskName> = tasks
        .iter()
        .filter(|t| t.record.on && !t.is_syncing() && t.record.next_sched <= now && t.condition.check(&t.record))
        .map(|t| t.name().clone())
        .collect();

    if runnable_names.is_empty() {
        return None;
    }

    daemon.bus.publish("sched:select", Payload::None);

    let winner = runnable_names
        .iter()
        .max_by(|a, b| {
            let sa = tasks.get(a.as_str()).map(|t| score(t.priority, ratio, t.waited_count())).unwrap_or(f64::MIN);
            let sb = tasks.get(b.as_str()).map(|t| score(t.priority, ratio, t.waited_count())).unwrap_or(f64::MIN);
            sa.total_cmp(&sb)
        })
        .cloned()?;

    for name in &runnable_names {
        if let Some(task) = tasks.get_mut(name.as_str()) {
            if *name == winner {
                task.reset_waited();
            } else {
                task.bump_waited();
            }
        }
    }

    daemon.persist_locked(&tasks);
    Some(winner)
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
