// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task lifecycle engine (`spec.md` §4.D): the 11-step controller for
//! a single run, grounded in `original_source/shine/task.py::thread()`.

use crate::daemon::Daemon;
use shine_core::{default_retry_next, Clock, Payload, TaskName, TaskState};
use std::future::Future;
use std::sync::Arc;

/// Runs one task to completion. Returns `false` without doing anything if
/// the task was already `Syncing` (`spec.md` §4.D step 1 "exclusivity") or
/// has since been removed from the table.
pub async fn run<C: Clock + 'static>(daemon: Arc<Daemon<C>>, name: TaskName) -> bool {
    // Step 1-2: acquire lock, check exclusivity, transition to Syncing, persist.
    {
        let mut tasks = daemon.tasks.lock();
        let Some(task) = tasks.get_mut(name.as_str()) else {
            return false;
        };
        if task.is_syncing() {
            return false;
        }
        task.record.state = TaskState::Syncing;
        task.record.last_start = daemon.now();
    }
    daemon.persist();

    // Step 3-4: task:pre, then the pre() hook (exceptions logged, continue).
    daemon.bus.publish("task:pre", Payload::Task(name.clone()));
    let pre = {
        let tasks = daemon.tasks.lock();
        tasks.get(name.as_str()).map(|t| (t.pre.clone(), t.record.clone()))
    };
    if let Some((pre, record)) = pre {
        if catch_panicking(async move { pre.call(&record).await }).await.is_none() {
            tracing::error!(task = %name, "pre() hook panicked, continuing");
        }
    }

    // Step 5: run the runner; exceptions (panics) count as failure.
    let run_call = {
        let tasks = daemon.tasks.lock();
        tasks.get(name.as_str()).map(|t| (t.runner.clone(), t.record.clone()))
    };
    let success = match run_call {
        Some((runner, record)) => catch_panicking(async move { runner.run(&record).await }).await.unwrap_or(false),
        None => false,
    };

    // Step 6-9: reacquire lock, transition state, compute next_sched/retry.
    {
        let mut tasks = daemon.tasks.lock();
        if let Some(task) = tasks.get_mut(name.as_str()) {
            let now = daemon.now();
            if success {
                task.record.state = TaskState::Success;
                task.record.last_update = now;
                task.record.next_sched = task.schedule.next(now, &task.record);
                task.record.fail_count = 0;
            } else {
                task.record.state = TaskState::Failed;
                let schedule_next = task.schedule.next(now, &task.record);
                task.record.next_sched = match &task.retry {
                    Some(retry) => retry.next(now, &task.record),
                    None => default_retry_next(now, task.record.fail_count, schedule_next),
                };
                task.record.fail_count += 1;
            }
            if !task.record.on {
                task.record.state = TaskState::Paused;
            }
            task.record.last_finish = now;
            task.reset_waited();
        }
    }
    daemon.bus.publish(
        if success { "task:success" } else { "task:fail" },
        Payload::Task(name.clone()),
    );
    daemon.persist();

    // Step 11: post() hook, then task:post.
    let post = {
        let tasks = daemon.tasks.lock();
        tasks.get(name.as_str()).map(|t| (t.post.clone(), t.record.clone()))
    };
    if let Some((post, record)) = post {
        if catch_panicking(async move { post.call(&record).await }).await.is_none() {
            tracing::error!(task = %name, "post() hook panicked");
        }
    }
    daemon.bus.publish("task:post", Payload::Task(name));

    success
}

/// Runs `future` on a fresh task so a panic inside it (a misbehaving hook
/// or runner) is caught rather than taking down the worker driving the
/// lifecycle (`spec.md` §4.D: "Exceptions count as `false`").
async fn catch_panicking<F>(future: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(future).await {
        Ok(value) => Some(value),
        Err(join_error) => {
            tracing::error!(panicked = join_error.is_panic(), "task lifecycle hook/runner panicked");
            None
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
