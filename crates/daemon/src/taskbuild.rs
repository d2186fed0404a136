// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The named-constructor registry (`spec.md` §9 "Dynamic config as code →
//! structured definitions"): resolves a [`TaskDef`] read from TOML into a
//! live [`Task`] bound to concrete runner/schedule capabilities.

use crate::config::{RunnerSpec, ScheduleSpec, TaskDef};
use crate::daemon::Daemon;
use crate::supervisor::ProcessSupervisor;
use shine_core::{
    Clock, Cron, Demo, Earliest, Exit0, Interval, Kill, Runner, Schedule, ScheduleError, Task, TaskRecord,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("schedule error in task {task}: {source}")]
    Schedule { task: String, source: ScheduleError },
}

fn build_schedule(spec: &ScheduleSpec, task: &str) -> Result<Arc<dyn Schedule>, BuildError> {
    let schedule: Arc<dyn Schedule> = match spec {
        ScheduleSpec::Interval { every, randomize, avail_hours } => {
            let randomize = randomize.as_deref().unwrap_or("0");
            let avail_hours = avail_hours.as_deref().unwrap_or("0-23");
            Arc::new(
                Interval::new(every, randomize, avail_hours)
                    .map_err(|source| BuildError::Schedule { task: task.to_string(), source })?,
            )
        }
        ScheduleSpec::Cron { spec } => {
            Arc::new(Cron::new(spec).map_err(|source| BuildError::Schedule { task: task.to_string(), source })?)
        }
        ScheduleSpec::Earliest { of } => {
            let subs = of.iter().map(|s| build_schedule(s, task)).collect::<Result<Vec<_>, _>>()?;
            Arc::new(Earliest::new(subs))
        }
    };
    Ok(schedule)
}

/// Resolves a runner spec into a runner plus the kill slot it shares with
/// the [`Task`] it will be bound to (`spec.md` §4.C step 3).
fn build_runner(
    spec: &RunnerSpec,
    logs_dir: &PathBuf,
) -> (Arc<dyn Runner>, Arc<parking_lot::Mutex<Option<Arc<dyn Kill>>>>) {
    match spec {
        RunnerSpec::Command { cmd, input, timeout_secs, env } => {
            let kill_slot = Arc::new(parking_lot::Mutex::new(None));
            let timeout = timeout_secs.map(std::time::Duration::from_secs);
            let supervisor = ProcessSupervisor::new(
                cmd.clone(),
                input.clone(),
                timeout,
                env.clone(),
                logs_dir.clone(),
                "shine",
                kill_slot.clone(),
            );
            (Arc::new(Exit0::new(Arc::new(supervisor))), kill_slot)
        }
        RunnerSpec::Demo { time_min_minutes, time_max_minutes, error_rate } => {
            let runner = Demo::new(*time_min_minutes as u32, *time_max_minutes as u32, *error_rate);
            (Arc::new(runner), Arc::new(parking_lot::Mutex::new(None)))
        }
    }
}

/// A runner/schedule pair used only to occupy a [`Task`]'s capability
/// slots between process startup (when persisted records are loaded) and
/// the first config reload (when [`rebuild_task`] rebinds them to the
/// definitions in `<config>/tasks/`). Never actually invoked: the
/// scheduler only dispatches tasks with `on == true`, and a freshly seeded
/// task is inert until reconciled against a loaded definition.
struct UnboundPlaceholder;

#[async_trait::async_trait]
impl Runner for UnboundPlaceholder {
    async fn run(&self, _record: &TaskRecord) -> bool {
        false
    }
}

impl Schedule for UnboundPlaceholder {
    fn next(&self, now: i64, _record: &TaskRecord) -> i64 {
        now
    }
}

/// Wraps a [`TaskRecord`] loaded from the state store into a [`Task`]
/// with placeholder capabilities, for the brief window between startup
/// load and the first `reload()` (`spec.md` §4.G "Load is best-effort";
/// §4.H reload then rebinds every task's capabilities via
/// [`rebuild_task`]).
pub fn seed_task(record: TaskRecord) -> Task {
    let priority = 0.0;
    Task::new(record, priority, Arc::new(UnboundPlaceholder), Arc::new(UnboundPlaceholder))
}

/// Builds a fresh [`Task`] from its definition, seeded with a blank
/// (`Paused`, never-run) [`TaskRecord`] — used the first time a task is
/// ever seen (`spec.md` §4.H: definitions not previously on record start
/// from scratch).
pub fn build_task(def: &TaskDef, logs_dir: &PathBuf) -> Result<Task, BuildError> {
    let schedule = build_schedule(&def.schedule, def.name.as_str())?;
    let (runner, kill_slot) = build_runner(&def.runner, logs_dir);
    let mut record = TaskRecord::new(def.name.clone(), def.priority);
    record.on = def.on;
    record.description = def.description.clone();
    record.category = def.category.clone();
    record.url = def.url.clone();
    record.upstream = def.upstream.clone();
    record.help_url = def.help_url.clone();
    record.extra = def.extra.iter().filter_map(|(k, v)| toml_to_json(v).map(|v| (k.clone(), v))).collect();

    let mut task = Task::with_kill_slot(record, def.priority, runner, schedule, kill_slot);
    if let Some(retry_spec) = &def.retry {
        task.retry = Some(build_schedule(retry_spec, def.name.as_str())?);
    }
    Ok(task)
}

/// Rebinds an existing task's capabilities to a freshly reloaded
/// definition, preserving its persisted lifecycle fields (state, history,
/// `fail_count`) — the task keeps running the same record across a
/// `reload` (`spec.md` §4.H: only un-reseen tasks become orphans).
pub fn rebuild_task(def: &TaskDef, logs_dir: &PathBuf, mut existing: Task) -> Result<Task, BuildError> {
    let schedule = build_schedule(&def.schedule, def.name.as_str())?;
    let (runner, kill_slot) = build_runner(&def.runner, logs_dir);
    existing.record.on = def.on;
    existing.record.description = def.description.clone();
    existing.record.category = def.category.clone();
    existing.record.url = def.url.clone();
    existing.record.upstream = def.upstream.clone();
    existing.record.help_url = def.help_url.clone();
    existing.record.extra = def.extra.iter().filter_map(|(k, v)| toml_to_json(v).map(|v| (k.clone(), v))).collect();
    existing.priority = def.priority;
    existing.runner = runner;
    existing.schedule = schedule;
    existing.kill = kill_slot;
    existing.retry = match &def.retry {
        Some(retry_spec) => Some(build_schedule(retry_spec, def.name.as_str())?),
        None => None,
    };
    Ok(existing)
}

fn toml_to_json(value: &toml::Value) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// Reconciles the live task table against a freshly reloaded definition
/// set (`spec.md` §4.H): re-seen tasks are rebuilt in place (preserving
/// lifecycle state), never-seen definitions are built fresh, and tasks
/// not re-seen this reload are marked orphaned (`on = false`) rather than
/// removed, so their last-known status stays visible until an operator
/// runs `remove`. Returns whether every definition built cleanly; a task
/// whose definition fails to build (e.g. an invalid schedule spec) is
/// dropped from the table and logged, and the reload is reported as
/// unsuccessful.
pub fn reconcile<C: Clock>(daemon: &Daemon<C>, defs: Vec<TaskDef>) -> bool {
    let logs_dir = daemon.logs_dir.clone();
    let mut tasks = daemon.tasks.lock();
    let mut seen = HashSet::new();
    let mut ok = true;

    for def in defs {
        seen.insert(def.name.clone());
        let built = match tasks.remove(def.name.as_str()) {
            Some(existing) => rebuild_task(&def, &logs_dir, existing),
            None => build_task(&def, &logs_dir),
        };
        match built {
            Ok(task) => tasks.insert(task),
            Err(error) => {
                tracing::error!(task = %def.name, %error, "failed to build task from definition, dropping it");
                ok = false;
            }
        }
    }

    let orphans: Vec<_> = tasks.iter().map(|t| t.name().clone()).filter(|n| !seen.contains(n)).collect();
    for name in orphans {
        if let Some(task) = tasks.get_mut(name.as_str()) {
            task.record.on = false;
        }
    }

    daemon.persist_locked(&tasks) && ok
}

#[cfg(test)]
#[path = "taskbuild_tests.rs"]
mod tests;
