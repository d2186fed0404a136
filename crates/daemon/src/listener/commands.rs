// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket command dispatch (`spec.md` §4.F), grounded in
//! `original_source/shine/command.py`'s `global_cmd`/`per_task_cmd` tables
//! and verb-to-handler shape, adapted to the teacher's
//! `listener/commands.rs` convention of a dispatcher struct holding the
//! shared daemon context rather than free functions closing over module
//! globals.

use crate::config::ConfigLoader;
use crate::daemon::Daemon;
use crate::lifecycle;
use crate::taskbuild;
use shine_core::{Clock, Kill, TaskName, TaskState};
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const GLOBAL_COMMANDS: &[(&str, &str)] = &[
    ("help", "Show this help"),
    ("show", "Print status"),
    ("reload", "Reload plugins and tasks"),
    ("KiLL", "Kill all tasks and shutdown"),
];

const PER_TASK_COMMANDS: &[(&str, &str)] = &[
    ("info", "Print <task> details"),
    ("start", "Force a <task> to start"),
    ("stop", "Force a <task> to stop"),
    ("enable", "Enable a <task>"),
    ("disable", "Disable a <task>"),
    ("remove", "Remove a <task> state"),
];

/// One connection's worth of verb dispatch, bound to the shared daemon
/// state and config loader (`spec.md` §4.F "per-connection request
/// loop"). Cheap to construct per connection since it only holds `Arc`s.
pub struct Dispatcher<C: Clock> {
    daemon: Arc<Daemon<C>>,
    loader: Arc<ConfigLoader>,
}

impl<C: Clock + 'static> Dispatcher<C> {
    pub fn new(daemon: Arc<Daemon<C>>, loader: Arc<ConfigLoader>) -> Self {
        Self { daemon, loader }
    }

    /// Dispatches one request line to its handler. An unrecognized verb
    /// falls back to `help`'s output, matching
    /// `original_source/shine/command.py::handle`'s `else: result = usage()`.
    pub async fn dispatch(&self, line: &str) -> String {
        let mut parts = line.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("").trim();
        let arg = parts.next().unwrap_or("").trim();

        match verb {
            "help" => usage(),
            "show" => self.show(),
            "reload" => self.reload(),
            "KiLL" => kill_daemon(),
            "info" => self.info(arg),
            "start" => self.start(arg).await,
            "stop" => self.stop(arg).await,
            "enable" => self.toggle(arg, true),
            "disable" => self.toggle(arg, false),
            "remove" => self.remove(arg),
            _ => usage(),
        }
    }

    fn show(&self) -> String {
        let now = self.daemon.now();
        let tasks = self.daemon.tasks.lock();
        let mut rows = vec![["NAME".to_string(), "STATUS".to_string(), "LAST".to_string(), "NEXT".to_string()]];
        for name in tasks.names_sorted_case_insensitive() {
            let Some(task) = tasks.get(name.as_str()) else { continue };
            let flags = format!(
                "{}{}{name}",
                if task.record.fail_count > 0 { "!" } else { "" },
                if task.record.on { "" } else { "~" },
            );
            let status =
                if task.record.fail_count == 0 { "SUCCESS".to_string() } else { format!("{} FAIL", task.record.fail_count) };
            let last = format_duration(now - task.record.last_finish);
            let next = if task.is_syncing() {
                format!("RUNNING {}", format_duration(now - task.record.last_start))
            } else {
                format_duration(task.record.next_sched - now)
            };
            rows.push([flags, status, last, next]);
        }
        render_table(&rows)
    }

    fn info(&self, name: &str) -> String {
        if name.is_empty() {
            return "Task not specified".to_string();
        }
        let now = self.daemon.now();
        let tasks = self.daemon.tasks.lock();
        let Some(task) = tasks.get(name) else {
            return "Task not found.".to_string();
        };

        let mut r = format!("{} ({}", task.name(), if task.record.on { "on" } else { "off" });
        if task.record.fail_count == 0 {
            r += &format!("; success {} ago", format_duration(now - task.record.last_finish));
        } else {
            r += &format!("; failed({}) {} ago", task.record.fail_count, format_duration(now - task.record.last_finish));
        }
        if task.is_syncing() {
            r += &format!("; running {})\n", format_duration(now - task.record.last_start));
        } else {
            r += &format!("; next {})\n", format_duration(task.record.next_sched - now));
        }

        r += &format!("priority: {}\n", task.priority);
        r += &format!("state: {}\n", task.record.state);
        r += &format!("last_update: {}\n", task.record.last_update);
        r += &format!("last_start: {}\n", task.record.last_start);
        r += &format!("last_finish: {}\n", task.record.last_finish);
        r += &format!("next_sched: {}\n", task.record.next_sched);
        r += &format!("waited: {}\n", task.waited_count());
        if let Some(size) = task.record.size {
            r += &format!("size: {size}\n");
        }
        for (label, value) in [
            ("description", &task.record.description),
            ("category", &task.record.category),
            ("url", &task.record.url),
            ("upstream", &task.record.upstream),
            ("help_url", &task.record.help_url),
        ] {
            if let Some(v) = value {
                r += &format!("{label}: {v}\n");
            }
        }

        r += "\nConfig:\n";
        for (key, value) in &task.record.extra {
            r += &format!("{key}: {value}\n");
        }
        r
    }

    async fn start(&self, name: &str) -> String {
        if name.is_empty() {
            return "Task not specified".to_string();
        }
        {
            let tasks = self.daemon.tasks.lock();
            match tasks.get(name) {
                None => return "Task not found.".to_string(),
                Some(task) if task.is_syncing() => return "Task already running.".to_string(),
                Some(_) => {}
            }
        }
        tracing::warn!(task = name, "force starting");
        let daemon = self.daemon.clone();
        let task_name = TaskName::new(name.to_string());
        tokio::spawn(async move {
            lifecycle::run(daemon, task_name).await;
        });
        "Started.".to_string()
    }

    async fn stop(&self, name: &str) -> String {
        if name.is_empty() {
            return "Task not specified".to_string();
        }
        let kill_slot = {
            let tasks = self.daemon.tasks.lock();
            match tasks.get(name) {
                None => return "Task not found.".to_string(),
                Some(task) if !task.is_syncing() => return "Task is not running.".to_string(),
                Some(task) => task.kill.clone(),
            }
        };
        tracing::warn!(task = name, "force stopping");
        let killer = kill_slot.lock().clone();
        match killer {
            Some(k) => {
                if k.kill().await {
                    "Stopping attempted.".to_string()
                } else {
                    "Failed to stop the task.".to_string()
                }
            }
            None => "Failed to stop the task.".to_string(),
        }
    }

    fn toggle(&self, name: &str, on: bool) -> String {
        if name.is_empty() {
            return "Task not specified".to_string();
        }
        {
            let now = self.daemon.now();
            let mut tasks = self.daemon.tasks.lock();
            match tasks.get_mut(name) {
                None => return "Task not found.".to_string(),
                Some(task) if task.record.on == on => {
                    return if on { "Task not disabled.".to_string() } else { "Task not enabled.".to_string() };
                }
                Some(task) => {
                    // `spec.md` §4.F "enable ... sets next_sched = now if
                    // the task was paused" — a disabled task sits in
                    // `Paused` until re-enabled; without this it would
                    // wait out whatever `next_sched` it was last given.
                    if on && task.record.state == TaskState::Paused {
                        task.record.next_sched = now;
                    }
                    task.record.on = on;
                }
            }
        }
        self.daemon.persist();
        tracing::info!(task = name, on, "task enabled state changed via control socket");
        if on { "Enabled.".to_string() } else { "Disabled.".to_string() }
    }

    fn remove(&self, name: &str) -> String {
        if name.is_empty() {
            return "Task not specified".to_string();
        }
        {
            let tasks = self.daemon.tasks.lock();
            match tasks.get(name) {
                None => return "Task not found.".to_string(),
                Some(task) if task.is_syncing() => return "Task still running.".to_string(),
                Some(_) => {}
            }
        }
        self.daemon.tasks.lock().remove(name);
        self.daemon.persist();
        tracing::warn!(task = name, "task state removed via control socket");
        "Task state removed, please delete config manually.".to_string()
    }

    /// `spec.md` §4.H reload sequence driven from the control socket.
    fn reload(&self) -> String {
        let daemon = self.daemon.clone();
        let ok = self.loader.reload(|config, defs| {
            *daemon.config.lock() = config;
            taskbuild::reconcile(&daemon, defs)
        });
        if ok {
            "Reconfigured.".to_string()
        } else {
            "Error occured reconfiguring. Check log output for details.".to_string()
        }
    }
}

/// `spec.md` §4.F "KiLL": sends SIGTERM to the whole process, which the
/// daemon's own signal handler treats as an immediate-shutdown request
/// (`original_source/shine/command.py::kill`'s `os.kill(0, SIGTERM)`).
fn kill_daemon() -> String {
    let _ = nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM);
    "Goodbye.".to_string()
}

fn usage() -> String {
    let mut r = format!("Shine v{VERSION}\n\nGlobal commands:\n");
    for (cmd, desc) in GLOBAL_COMMANDS {
        r += &format!("{cmd:<10}{desc}\n");
    }
    r += "\nPer-task commands:\n";
    for (cmd, desc) in PER_TASK_COMMANDS {
        r += &format!("{cmd:<10}{desc}\n");
    }
    r
}

fn render_table(rows: &[[String; 4]]) -> String {
    let widths: Vec<usize> = (0..4).map(|i| rows.iter().map(|r| r[i].len()).max().unwrap_or(0) + 1).collect();
    rows.iter()
        .map(|row| (0..4).map(|i| format!("{:<width$}", row[i], width = widths[i])).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a signed second count the way `show`/`info` display elapsed and
/// remaining time (`original_source/shine/command.py::_time_duration`):
/// largest-unit-first `h`/`m`/`s` components, seconds dropped once an hour
/// is present, and the literal `now` for exactly zero.
fn format_duration(secs: i64) -> String {
    if secs == 0 {
        return "now".to_string();
    }
    let magnitude = secs.unsigned_abs();
    let h = magnitude / 3600;
    let m = (magnitude % 3600) / 60;
    let s = magnitude % 60;

    let mut out = String::new();
    if secs < 0 {
        out.push('-');
    }
    if h != 0 {
        out += &format!("{h}h");
    }
    if m != 0 {
        out += &format!("{m}m");
    }
    if s != 0 && h == 0 {
        out += &format!("{s}s");
    }
    out
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
