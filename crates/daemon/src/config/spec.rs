// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured task definitions (`spec.md` §4.H, §9 "Dynamic config as code
//! → structured definitions"): tagged enums in place of the original's
//! exec-a-script-and-harvest-bindings loader.

use serde::Deserialize;
use shine_core::TaskName;
use std::collections::HashMap;
use toml::Value;

/// Runner catalogue (`spec.md` §4.H, §3 `runner`). Covers every helper in
/// `original_source/shine/helpers/` except the ones spec.md's Non-goals
/// name (distributed coordination, HTTP, protocol reimplementation).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunnerSpec {
    /// Spawns an external command under the process supervisor
    /// (`spec.md` §4.C), then treats a zero exit code as success.
    Command {
        cmd: Vec<String>,
        #[serde(default)]
        input: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Sleep-then-maybe-fail fixture, for smoke-testing definitions without
    /// an external process (`original_source/shine/helpers/demo.py`).
    Demo {
        #[serde(default = "default_time_min")]
        time_min_minutes: f64,
        #[serde(default = "default_time_max")]
        time_max_minutes: f64,
        #[serde(default)]
        error_rate: f64,
    },
}

fn default_time_min() -> f64 {
    0.0
}

fn default_time_max() -> f64 {
    1.0
}

/// Schedule catalogue (`spec.md` §4.B).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSpec {
    Interval {
        every: String,
        #[serde(default)]
        randomize: Option<String>,
        #[serde(default)]
        avail_hours: Option<String>,
    },
    Cron {
        spec: String,
    },
    Earliest {
        of: Vec<ScheduleSpec>,
    },
}

/// A built-in scalar task field that failed its type check during
/// `TaskDef::from_table` (`spec.md` §4.H: "mismatch sets the load-error
/// latch and the key is skipped").
#[derive(Debug, Clone)]
pub struct FieldMismatch {
    pub task: TaskName,
    pub field: &'static str,
}

/// One task definition, as read from `<config>/tasks/*.toml`
/// (`spec.md` §4.H step 3). `name` is mandatory; every other field has a
/// built-in default. Unknown keys land in `extra` for publishers
/// (`spec.md` §3 "extra bag"); built-in keys with the wrong TOML type are
/// dropped (recorded as a [`FieldMismatch`]) rather than failing the load.
#[derive(Debug, Clone)]
pub struct TaskDef {
    pub name: TaskName,
    pub on: bool,
    pub priority: f64,
    pub runner: RunnerSpec,
    pub schedule: ScheduleSpec,
    pub retry: Option<ScheduleSpec>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub upstream: Option<String>,
    pub help_url: Option<String>,
    pub extra: HashMap<String, Value>,
}

/// Pulls a scalar built-in field out of `table`, enforcing its declared
/// type. Absent keys use `default`; present-but-wrong-typed keys are
/// removed and recorded in `mismatches`, then fall back to `default` too.
fn take_string(
    table: &mut toml::value::Table,
    task: &TaskName,
    field: &'static str,
    mismatches: &mut Vec<FieldMismatch>,
) -> Option<String> {
    match table.remove(field) {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            mismatches.push(FieldMismatch { task: task.clone(), field });
            None
        }
    }
}

fn take_bool(
    table: &mut toml::value::Table,
    task: &TaskName,
    field: &'static str,
    default: bool,
    mismatches: &mut Vec<FieldMismatch>,
) -> bool {
    match table.remove(field) {
        None => default,
        Some(Value::Boolean(b)) => b,
        Some(_) => {
            mismatches.push(FieldMismatch { task: task.clone(), field });
            default
        }
    }
}

fn take_float(
    table: &mut toml::value::Table,
    task: &TaskName,
    field: &'static str,
    default: f64,
    mismatches: &mut Vec<FieldMismatch>,
) -> f64 {
    match table.remove(field) {
        None => default,
        Some(Value::Float(f)) => f,
        Some(Value::Integer(i)) => i as f64,
        Some(_) => {
            mismatches.push(FieldMismatch { task: task.clone(), field });
            default
        }
    }
}

impl TaskDef {
    /// Builds a definition from one `[[task]]`-shaped TOML table
    /// (`spec.md` §4.H step 3: name is mandatory, every other built-in key
    /// is type-checked, everything else falls into `extra`).
    pub fn from_table(
        mut table: toml::value::Table,
        mismatches: &mut Vec<FieldMismatch>,
    ) -> Result<Self, super::ConfigError> {
        let name: TaskName = match table.remove("name") {
            Some(Value::String(s)) => s.into(),
            _ => return Err(super::ConfigError::MissingName),
        };

        let on = take_bool(&mut table, &name, "on", true, mismatches);
        let priority = take_float(&mut table, &name, "priority", 1.0, mismatches);
        let description = take_string(&mut table, &name, "description", mismatches);
        let category = take_string(&mut table, &name, "category", mismatches);
        let url = take_string(&mut table, &name, "url", mismatches);
        let upstream = take_string(&mut table, &name, "upstream", mismatches);
        let help_url = take_string(&mut table, &name, "help_url", mismatches);

        let runner_value = table
            .remove("runner")
            .ok_or_else(|| super::ConfigError::MissingField { task: name.clone(), field: "runner" })?;
        let runner = RunnerSpec::deserialize(runner_value)
            .map_err(|source| super::ConfigError::Malformed { task: name.clone(), source })?;

        let schedule_value = table
            .remove("schedule")
            .ok_or_else(|| super::ConfigError::MissingField { task: name.clone(), field: "schedule" })?;
        let schedule = ScheduleSpec::deserialize(schedule_value)
            .map_err(|source| super::ConfigError::Malformed { task: name.clone(), source })?;

        let retry = match table.remove("retry") {
            None => None,
            Some(value) => Some(
                ScheduleSpec::deserialize(value)
                    .map_err(|source| super::ConfigError::Malformed { task: name.clone(), source })?,
            ),
        };

        let extra = table.into_iter().collect();

        Ok(Self {
            name,
            on,
            priority,
            runner,
            schedule,
            retry,
            description,
            category,
            url,
            upstream,
            help_url,
            extra,
        })
    }
}
