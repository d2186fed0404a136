// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reload sequence (`spec.md` §4.H): plugins → global config → tasks →
//! save, gated by the state store's load-error latch.

use super::{FieldMismatch, GlobalConfig, TaskDef};
use shine_core::{EventBus, Payload, TaskName};
use shine_storage::StateStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("task definition is missing its mandatory `name` field")]
    MissingName,
    #[error("task {task} is missing its mandatory `{field}` field")]
    MissingField { task: TaskName, field: &'static str },
    #[error("task {task} has a malformed definition: {source}")]
    Malformed { task: TaskName, source: toml::de::Error },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A subscriber module registered against the bus on every reload
/// (`spec.md` §4.H step 1 / §9 "Plugins become subscriber modules
/// registered via a stable registration API").
pub trait Plugin: Send + Sync {
    fn register(&self, bus: &EventBus);
}

/// Result of the "tasks" load step: successfully parsed definitions plus
/// the built-in-field type mismatches encountered along the way
/// (`spec.md` §4.H: mismatches latch but do not abort the whole file).
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub tasks: Vec<TaskDef>,
    pub mismatches: Vec<FieldMismatch>,
    /// Set when a task file failed to parse entirely (missing `name`,
    /// missing `runner`/`schedule`, or a malformed runner/schedule spec).
    /// These tasks are skipped, and the whole reload still latches
    /// (`spec.md` §8: "malformed definitions ... latched").
    pub hard_errors: Vec<ConfigError>,
}

impl LoadOutcome {
    pub fn had_problems(&self) -> bool {
        !self.mismatches.is_empty() || !self.hard_errors.is_empty()
    }
}

/// Reads `<config>/config.*`, `<config>/plugins/*`, `<config>/tasks/*`
/// (`spec.md` §6 filesystem layout) and drives the reload sequence.
pub struct ConfigLoader {
    config_dir: PathBuf,
    bus: Arc<EventBus>,
    store: Arc<StateStore>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl ConfigLoader {
    pub fn new(
        config_dir: impl Into<PathBuf>,
        bus: Arc<EventBus>,
        store: Arc<StateStore>,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Self {
        Self { config_dir: config_dir.into(), bus, store, plugins }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// `spec.md` §4.H step 1: clear the registry, then register each
    /// plugin in the order it was supplied.
    fn load_plugins(&self) {
        self.bus.clear_all();
        for plugin in &self.plugins {
            plugin.register(&self.bus);
        }
    }

    /// `spec.md` §4.H step 2: the daemon's own tunables
    /// (`<config>/config.toml`). Missing file behaves as an empty
    /// document (all defaults).
    fn load_global_config(&self) -> GlobalConfig {
        let path = self.config_dir.join("config.toml");
        let contents = std::fs::read_to_string(&path).unwrap_or_default();
        GlobalConfig::parse(&contents)
    }

    /// `spec.md` §4.H step 3: one definition per file under
    /// `<config>/tasks/`.
    fn load_tasks(&self) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        let dir = self.config_dir.join("tasks");
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return outcome,
        };
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match self.load_one_task(&path, &mut outcome.mismatches) {
                Ok(def) => outcome.tasks.push(def),
                Err(error) => {
                    tracing::error!(path = %path.display(), %error, "failed to load task definition");
                    outcome.hard_errors.push(error);
                }
            }
        }
        outcome
    }

    fn load_one_task(
        &self,
        path: &Path,
        mismatches: &mut Vec<FieldMismatch>,
    ) -> Result<TaskDef, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let table: toml::value::Table = toml::from_str(&contents).map_err(|source| ConfigError::Malformed {
            task: TaskName::new(path.display().to_string()),
            source,
        })?;
        TaskDef::from_table(table, mismatches)
    }

    /// Runs the full `spec.md` §4.H reload sequence: `:reload` →
    /// plugins → global config → tasks → `apply` (the caller's
    /// task-table reconciliation and persist step) → `:load`. Returns
    /// whether the reload succeeded; a `false` return means the
    /// load-error latch is set and `save()` will refuse until the next
    /// successful reload.
    pub fn reload<F>(&self, apply: F) -> bool
    where
        F: FnOnce(GlobalConfig, Vec<TaskDef>) -> bool,
    {
        self.bus.publish(":reload", Payload::None);

        self.load_plugins();
        self.bus.publish(":plugins_load", Payload::None);

        let global_config = self.load_global_config();
        self.bus.publish(":config_load", Payload::None);

        let outcome = self.load_tasks();
        self.bus.publish(":tasks_load", Payload::None);

        for mismatch in &outcome.mismatches {
            tracing::warn!(task = %mismatch.task, field = mismatch.field, "task field type mismatch, key skipped");
        }

        let had_problems = outcome.had_problems();
        if had_problems {
            self.store.set_load_error();
        } else {
            self.store.clear_load_error();
        }

        let applied = apply(global_config, outcome.tasks);
        let success = !had_problems && applied;

        self.bus.publish(":load", Payload::None);
        success
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
