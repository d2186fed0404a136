// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory task table (`spec.md` §3 invariant 1: name-keyed), and the
//! single global lock guarding it (`spec.md` §5 "Global mutex").

use shine_core::{Task, TaskName};
use std::collections::HashMap;

/// Name-keyed collection of live tasks. Always accessed through the
/// daemon's single `parking_lot::Mutex` (`spec.md` §5); this type itself
/// has no locking of its own.
#[derive(Default)]
pub struct TaskTable {
    tasks: HashMap<TaskName, Task>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.insert(task.name().clone(), task);
    }

    pub fn remove(&mut self, name: &str) -> Option<Task> {
        self.tasks.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    /// `spec.md` §4.F `show`: "Rows sorted case-insensitively by name."
    pub fn names_sorted_case_insensitive(&self) -> Vec<TaskName> {
        let mut names: Vec<TaskName> = self.tasks.keys().cloned().collect();
        names.sort_by_key(|n| n.as_str().to_ascii_lowercase());
        names
    }

    pub fn syncing_count(&self) -> usize {
        self.tasks.values().filter(|t| t.is_syncing()).count()
    }
}

#[cfg(test)]
#[path = "tasktable_tests.rs"]
mod tests;
