// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task table's persistence (`spec.md` §4.G): one JSON array, one
//! object per task.

use crate::atomic::{write_json_atomic, StorageError};
use shine_core::{EventBus, Payload, TaskRecord};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owns the canonical state file path and the load-error latch that gates
/// `save()` (`spec.md` §7 "Configuration/load error ... save refuses until
/// next successful reload").
pub struct StateStore {
    path: PathBuf,
    bus: Arc<EventBus>,
    load_error: AtomicBool,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, bus: Arc<EventBus>) -> Self {
        Self { path: path.into(), bus, load_error: AtomicBool::new(false) }
    }

    pub fn set_load_error(&self) {
        self.load_error.store(true, Ordering::SeqCst);
    }

    pub fn clear_load_error(&self) {
        self.load_error.store(false, Ordering::SeqCst);
    }

    pub fn load_error_is_set(&self) -> bool {
        self.load_error.load(Ordering::SeqCst)
    }

    /// Missing file loads as empty; a malformed file is a fatal startup
    /// error (`spec.md` §4.G "Load is best-effort: missing file → empty;
    /// malformed → fatal at startup.").
    pub fn load(&self) -> Result<Vec<TaskRecord>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&data)?;
        Ok(records)
    }

    /// Refuses under the load-error latch; otherwise publishes `:save` (for
    /// status publishers, which write their own files during that
    /// subscription) and writes the task table atomically. A persistence
    /// error is logged and returns `false` without setting the latch
    /// (`spec.md` §7 "Persistence error ... scheduler continues").
    pub fn save(&self, records: &[TaskRecord]) -> bool {
        if self.load_error_is_set() {
            tracing::warn!("save refused: load-error latch is set");
            return false;
        }
        self.bus.publish(":save", Payload::None);
        match write_json_atomic(&self.path, records) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, path = %self.path.display(), "failed to persist state");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
