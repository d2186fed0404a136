// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-to-temp-then-rename persistence, ported from
//! `groblegark-oddjobs`'s `storage/snapshot.rs` (absent from this repo's own
//! retrieval, but the closest sibling implementation of the same idiom):
//! a crash partway through a write leaves the canonical file untouched.

use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `value` as pretty JSON to a sibling `.tmp` file, `fsync` it,
/// then atomically rename it onto `path` (`spec.md` §4.G step 3, §5 "the
/// state file is rewritten via atomic rename; published JSON files follow
/// the same temp-then-rename discipline").
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
