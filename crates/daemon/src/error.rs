// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-crate error types (`spec.md` §7 "Error taxonomy").

/// Startup-fatal errors (`spec.md` §6 "Exit codes": `1` on any of these).
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("state file is malformed: {0}")]
    MalformedState(#[from] shine_storage::StorageError),
    #[error("reload failed during startup")]
    ReloadFailed,
    #[error("failed to bind control socket at {path}: {source}")]
    SocketBind { path: std::path::PathBuf, source: std::io::Error },
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to install a signal handler: {0}")]
    Signal(std::io::Error),
}
