// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate
//! (`spec.md` §6 "Environment variables").

use std::path::PathBuf;

fn dir_or_dot(var: &str) -> PathBuf {
    std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// `<config>` root: `config.*`, `plugins/*`, `tasks/*` live here.
pub fn configuration_directory() -> PathBuf {
    dir_or_dot("CONFIGURATION_DIRECTORY")
}

/// `<state>` root: `state.json` lives here.
pub fn state_directory() -> PathBuf {
    dir_or_dot("STATE_DIRECTORY")
}

/// `<runtime>` root: `shined.sock` and `api/*.json` live here.
pub fn runtime_directory() -> PathBuf {
    dir_or_dot("RUNTIME_DIRECTORY")
}

/// `<logs>` root: per-run task logs live here.
pub fn logs_directory() -> PathBuf {
    dir_or_dot("LOGS_DIRECTORY")
}

/// Verbose logging requested via `DEBUG=1`.
pub fn debug_requested() -> bool {
    is_truthy("DEBUG")
}

/// Quiet logging requested via `QUIET=1`.
pub fn quiet_requested() -> bool {
    is_truthy("QUIET")
}

fn is_truthy(var: &str) -> bool {
    std::env::var(var).map(|v| !v.is_empty() && v != "0").unwrap_or(false)
}

/// Socket path resolution order (`spec.md` §6): `--socket` argument,
/// `/run/shine/shined.sock`, `./shined.sock`.
pub fn socket_path(cli_socket: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_socket {
        return path;
    }
    let well_known = PathBuf::from("/run/shine/shined.sock");
    if well_known
        .parent()
        .map(|p| p.exists())
        .unwrap_or(false)
    {
        return well_known;
    }
    PathBuf::from("./shined.sock")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
