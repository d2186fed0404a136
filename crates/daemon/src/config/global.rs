// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's own tunables (`<config>/config.toml`), as distinct from
//! task/plugin definitions (`spec.md` §4.H step 2 "Global config").

use serde::Deserialize;

/// Concurrency/load limiter thresholds for the `sched:limit` gate
/// (`spec.md` §4.E step 3.a). A threshold of `0` disables that limiter,
/// matching "exceeds its configured non-zero threshold".
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_concurrent: u32,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_concurrent: 0, load1: 0.0, load5: 0.0, load15: 0.0 }
    }
}

/// `spec.md` §4.E/§5 tunables plus §6 filesystem overrides. Every field
/// has a built-in default so a missing or partial `config.toml` is not an
/// error (`spec.md` §4.H only latches on task/plugin load failures).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Scheduler tick interval, seconds (`spec.md` §4.E step 1, default 10).
    pub interval_secs: u64,
    /// `ratio` in `score(t) = priority(t) * ratio + waited(t)`
    /// (`spec.md` §4.E step 3.g, default 60).
    pub priority_ratio: f64,
    pub limits: Limits,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { interval_secs: 10, priority_ratio: 60.0, limits: Limits::default() }
    }
}

impl GlobalConfig {
    /// Parses `config.toml`'s contents, falling back to all-default on a
    /// non-integer/malformed `interval_secs`
    /// (`spec.md` §4.E step 1: "non-integer config → fall back to 10 and
    /// log").
    pub fn parse(contents: &str) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "malformed config.toml, falling back to defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "global_tests.rs"]
mod tests;
