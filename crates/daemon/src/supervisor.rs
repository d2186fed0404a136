// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process supervisor (`spec.md` §4.C): spawns the external command a
//! `RunnerSpec::Command` task definition names, merges stdout/stderr into a
//! per-run log file, and escalates SIGTERM → SIGKILL on timeout.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use shine_core::{ExitCodeRunner, Kill, TaskRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to open log file {path}: {source}")]
    LogFile { path: PathBuf, source: std::io::Error },
    #[error("failed to spawn {cmd:?}: {source}")]
    Spawn { cmd: Vec<String>, source: std::io::Error },
}

/// SIGTERM's a pid (`spec.md` §4.C step 3/§4.D `kill()`: "SIGTERM task.pid;
/// return ok"). Never valid after the run completes — the slot is cleared
/// at that point (`spec.md` §4.C step 6).
struct ProcessKill(i32);

#[async_trait::async_trait]
impl Kill for ProcessKill {
    async fn kill(&self) -> bool {
        kill(Pid::from_raw(self.0), Signal::SIGTERM).is_ok()
    }
}

/// Spawns `cmd` under `supervise::run`'s contract, recording the pid on
/// `kill_slot` for the run's duration.
pub struct ProcessSupervisor {
    cmd: Vec<String>,
    input: Option<String>,
    timeout: Option<Duration>,
    env: HashMap<String, String>,
    logs_dir: PathBuf,
    log_prefix: &'static str,
    kill_slot: Arc<parking_lot::Mutex<Option<Arc<dyn Kill>>>>,
    last_log_path: parking_lot::Mutex<Option<PathBuf>>,
}

impl ProcessSupervisor {
    pub fn new(
        cmd: Vec<String>,
        input: Option<String>,
        timeout: Option<Duration>,
        env: HashMap<String, String>,
        logs_dir: PathBuf,
        log_prefix: &'static str,
        kill_slot: Arc<parking_lot::Mutex<Option<Arc<dyn Kill>>>>,
    ) -> Self {
        Self { cmd, input, timeout, env, logs_dir, log_prefix, kill_slot, last_log_path: parking_lot::Mutex::new(None) }
    }

    /// Path of the log file written by the most recently completed run.
    pub fn last_log_path(&self) -> Option<PathBuf> {
        self.last_log_path.lock().clone()
    }

    fn log_path(&self, task_name: &str, now: chrono::DateTime<chrono::Utc>) -> PathBuf {
        let stamp = now.format("%Y%m%d-%H%M%S");
        self.logs_dir.join(format!("{}-{}-{}.log", self.log_prefix, task_name, stamp))
    }

    /// `spec.md` §4.C: spawn, feed stdin, wait with a SIGTERM→SIGKILL
    /// escalation cascade on timeout, return the exit code (or `-1` on a
    /// launch/IO error, treated as a failed run by the caller).
    pub async fn run(&self, record: &TaskRecord) -> i32 {
        match self.run_inner(record).await {
            Ok(code) => code,
            Err(error) => {
                tracing::error!(task = %record.name, %error, "process supervisor launch/IO error");
                -1
            }
        }
    }

    async fn run_inner(&self, record: &TaskRecord) -> Result<i32, SupervisorError> {
        let now = chrono::Utc::now();
        let log_path = self.log_path(record.name.as_str(), now);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let log_file = std::fs::File::create(&log_path)
            .map_err(|source| SupervisorError::LogFile { path: log_path.clone(), source })?;
        let log_file_err = log_file
            .try_clone()
            .map_err(|source| SupervisorError::LogFile { path: log_path.clone(), source })?;
        *self.last_log_path.lock() = Some(log_path);

        let (program, args) = self.cmd.split_first().ok_or_else(|| SupervisorError::Spawn {
            cmd: self.cmd.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&self.env)
            .stdin(if self.input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err));

        let mut child = command
            .spawn()
            .map_err(|source| SupervisorError::Spawn { cmd: self.cmd.clone(), source })?;

        if let (Some(input), Some(mut stdin)) = (self.input.as_ref(), child.stdin.take()) {
            let _ = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
        }

        if let Some(pid) = child.id() {
            *self.kill_slot.lock() = Some(Arc::new(ProcessKill(pid as i32)));
        }

        let status = self.wait_with_timeout(&mut child).await;

        *self.kill_slot.lock() = None;

        Ok(status.code().unwrap_or(-1))
    }

    /// `spec.md` §4.C step 5: on timeout, SIGTERM, then wait up to 10s at a
    /// time, re-SIGTERM, escalating to SIGKILL if still alive after each
    /// wait.
    async fn wait_with_timeout(&self, child: &mut tokio::process::Child) -> std::process::ExitStatus {
        let Some(timeout) = self.timeout else {
            return child.wait().await.unwrap_or_else(|_| fallback_status());
        };
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(_)) => fallback_status(),
            Err(_) => self.escalate(child).await,
        }
    }

    async fn escalate(&self, child: &mut tokio::process::Child) -> std::process::ExitStatus {
        let Some(pid) = child.id() else {
            return fallback_status();
        };
        let pid = Pid::from_raw(pid as i32);
        let _ = kill(pid, Signal::SIGTERM);
        loop {
            match tokio::time::timeout(Duration::from_secs(10), child.wait()).await {
                Ok(Ok(status)) => return status,
                Ok(Err(_)) => return fallback_status(),
                Err(_) => {
                    let _ = kill(pid, Signal::SIGTERM);
                    if still_alive(pid) {
                        let _ = kill(pid, Signal::SIGKILL);
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ExitCodeRunner for ProcessSupervisor {
    async fn run(&self, record: &TaskRecord) -> i32 {
        ProcessSupervisor::run(self, record).await
    }
}

fn still_alive(pid: Pid) -> bool {
    kill(pid, None).is_ok()
}

fn fallback_status() -> std::process::ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(-1)
    }
    #[cfg(not(unix))]
    {
        unreachable!("shined is unix-only")
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
