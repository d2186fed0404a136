// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shined`: the mirror-sync daemon (`spec.md` §1/§2). Wires the state
//! store, configuration loader, task table, scheduler, lifecycle engine,
//! and control server into one process and drives its signal-triggered
//! shutdown/reload behavior (`spec.md` §5 "Cancellation & shutdown").

mod config;
mod daemon;
mod env;
mod error;
mod lifecycle;
mod listener;
mod scheduler;
mod supervisor;
mod taskbuild;
mod tasktable;

use clap::Parser;
use config::{ConfigLoader, Plugin};
use daemon::Daemon;
use error::StartupError;
use shine_core::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

/// `shined`: periodically synchronizes local file trees with remote
/// upstreams under scheduler/retry/process-supervision control
/// (`spec.md` §1).
#[derive(Debug, Parser)]
#[command(name = "shined", version, about = "The shine mirror-sync daemon")]
struct Cli {
    /// Overrides `CONFIGURATION_DIRECTORY` (`spec.md` §6).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
    /// Overrides `STATE_DIRECTORY`.
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,
    /// Overrides `RUNTIME_DIRECTORY`.
    #[arg(long, value_name = "DIR")]
    runtime_dir: Option<PathBuf>,
    /// Overrides `LOGS_DIRECTORY`.
    #[arg(long, value_name = "DIR")]
    logs_dir: Option<PathBuf>,
    /// Overrides the control socket path resolution order (`spec.md` §6).
    #[arg(short, long, value_name = "PATH")]
    socket: Option<PathBuf>,
}

/// `DEBUG`/`QUIET` select the default `tracing` verbosity
/// (`spec.md` §6 "Environment variables"); an explicit `RUST_LOG` always
/// wins, matching the teacher's env-filter-first convention.
fn init_tracing() {
    let default_level = if env::debug_requested() {
        "debug"
    } else if env::quiet_requested() {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(error) = run().await {
        tracing::error!(%error, "shined failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.unwrap_or_else(env::configuration_directory);
    let state_dir = cli.state_dir.unwrap_or_else(env::state_directory);
    let _runtime_dir = cli.runtime_dir.unwrap_or_else(env::runtime_directory);
    let logs_dir = cli.logs_dir.unwrap_or_else(env::logs_directory);
    let socket_path = env::socket_path(cli.socket);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_dir = %config_dir.display(),
        state_dir = %state_dir.display(),
        socket_path = %socket_path.display(),
        "shined starting"
    );

    let bus = Arc::new(shine_core::EventBus::new());
    let store = Arc::new(shine_storage::StateStore::new(state_dir.join("state.json"), bus.clone()));

    // `spec.md` §4.G: "Load is best-effort: missing file -> empty;
    // malformed -> fatal at startup."
    let persisted = store.load()?;
    let daemon = Arc::new(Daemon::new(bus.clone(), store.clone(), SystemClock, logs_dir));
    {
        let mut tasks = daemon.tasks.lock();
        for record in persisted {
            tasks.insert(taskbuild::seed_task(record));
        }
    }

    // `spec.md` §4.E "Startup reconciliation": any task left `Syncing` in
    // persisted state did not survive the previous process.
    scheduler::reconcile_startup_state(&daemon);

    // Status publishers (`spec.md` §2 component I) are a compiled-in
    // extension point, registered here — none ship by default since the
    // core spec treats tunasync/mirrorz-style renderers as out-of-scope
    // external collaborators (`spec.md` §1).
    let plugins: Vec<Arc<dyn Plugin>> = Vec::new();
    let loader = Arc::new(ConfigLoader::new(config_dir, bus.clone(), store.clone(), plugins));

    if !reload(&daemon, &loader) {
        return Err(StartupError::ReloadFailed);
    }

    let listener_socket = match listener::bind(&socket_path) {
        Ok(listener_socket) => listener_socket,
        Err(listener::ListenError::Bind { path, source }) => {
            return Err(StartupError::SocketBind { path, source })
        }
    };

    tokio::spawn(listener::run(listener_socket, daemon.clone(), loader.clone()));
    let scheduler_handle = tokio::spawn(scheduler::run(daemon.clone()));

    let mut sighup = signal(SignalKind::hangup()).map_err(StartupError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(StartupError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(StartupError::Signal)?;

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                tracing::info!("SIGHUP received, reloading configuration");
                if !reload(&daemon, &loader) {
                    tracing::error!("reload failed, continuing with the previous configuration");
                }
            }
            _ = sigint.recv() => {
                // `spec.md` §5 "SIGINT -> graceful": stop dispatching new
                // work, let in-flight workers finish on their own, then
                // save and exit.
                tracing::info!("SIGINT received, winding up (in-flight tasks will finish)");
                daemon.begin_windup();
                drain(&daemon).await;
                daemon.persist();
                break;
            }
            _ = sigterm.recv() => {
                // `spec.md` §5 "SIGTERM -> immediate": kill every running
                // task, save, and exit without waiting for anything to
                // finish on its own.
                tracing::warn!("SIGTERM received, killing running tasks and exiting");
                kill_all_running(&daemon).await;
                daemon.persist();
                break;
            }
        }
    }

    scheduler_handle.abort();
    Ok(())
}

/// `spec.md` §4.H reload sequence, applied against the live daemon state.
fn reload(daemon: &Arc<Daemon<SystemClock>>, loader: &ConfigLoader) -> bool {
    let daemon = daemon.clone();
    loader.reload(move |config, defs| {
        *daemon.config.lock() = config;
        taskbuild::reconcile(&daemon, defs)
    })
}

/// Waits for every `Syncing` task to finish on its own (`spec.md` §5
/// "in-flight task workers finish on their own"). The scheduler has
/// already stopped dispatching new work by the time this is called
/// (windup was set before the caller awaits this).
async fn drain(daemon: &Arc<Daemon<SystemClock>>) {
    loop {
        if daemon.tasks.lock().syncing_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// `spec.md` §5 "SIGTERM -> ... invoke each running task's kill": collects
/// the kill capability of every currently-syncing task, then invokes them
/// outside the task-table lock (`spec.md` §5 "suspension points ... are
/// performed without the lock held").
async fn kill_all_running(daemon: &Arc<Daemon<SystemClock>>) {
    let killers: Vec<_> = {
        let tasks = daemon.tasks.lock();
        tasks.iter().filter(|t| t.is_syncing()).filter_map(|t| t.kill.lock().clone()).collect()
    };
    for killer in killers {
        killer.kill().await;
    }
}
