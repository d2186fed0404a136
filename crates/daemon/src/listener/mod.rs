// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket listener (`spec.md` §4.F/§6): binds a Unix stream
//! socket and accepts connections, spawning one handler task per
//! connection, grounded in the teacher's
//! `listener::Listener::run_unix_only` accept loop — simplified here to a
//! single transport (no TCP/auth handshake, per `spec.md` §6's socket-only
//! interface).

mod commands;
mod wire;

use crate::config::ConfigLoader;
use crate::daemon::Daemon;
use commands::Dispatcher;
use shine_core::Clock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    #[error("failed to bind control socket at {path}: {source}")]
    Bind { path: PathBuf, source: std::io::Error },
}

/// Binds the control socket, removing any stale socket file left behind
/// by a previous run (`original_source/shine/command.py::comm`'s
/// `os.remove(COMM_SOCK)` before `bind`).
pub fn bind(path: &Path) -> Result<UnixListener, ListenError> {
    let _ = std::fs::remove_file(path);
    UnixListener::bind(path).map_err(|source| ListenError::Bind { path: path.to_path_buf(), source })
}

/// Accepts connections until the process is killed, spawning a dedicated
/// handler per connection (`spec.md` §4.F "one handler worker per
/// accepted connection").
pub async fn run<C: Clock + 'static>(listener: UnixListener, daemon: Arc<Daemon<C>>, loader: Arc<ConfigLoader>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let dispatcher = Arc::new(Dispatcher::new(daemon.clone(), loader.clone()));
                tokio::spawn(async move {
                    if let Err(error) = handle_connection(stream, dispatcher).await {
                        tracing::warn!(%error, "control connection ended with an error");
                    }
                });
            }
            Err(error) => tracing::error!(%error, "control socket accept error"),
        }
    }
}

/// One connection's request/reply loop: a line in, a length-prefixed
/// reply out, until the client closes its end (`spec.md` §4.F/§6).
async fn handle_connection<C: Clock + 'static>(
    stream: UnixStream,
    dispatcher: Arc<Dispatcher<C>>,
) -> Result<(), wire::ProtocolError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    while let Some(line) = wire::read_request(&mut reader).await? {
        // `spec.md` §6 "Blank lines ignored": no dispatch, no reply.
        if line.trim().is_empty() {
            continue;
        }
        let reply = dispatcher.dispatch(&line).await;
        wire::write_response(&mut write_half, &reply).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
