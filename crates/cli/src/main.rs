// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shine`: the control-socket command client for `shined`. `spec.md` §1
//! calls this client an external collaborator, "described only via the
//! interfaces the core consumes/exposes" — this is that trivial
//! length-prefixed line client (`spec.md` §4.F/§6), grounded in
//! `original_source/shine/__main__.py`'s readline REPL and the teacher's
//! `cli/build.rs` version-stamping convention.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// `shine`: sends operator commands to a running `shined` over its
/// control socket (`spec.md` §4.F).
#[derive(Debug, Parser)]
#[command(name = "shine", version = VERSION, about = "Control client for the shine mirror-sync daemon")]
struct Cli {
    /// Overrides the control socket path resolution order (`spec.md` §6).
    #[arg(short, long, value_name = "PATH")]
    socket: Option<PathBuf>,
    /// A command to send, e.g. `shine show` or `shine stop debian`; omit
    /// to start an interactive session.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

/// `spec.md` §6 "Control socket: path chosen in priority order: `--socket`
/// argument, `/run/shine/shined.sock`, `./shined.sock`." Duplicated here
/// (rather than shared with the daemon crate) since the client is a
/// separate, deliberately minimal binary with no dependency on the
/// daemon's internals (`spec.md` §1 "out of scope").
fn socket_path(cli_socket: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_socket {
        return path;
    }
    let well_known = PathBuf::from("/run/shine/shined.sock");
    if well_known.exists() {
        return well_known;
    }
    PathBuf::from("./shined.sock")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = socket_path(cli.socket);

    if cli.command.is_empty() {
        repl(&path).await
    } else {
        let line = cli.command.join(" ");
        let reply = send_one(&path, &line).await?;
        println!("{reply}");
        Ok(())
    }
}

async fn connect(path: &PathBuf) -> Result<UnixStream> {
    UnixStream::connect(path).await.with_context(|| format!("failed to connect to {}", path.display()))
}

/// Sends one request over a fresh connection and returns its reply
/// (`spec.md` §4.F: "a connection may carry multiple request/reply pairs
/// until EOF", but a one-shot invocation only ever needs one).
async fn send_one(path: &PathBuf, line: &str) -> Result<String> {
    let mut stream = connect(path).await?;
    write_request(&mut stream, line).await?;
    read_response(&mut stream).await
}

/// A request is a single newline-terminated text line (`spec.md` §4.F/§6).
async fn write_request(stream: &mut UnixStream, line: &str) -> Result<()> {
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;
    Ok(())
}

/// A reply is a 4-byte big-endian length prefix followed by that many
/// bytes of UTF-8 text (`spec.md` §4.F/§6).
async fn read_response(stream: &mut UnixStream) -> Result<String> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .context("connection closed before a reply length arrived")?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.context("connection closed before the full reply arrived")?;
    String::from_utf8(body).context("reply was not valid UTF-8")
}

/// Interactive session over one long-lived connection, matching
/// `original_source/shine/__main__.py`'s readline loop: prompt, send each
/// non-blank line, print the reply, until EOF or `quit`/`exit`.
async fn repl(path: &PathBuf) -> Result<()> {
    let mut stream = connect(path).await?;
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    loop {
        print_prompt()?;
        line.clear();
        let bytes_read = stdin.read_line(&mut line).await.context("failed to read from stdin")?;
        if bytes_read == 0 {
            println!();
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            return Ok(());
        }
        write_request(&mut stream, trimmed).await?;
        match read_response(&mut stream).await {
            Ok(reply) => println!("{reply}"),
            Err(error) => {
                eprintln!("{error:#}");
                return Ok(());
            }
        }
    }
}

fn print_prompt() -> Result<()> {
    use std::io::Write;
    print!("shine> ");
    std::io::stdout().flush()?;
    Ok(())
}
