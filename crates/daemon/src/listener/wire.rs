// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing for the control socket (`spec.md` §4.F/§6): a request is a
//! single newline-terminated text line; a reply is a 4-byte big-endian
//! length prefix followed by that many bytes of UTF-8 text. Grounded in
//! the teacher's `crates/wire` length-prefix convention
//! (`decode`/`encode`/`read_message`/`write_message`), adapted here to a
//! deliberately asymmetric protocol (plain text in, length-prefixed text
//! out) per `spec.md` §4.F/§6 rather than the teacher's symmetric
//! length-prefixed-JSON-both-ways framing.

use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("request line was not valid UTF-8")]
    InvalidUtf8,
}

/// Reads one newline-terminated request line. Returns `Ok(None)` on a
/// clean EOF (`spec.md` §6 "EOF closes").
pub async fn read_request(
    reader: &mut (impl tokio::io::AsyncBufRead + Unpin),
) -> Result<Option<String>, ProtocolError> {
    let mut line = String::new();
    let bytes_read = tokio::io::AsyncBufReadExt::read_line(reader, &mut line).await?;
    if bytes_read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Writes a reply as a 4-byte big-endian length prefix followed by the
/// UTF-8 bytes (`spec.md` §6).
pub async fn write_response(
    writer: &mut (impl tokio::io::AsyncWrite + Unpin),
    body: &str,
) -> Result<(), ProtocolError> {
    let bytes = body.as_bytes();
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
