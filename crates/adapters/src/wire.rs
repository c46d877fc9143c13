// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for envelopes on byte streams
//!
//! Each frame is a 4-byte big-endian length prefix followed by the JSON
//! encoding of one [`Envelope`].

use pathlock_core::Envelope;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload accepted in a single frame
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Errors reading or writing frames
#[derive(Debug, Error)]
pub enum WireError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_SIZE} byte limit")]
    FrameTooLarge(usize),
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode an envelope as JSON (no length prefix)
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(envelope)?)
}

/// Decode an envelope from JSON (no length prefix)
pub fn decode(bytes: &[u8]) -> Result<Envelope, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one length-prefixed frame
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), WireError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(payload.len()));
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame
///
/// End of stream before any byte of the length prefix is `ConnectionClosed`.
/// A stream that ends partway through a frame is an `Io` error of kind
/// `UnexpectedEof`. An oversized length is reported before its payload is
/// read, so the caller may skip it.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match reader.read(&mut len_buf[filled..]).await? {
            0 if filled == 0 => return Err(WireError::ConnectionClosed),
            0 => return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()),
            n => filled += n,
        }
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Encode then write one envelope
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &Envelope,
) -> Result<(), WireError> {
    let payload = encode(envelope)?;
    write_frame(writer, &payload).await
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
