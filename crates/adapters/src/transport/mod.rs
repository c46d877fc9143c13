// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-to-point message transports
//!
//! A transport must deliver reliably and keep FIFO order between any one
//! sender and any one receiver. Nothing is assumed across different pairs.

mod memory;
mod tcp;

pub use memory::{MemoryMailbox, MemoryNetwork, MemoryTransport};
pub use tcp::{TcpMailbox, TcpTransport};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;

use crate::wire::WireError;
use async_trait::async_trait;
use pathlock_core::{Envelope, Rank};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {0} unreachable")]
    PeerUnreachable(Rank),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("mailbox closed")]
    Closed,
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::ConnectionClosed => TransportError::Closed,
            WireError::Io(e) => TransportError::Io(e),
            e @ (WireError::FrameTooLarge(_) | WireError::Malformed(_)) => {
                TransportError::MalformedMessage(e.to_string())
            }
        }
    }
}

/// Sending half of a transport, shared by every loop of a process
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Deliver `envelope` to `envelope.to`
    ///
    /// Returning means the envelope is queued behind every earlier send to
    /// the same peer.
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError>;
}

/// Receiving half of a transport, owned by the dispatcher
#[async_trait]
pub trait Mailbox: Send + 'static {
    /// Next envelope addressed to this process, `None` once no sender remains
    ///
    /// Must be cancel-safe: dropping the future loses nothing.
    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError>;
}
