// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process transport over tokio channels
//!
//! One unbounded channel per receiver. Sends from a single task enter the
//! channel in call order, which gives per-pair FIFO.

use super::{Mailbox, Transport, TransportError};
use async_trait::async_trait;
use pathlock_core::{Envelope, Rank};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Builder for a fully connected in-process cluster
pub struct MemoryNetwork;

impl MemoryNetwork {
    /// Create a transport shared by all ranks and one mailbox per rank
    pub fn new(size: u32) -> (MemoryTransport, Vec<MemoryMailbox>) {
        let (senders, mailboxes): (Vec<_>, Vec<_>) = Rank::all(size)
            .map(|_| {
                let (tx, rx) = mpsc::unbounded_channel();
                (tx, MemoryMailbox { rx })
            })
            .unzip();

        let transport = MemoryTransport {
            senders: Arc::new(senders),
        };
        (transport, mailboxes)
    }
}

/// Sending side of a [`MemoryNetwork`]
#[derive(Clone)]
pub struct MemoryTransport {
    senders: Arc<Vec<mpsc::UnboundedSender<Envelope>>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let to = envelope.to;
        self.senders
            .get(to.index())
            .ok_or(TransportError::PeerUnreachable(to))?
            .send(envelope)
            .map_err(|_| TransportError::PeerUnreachable(to))
    }
}

/// Receiving side of one rank of a [`MemoryNetwork`]
pub struct MemoryMailbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

#[async_trait]
impl Mailbox for MemoryMailbox {
    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
