// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Receive loop feeding incoming messages to the protocol cell

use crate::error::RuntimeError;
use crate::node::Node;
use crate::shutdown::ShutdownListener;
use pathlock_adapters::{Mailbox, Transport};
use std::sync::Arc;

/// Counters reported when a dispatcher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub rejected: u64,
}

pub struct MessageDispatcher<M, T> {
    node: Arc<Node<T>>,
    mailbox: M,
}

impl<M: Mailbox, T: Transport> MessageDispatcher<M, T> {
    pub fn new(node: Arc<Node<T>>, mailbox: M) -> Self {
        Self { node, mailbox }
    }

    /// Dispatch messages until stopped or the mailbox closes
    ///
    /// Malformed messages are dropped. Transport failures and invariant
    /// violations end the loop with an error.
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> Result<DispatchStats, RuntimeError> {
        let pid = self.node.pid();
        let mut stats = DispatchStats::default();

        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    tracing::debug!(pid = %pid, "dispatcher stopping");
                    break;
                }
                received = self.mailbox.recv() => match received? {
                    Some(envelope) => envelope,
                    None => {
                        tracing::debug!(pid = %pid, "mailbox closed");
                        break;
                    }
                },
            };

            match self.node.deliver(envelope).await {
                Ok(()) => stats.delivered += 1,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(pid = %pid, error = %e, "dropping message");
                    stats.rejected += 1;
                }
                Err(RuntimeError::Transport(e)) if shutdown.is_triggered() => {
                    tracing::debug!(pid = %pid, error = %e, "peer stopped first");
                    break;
                }
                Err(e) => {
                    tracing::error!(pid = %pid, error = %e, "dispatcher failed");
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
