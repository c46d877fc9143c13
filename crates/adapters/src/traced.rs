// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced transport wrappers for consistent observability

use crate::transport::{Mailbox, Transport, TransportError};
use async_trait::async_trait;
use pathlock_core::Envelope;
use tracing::Instrument;

/// Wrapper that adds tracing to any Transport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for TracedTransport<T> {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let span = tracing::debug_span!(
            "transport.send",
            from = %envelope.from,
            to = %envelope.to,
            kind = %envelope.message.kind(),
        );

        let start = std::time::Instant::now();
        let result = self.inner.send(envelope).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        span.in_scope(|| match &result {
            Ok(()) => tracing::debug!(
                msg = %envelope.message,
                elapsed_us = elapsed.as_micros() as u64,
                "sent"
            ),
            Err(e) => tracing::error!(
                msg = %envelope.message,
                error = %e,
                "send failed"
            ),
        });

        result
    }
}

/// Wrapper that adds tracing to any Mailbox
pub struct TracedMailbox<M> {
    inner: M,
}

impl<M> TracedMailbox<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<M: Mailbox> Mailbox for TracedMailbox<M> {
    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        let result = self.inner.recv().await;
        match &result {
            Ok(Some(envelope)) => tracing::debug!(
                from = %envelope.from,
                to = %envelope.to,
                msg = %envelope.message,
                "received"
            ),
            Ok(None) => tracing::debug!("mailbox closed"),
            Err(e) => tracing::warn!(error = %e, "receive failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
