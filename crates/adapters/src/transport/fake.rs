// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Transport, TransportError};
use async_trait::async_trait;
use pathlock_core::{Envelope, Message, Rank};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Fake transport that records every send
#[derive(Clone, Default)]
pub struct FakeTransport {
    sent: Arc<Mutex<Vec<Envelope>>>,
    unreachable: Arc<Mutex<HashSet<Rank>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded sends, in order
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded messages addressed to `rank`
    pub fn sent_to(&self, rank: Rank) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|e| e.to == rank)
            .map(|e| e.message)
            .collect()
    }

    /// Make sends to `rank` fail with `PeerUnreachable`
    pub fn set_unreachable(&self, rank: Rank) {
        self.unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(rank);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        if self
            .unreachable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&envelope.to)
        {
            return Err(TransportError::PeerUnreachable(envelope.to));
        }

        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(envelope);
        Ok(())
    }
}
