// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The protocol cell of one process
//!
//! A [`Node`] owns the [`ProcessState`] behind an async mutex. Each handler
//! runs its transition and performs the resulting sends before the lock is
//! released, so a transition and its messages form one atomic step and
//! sends leave in transition order.

use crate::error::RuntimeError;
use pathlock_adapters::Transport;
use pathlock_core::{
    Effect, Envelope, Event, InvariantViolation, Message, ProcessState, ProtocolInput, Rank,
};
use tokio::sync::{watch, Mutex};

pub struct Node<T> {
    pid: Rank,
    state: Mutex<ProcessState>,
    transport: T,
    /// Mirrors `token && requesting` after every transition
    access: watch::Sender<bool>,
}

impl<T: Transport> Node<T> {
    pub fn new(state: ProcessState, transport: T) -> Self {
        let (access, _) = watch::channel(state.may_enter());
        Self {
            pid: state.pid,
            state: Mutex::new(state),
            transport,
            access,
        }
    }

    pub fn pid(&self) -> Rank {
        self.pid
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ProcessState {
        self.state.lock().await.clone()
    }

    pub async fn may_enter(&self) -> bool {
        self.state.lock().await.may_enter()
    }

    pub async fn request_access(&self) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().await;
        self.advance(&mut state, ProtocolInput::RequestAccess).await
    }

    pub async fn release_access(&self) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().await;
        self.advance(&mut state, ProtocolInput::ReleaseAccess).await
    }

    /// Validate an incoming envelope and run its handler
    ///
    /// A malformed envelope leaves the state untouched and returns
    /// [`RuntimeError::MalformedMessage`].
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().await;
        validate(&state, &envelope)?;
        self.advance(&mut state, ProtocolInput::Receive(envelope.message))
            .await
    }

    /// Suspend until this process may enter its critical section
    ///
    /// Cancel-safe. Re-checks the state under the lock before returning.
    pub async fn wait_for_access(&self) -> Result<(), RuntimeError> {
        let mut access = self.access.subscribe();
        loop {
            access
                .wait_for(|granted| *granted)
                .await
                .map_err(|_| RuntimeError::Stopped)?;
            if self.may_enter().await {
                return Ok(());
            }
            access.changed().await.map_err(|_| RuntimeError::Stopped)?;
        }
    }

    /// Commit one transition, then perform its effects while still locked
    async fn advance(&self, state: &mut ProcessState, input: ProtocolInput) -> Result<(), RuntimeError> {
        let (next, effects) = state.transition(input);
        *state = next;
        self.execute(state, effects).await
    }

    async fn execute(&self, state: &ProcessState, effects: Vec<Effect>) -> Result<(), RuntimeError> {
        for effect in effects {
            match effect {
                Effect::Send { to, message } => {
                    self.transport
                        .send(Envelope::new(self.pid, to, message))
                        .await?;
                }
                Effect::Emit(event) => log_event(self.pid, &event),
            }
        }
        self.access.send_replace(state.may_enter());
        tracing::trace!(
            pid = %state.pid,
            father = ?state.father.map(|r| r.0),
            next = ?state.next.map(|r| r.0),
            requesting = state.requesting,
            token = state.token,
            phase = %state.phase(),
            "state"
        );
        Ok(())
    }
}

fn log_event(pid: Rank, event: &Event) {
    match event {
        Event::AccessGranted | Event::AccessReleased => {
            tracing::info!(pid = %pid, event = event.name(), "protocol event")
        }
        _ => tracing::debug!(pid = %pid, event = event.name(), ?event, "protocol event"),
    }
}

/// Boundary checks applied before any handler sees a message
fn validate(state: &ProcessState, envelope: &Envelope) -> Result<(), RuntimeError> {
    let malformed = |reason: String| RuntimeError::MalformedMessage {
        envelope: *envelope,
        reason,
    };

    if envelope.to != state.pid {
        return Err(malformed(format!("addressed to {}", envelope.to)));
    }
    if !envelope.from.is_within(state.size) {
        return Err(malformed(format!(
            "sender {} is outside a cluster of {}",
            envelope.from, state.size
        )));
    }
    if envelope.from == state.pid {
        return Err(malformed("sent to itself".to_string()));
    }

    match envelope.message {
        Message::Request { requester } => {
            if !requester.is_within(state.size) {
                return Err(malformed(format!(
                    "requester {} is outside a cluster of {}",
                    requester, state.size
                )));
            }
            if requester == state.pid {
                return Err(malformed("request names this process".to_string()));
            }
        }
        Message::Token { recipient } => {
            if recipient != state.pid {
                return Err(malformed(format!("token for {}", recipient)));
            }
            if state.token {
                return Err(InvariantViolation::TokenReceivedTwice { rank: state.pid }.into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
