// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use crate::config::ConfigError;
use pathlock_adapters::TransportError;
use pathlock_core::{Envelope, InvariantViolation, Rank, StateError};
use thiserror::Error;

/// Errors that can occur in the runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("invalid process state: {0}")]
    State(#[from] StateError),
    #[error("malformed message {envelope}: {reason}")]
    MalformedMessage { envelope: Envelope, reason: String },
    #[error("critical work failed at {rank} in round {round}: {message}")]
    WorkFailed {
        rank: Rank,
        round: u64,
        message: String,
    },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("task failed: {0}")]
    TaskFailed(String),
    #[error("process stopped")]
    Stopped,
}

impl RuntimeError {
    /// Whether the dispatcher should drop the message and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedMessage { .. })
    }
}
