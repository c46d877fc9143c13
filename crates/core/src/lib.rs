// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pathlock-core: path-reversal distributed mutual exclusion
//!
//! This crate provides:
//! - The per-process state record and its pure protocol transitions
//! - Message and envelope types carried by transports
//! - Cluster-wide invariant checks for tests and monitors

pub mod effect;
pub mod invariants;
pub mod message;
pub mod protocol;
pub mod rank;
pub mod state;

pub use effect::{Effect, Event};
pub use invariants::InvariantViolation;
pub use message::{Envelope, Message, MessageKind};
pub use protocol::ProtocolInput;
pub use rank::Rank;
pub use state::{Phase, ProcessState, StateError};
