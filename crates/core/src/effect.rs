// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events produced by protocol transitions

use crate::message::Message;
use crate::rank::Rank;

/// Side effects a transition asks its caller to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver a message to another process
    Send { to: Rank, message: Message },
    /// Emit an event for observers
    Emit(Event),
}

/// Events describing what a transition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Our own request went upstream
    RequestSent { to: Rank },
    /// Someone else's request was passed on
    RequestForwarded { requester: Rank, to: Rank },
    /// A requester was queued behind us
    SuccessorQueued { successor: Rank },
    /// The token left this process
    TokenSent { to: Rank },
    /// The token arrived at this process
    TokenReceived,
    /// Token held while requesting: the critical section may be entered
    AccessGranted,
    /// The critical section was left
    AccessReleased,
}

impl Effect {
    pub fn send(to: Rank, message: Message) -> Self {
        Self::Send { to, message }
    }

    /// Messages among a batch of effects, in order
    pub fn sends(effects: &[Effect]) -> impl Iterator<Item = (Rank, Message)> + '_ {
        effects.iter().filter_map(|effect| match effect {
            Effect::Send { to, message } => Some((*to, *message)),
            Effect::Emit(_) => None,
        })
    }

    /// Events among a batch of effects, in order
    pub fn events(effects: &[Effect]) -> impl Iterator<Item = &Event> + '_ {
        effects.iter().filter_map(|effect| match effect {
            Effect::Emit(event) => Some(event),
            Effect::Send { .. } => None,
        })
    }
}

impl Event {
    /// Event name in `namespace:action` form
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestSent { .. } => "request:sent",
            Self::RequestForwarded { .. } => "request:forwarded",
            Self::SuccessorQueued { .. } => "successor:queued",
            Self::TokenSent { .. } => "token:sent",
            Self::TokenReceived => "token:received",
            Self::AccessGranted => "access:granted",
            Self::AccessReleased => "access:released",
        }
    }
}
