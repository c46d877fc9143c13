// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages exchanged between processes

use crate::rank::Rank;
use serde::{Deserialize, Serialize};

/// Protocol message
///
/// Both kinds name a rank. For a request it is the process that originally
/// asked for the token, preserved across every forwarding hop. For a token it
/// is the process the hand-off is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    Request { requester: Rank },
    Token { recipient: Rank },
}

/// Discriminant of a [`Message`], for logging and filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Token,
}

impl Message {
    pub fn request(requester: Rank) -> Self {
        Self::Request { requester }
    }

    pub fn token(recipient: Rank) -> Self {
        Self::Token { recipient }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Request { .. } => MessageKind::Request,
            Self::Token { .. } => MessageKind::Token,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Token => write!(f, "token"),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request { requester } => write!(f, "REQUEST({})", requester),
            Self::Token { recipient } => write!(f, "TOKEN({})", recipient),
        }
    }
}

/// A message in transit from one process to another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Envelope {
    pub from: Rank,
    pub to: Rank,
    pub message: Message,
}

impl Envelope {
    pub fn new(from: Rank, to: Rank, message: Message) -> Self {
        Self { from, to, message }
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}->{}", self.message, self.from, self.to)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
