// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-reversal mutual exclusion
//!
//! Requests travel along `father` pointers towards the tail of the queue.
//! Every process a request passes through repoints its `father` at the
//! requester, so the requester becomes the new tail. The tail records the
//! requester as its `next` (or hands over the token straight away when idle),
//! and the token then moves along `next` pointers in request order.
//!
//! Handlers mutate the state in place and return the messages to send. The
//! caller must perform the sends before running the next handler on the same
//! state, and the transport must keep per-pair FIFO order.

use crate::effect::{Effect, Event};
use crate::message::Message;
use crate::rank::Rank;
use crate::state::ProcessState;

/// Inputs that drive protocol transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolInput {
    /// The local worker wants the critical section
    RequestAccess,
    /// The local worker left the critical section
    ReleaseAccess,
    /// A message arrived from another process
    Receive(Message),
}

impl ProcessState {
    /// Ask for the critical section
    ///
    /// Sends our request to `father` and becomes the tail. A tail process
    /// sends nothing and waits for the token. Repeated calls while already
    /// requesting do nothing.
    pub fn request_access(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.requesting {
            return effects;
        }

        self.requesting = true;
        if let Some(father) = self.father.take() {
            effects.push(Effect::send(father, Message::request(self.pid)));
            effects.push(Effect::Emit(Event::RequestSent { to: father }));
        }
        if self.may_enter() {
            effects.push(Effect::Emit(Event::AccessGranted));
        }
        effects
    }

    /// Leave the critical section, passing the token to `next` if queued
    ///
    /// Without a successor the token stays here. Does nothing unless this
    /// process is currently authorized to be in the critical section.
    pub fn release_access(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.may_enter() {
            return effects;
        }

        self.requesting = false;
        effects.push(Effect::Emit(Event::AccessReleased));
        if let Some(next) = self.next.take() {
            self.token = false;
            effects.push(Effect::send(next, Message::token(next)));
            effects.push(Effect::Emit(Event::TokenSent { to: next }));
        }
        effects
    }

    /// Handle a request originally issued by `requester`
    pub fn on_request(&mut self, requester: Rank) -> Vec<Effect> {
        let mut effects = Vec::new();

        match self.father {
            None if self.requesting => {
                self.next = Some(requester);
                effects.push(Effect::Emit(Event::SuccessorQueued {
                    successor: requester,
                }));
            }
            None => {
                self.token = false;
                effects.push(Effect::send(requester, Message::token(requester)));
                effects.push(Effect::Emit(Event::TokenSent { to: requester }));
            }
            Some(father) => {
                effects.push(Effect::send(father, Message::request(requester)));
                effects.push(Effect::Emit(Event::RequestForwarded {
                    requester,
                    to: father,
                }));
            }
        }

        // Path reversal: later requests go to the newest tail
        self.father = Some(requester);
        effects
    }

    /// Handle the token arriving here
    pub fn on_token(&mut self) -> Vec<Effect> {
        self.token = true;
        let mut effects = vec![Effect::Emit(Event::TokenReceived)];
        if self.may_enter() {
            effects.push(Effect::Emit(Event::AccessGranted));
        }
        effects
    }

    /// Apply one input in place
    pub fn apply(&mut self, input: ProtocolInput) -> Vec<Effect> {
        match input {
            ProtocolInput::RequestAccess => self.request_access(),
            ProtocolInput::ReleaseAccess => self.release_access(),
            ProtocolInput::Receive(Message::Request { requester }) => self.on_request(requester),
            ProtocolInput::Receive(Message::Token { .. }) => self.on_token(),
        }
    }

    /// Pure state transition function
    pub fn transition(&self, input: ProtocolInput) -> (ProcessState, Vec<Effect>) {
        let mut new_state = self.clone();
        let effects = new_state.apply(input);
        (new_state, effects)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
