// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic model of a cluster for protocol tests.
//!
//! Every ordered pair of processes has its own FIFO channel. Tests decide
//! which channel delivers next, so any interleaving the real transports
//! allow can be replayed step by step.

#![allow(dead_code)]

use pathlock_core::invariants::{self, InvariantViolation};
use pathlock_core::{Effect, Envelope, Event, Message, ProcessState, ProtocolInput, Rank};
use std::collections::{BTreeMap, VecDeque};

pub struct ModelNetwork {
    pub states: Vec<ProcessState>,
    channels: BTreeMap<(Rank, Rank), VecDeque<Message>>,
    /// Every message sent, in send order
    pub trace: Vec<Envelope>,
    /// Ranks in the order they were granted access
    pub entries: Vec<Rank>,
    /// Number of `request` calls per rank that changed state
    pub requests: Vec<usize>,
}

impl ModelNetwork {
    pub fn new(size: u32, root: Rank) -> Self {
        Self {
            states: ProcessState::cluster(size, root).expect("valid cluster"),
            channels: BTreeMap::new(),
            trace: Vec::new(),
            entries: Vec::new(),
            requests: vec![0; size as usize],
        }
    }

    pub fn state(&self, rank: u32) -> &ProcessState {
        &self.states[rank as usize]
    }

    fn apply(&mut self, rank: Rank, input: ProtocolInput) -> Vec<Effect> {
        let effects = self.states[rank.index()].apply(input);

        for (to, message) in Effect::sends(&effects) {
            self.trace.push(Envelope::new(rank, to, message));
            self.channels.entry((rank, to)).or_default().push_back(message);
        }
        if Effect::events(&effects).any(|e| *e == Event::AccessGranted) {
            assert!(
                self.states[rank.index()].may_enter(),
                "access granted to {} without token and request",
                rank
            );
            self.entries.push(rank);
        }
        effects
    }

    /// Local worker of `rank` asks for access; ignored while already requesting
    pub fn request(&mut self, rank: u32) {
        let rank = Rank(rank);
        if self.states[rank.index()].requesting {
            return;
        }
        self.requests[rank.index()] += 1;
        self.apply(rank, ProtocolInput::RequestAccess);
    }

    /// Local worker of `rank` leaves; ignored unless it may enter
    pub fn release(&mut self, rank: u32) {
        self.apply(Rank(rank), ProtocolInput::ReleaseAccess);
    }

    /// Channels with messages waiting, in a stable order
    pub fn pending(&self) -> Vec<(Rank, Rank)> {
        self.channels
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(pair, _)| *pair)
            .collect()
    }

    /// Deliver the oldest message on the `from -> to` channel
    pub fn deliver(&mut self, from: u32, to: u32) -> Option<Envelope> {
        self.deliver_pair((Rank(from), Rank(to)))
    }

    fn deliver_pair(&mut self, (from, to): (Rank, Rank)) -> Option<Envelope> {
        let message = self.channels.get_mut(&(from, to))?.pop_front()?;
        self.apply(to, ProtocolInput::Receive(message));
        Some(Envelope::new(from, to, message))
    }

    /// Deliver the head of the `index`-th pending channel, wrapping around
    pub fn deliver_nth(&mut self, index: usize) -> Option<Envelope> {
        let pending = self.pending();
        if pending.is_empty() {
            return None;
        }
        self.deliver_pair(pending[index % pending.len()])
    }

    /// Deliver until every channel is empty
    pub fn deliver_all(&mut self) {
        while self.deliver_nth(0).is_some() {
            self.check().expect("invariants hold while delivering");
        }
    }

    /// Keep releasing holders and delivering until nobody waits
    pub fn drain(&mut self) {
        let limit = self.states.len() * 4 + 4;
        for _ in 0..limit {
            self.deliver_all();
            let Some(holder) = self.states.iter().find(|s| s.may_enter()).map(|s| s.pid) else {
                break;
            };
            self.release(holder.0);
            self.check().expect("invariants hold after release");
        }
        self.deliver_all();
    }

    pub fn tokens_in_flight(&self) -> usize {
        self.channels
            .values()
            .flatten()
            .filter(|m| matches!(m, Message::Token { .. }))
            .count()
    }

    pub fn holder(&self) -> Option<Rank> {
        self.states.iter().find(|s| s.token).map(|s| s.pid)
    }

    pub fn check(&self) -> Result<(), InvariantViolation> {
        invariants::check_all(&self.states, self.tokens_in_flight())
    }

    /// Messages sent so far, formatted like `REQUEST(1) 1->0`
    pub fn trace_lines(&self) -> Vec<String> {
        self.trace.iter().map(|e| e.to_string()).collect()
    }

    pub fn entries_of(&self, rank: u32) -> usize {
        self.entries.iter().filter(|r| r.0 == rank).count()
    }
}
