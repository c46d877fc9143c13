// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process protocol state
//!
//! Two pointers and two flags are all a process knows about the queue:
//! `father` says where to send a request, `next` says who gets the token
//! on release.

use crate::rank::Rank;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing a [`ProcessState`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cluster must contain at least one process")]
    EmptyCluster,
    #[error("rank {rank} is outside a cluster of {size}")]
    RankOutOfRange { rank: Rank, size: u32 },
    #[error("root {root} is outside a cluster of {size}")]
    RootOutOfRange { root: Rank, size: u32 },
}

/// Protocol state of one process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessState {
    pub pid: Rank,
    pub size: u32,
    /// Upstream process to forward requests to; `None` at the queue tail
    pub father: Option<Rank>,
    /// Process that receives the token when this one releases
    pub next: Option<Rank>,
    pub requesting: bool,
    pub token: bool,
}

/// Conceptual phase of a process, derived from its flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Not requesting, no token, no known upstream
    Idle,
    /// Not requesting, forwards requests to its father
    QueueLink,
    /// Requesting and waiting for the token
    Waiting,
    /// Requesting and holding the token: may enter
    Holding,
    /// Holding the token without wanting it
    IdleHolder,
}

impl ProcessState {
    /// Initial state of `pid` in a cluster of `size` whose token starts at `root`
    pub fn new(pid: Rank, size: u32, root: Rank) -> Result<Self, StateError> {
        if size == 0 {
            return Err(StateError::EmptyCluster);
        }
        if !pid.is_within(size) {
            return Err(StateError::RankOutOfRange { rank: pid, size });
        }
        if !root.is_within(size) {
            return Err(StateError::RootOutOfRange { root, size });
        }

        let is_root = pid == root;
        Ok(Self {
            pid,
            size,
            father: if is_root { None } else { Some(root) },
            next: None,
            requesting: false,
            token: is_root,
        })
    }

    /// Initial states of a whole cluster, indexed by rank
    pub fn cluster(size: u32, root: Rank) -> Result<Vec<Self>, StateError> {
        Rank::all(size)
            .map(|pid| Self::new(pid, size, root))
            .collect()
    }

    /// Whether this process is authorized to run the critical section
    pub fn may_enter(&self) -> bool {
        self.token && self.requesting
    }

    pub fn phase(&self) -> Phase {
        match (self.requesting, self.token) {
            (true, true) => Phase::Holding,
            (true, false) => Phase::Waiting,
            (false, true) => Phase::IdleHolder,
            (false, false) if self.father.is_some() => Phase::QueueLink,
            (false, false) => Phase::Idle,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::QueueLink => "queue-link",
            Self::Waiting => "waiting",
            Self::Holding => "holding",
            Self::IdleHolder => "idle-holder",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
