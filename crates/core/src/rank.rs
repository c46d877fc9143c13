// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process identity within a cluster

use serde::{Deserialize, Serialize};

/// Identity of a process, `0..size`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(pub u32);

impl Rank {
    /// Rank conventionally holding the token at startup
    pub const ROOT: Rank = Rank(0);

    /// Position of this rank in a per-process table
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this rank addresses a process in a cluster of `size`
    pub fn is_within(self, size: u32) -> bool {
        self.0 < size
    }

    /// All ranks of a cluster of `size`, in order
    pub fn all(size: u32) -> impl Iterator<Item = Rank> {
        (0..size).map(Rank)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(rank: u32) -> Self {
        Self(rank)
    }
}
