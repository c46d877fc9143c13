// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! size = 3
//! root = 0
//! rounds = 10
//! hold = "5ms"
//! think = "0s"
//! peers = ["127.0.0.1:7000", "127.0.0.1:7001", "127.0.0.1:7002"]
//! ```

use pathlock_core::{ProcessState, Rank, StateError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("rounds must be at least 1 when set")]
    ZeroRounds,
    #[error("a run to completion needs a rounds limit")]
    Unbounded,
    #[error("expected {expected} peer addresses, got {actual}")]
    PeerCount { expected: usize, actual: usize },
    #[error("no peer address for rank {0}")]
    MissingPeer(Rank),
}

fn default_root() -> Rank {
    Rank::ROOT
}

fn default_hold() -> Duration {
    Duration::from_millis(5)
}

/// Shape of a cluster and the workload each process runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub size: u32,
    #[serde(default = "default_root")]
    pub root: Rank,
    /// Critical section entries per process; `None` runs until stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u64>,
    #[serde(default = "default_hold", with = "humantime_serde")]
    pub hold: Duration,
    #[serde(default, with = "humantime_serde")]
    pub think: Duration,
    /// Listen address of each rank, indexed by rank (node mode only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<SocketAddr>,
}

impl ClusterConfig {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            root: default_root(),
            rounds: None,
            hold: default_hold(),
            think: Duration::ZERO,
            peers: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: Rank) -> Self {
        self.root = root;
        self
    }

    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = Some(rounds);
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_think(mut self, think: Duration) -> Self {
        self.think = think;
        self
    }

    pub fn with_peers(mut self, peers: Vec<SocketAddr>) -> Self {
        self.peers = peers;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(StateError::EmptyCluster.into());
        }
        if !self.root.is_within(self.size) {
            return Err(StateError::RootOutOfRange {
                root: self.root,
                size: self.size,
            }
            .into());
        }
        if self.rounds == Some(0) {
            return Err(ConfigError::ZeroRounds);
        }
        if !self.peers.is_empty() && self.peers.len() != self.size as usize {
            return Err(ConfigError::PeerCount {
                expected: self.size as usize,
                actual: self.peers.len(),
            });
        }
        Ok(())
    }

    /// Initial protocol state of `rank`
    pub fn initial_state(&self, rank: Rank) -> Result<ProcessState, ConfigError> {
        Ok(ProcessState::new(rank, self.size, self.root)?)
    }

    /// Listen address of `rank`
    pub fn peer(&self, rank: Rank) -> Result<SocketAddr, ConfigError> {
        self.peers
            .get(rank.index())
            .copied()
            .ok_or(ConfigError::MissingPeer(rank))
    }

    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions {
            rounds: self.rounds,
            think: self.think,
        }
    }
}

/// Loop settings for a critical section worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerOptions {
    pub rounds: Option<u64>,
    pub think: Duration,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
