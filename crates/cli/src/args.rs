// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster options shared by every command

use anyhow::{Context, Result};
use clap::Args;
use pathlock_core::Rank;
use pathlock_engine::ClusterConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Cluster size when neither a config file nor `--size` gives one
const DEFAULT_SIZE: u32 = 3;

#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// TOML config file; flags override its values
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Number of processes
    #[arg(long)]
    pub size: Option<u32>,

    /// Rank holding the token at startup
    #[arg(long)]
    pub root: Option<u32>,

    /// Critical section entries per process
    #[arg(long)]
    pub rounds: Option<u64>,

    /// Time spent inside the critical section (e.g. "5ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub hold: Option<Duration>,

    /// Pause between rounds (e.g. "10ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub think: Option<Duration>,
}

impl ClusterArgs {
    /// Load the config file if any, apply flag overrides, validate
    pub fn resolve(&self) -> Result<ClusterConfig> {
        self.resolve_sized(None)
    }

    /// Like [`resolve`](Self::resolve), with a different size when nothing sets one
    pub fn resolve_sized(&self, default_size: Option<u32>) -> Result<ClusterConfig> {
        let mut config = match &self.config {
            Some(path) => ClusterConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClusterConfig::new(default_size.unwrap_or(DEFAULT_SIZE)),
        };

        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(root) = self.root {
            config.root = Rank(root);
        }
        if let Some(rounds) = self.rounds {
            config.rounds = Some(rounds);
        }
        if let Some(hold) = self.hold {
            config.hold = hold;
        }
        if let Some(think) = self.think {
            config.think = think;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_without_file_or_flags() {
        let config = ClusterArgs::default().resolve().unwrap();

        assert_eq!(config, ClusterConfig::new(DEFAULT_SIZE));
    }

    #[test]
    fn flags_override_values() {
        let args = ClusterArgs {
            size: Some(5),
            root: Some(4),
            rounds: Some(2),
            hold: Some(Duration::from_millis(3)),
            ..ClusterArgs::default()
        };

        let config = args.resolve().unwrap();

        assert_eq!(config.size, 5);
        assert_eq!(config.root, Rank(4));
        assert_eq!(config.rounds, Some(2));
        assert_eq!(config.hold, Duration::from_millis(3));
    }

    #[test]
    fn size_hint_applies_without_flag() {
        assert_eq!(ClusterArgs::default().resolve_sized(Some(7)).unwrap().size, 7);

        let args = ClusterArgs {
            size: Some(2),
            ..ClusterArgs::default()
        };
        assert_eq!(args.resolve_sized(Some(7)).unwrap().size, 2);
    }

    #[test]
    fn overrides_are_validated() {
        let args = ClusterArgs {
            size: Some(2),
            root: Some(2),
            ..ClusterArgs::default()
        };

        assert!(args.resolve().is_err());
    }
}
