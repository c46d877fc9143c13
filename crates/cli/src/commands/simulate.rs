// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pathlock simulate` - run an in-memory cluster to completion

use crate::args::ClusterArgs;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use clap::Args;
use pathlock_core::Rank;
use pathlock_engine::{ClusterReport, LocalCluster};
use serde::Serialize;
use std::fmt;

/// Rounds per process when neither the config nor `--rounds` sets one
const DEFAULT_ROUNDS: u64 = 5;

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,
}

#[derive(Debug, Serialize)]
struct RankEntries {
    rank: Rank,
    entries: u64,
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    size: u32,
    root: Rank,
    rounds: u64,
    entries: Vec<RankEntries>,
    order: Vec<Rank>,
    holder: Option<Rank>,
}

impl SimulationSummary {
    fn new(size: u32, root: Rank, rounds: u64, report: &ClusterReport) -> Self {
        Self {
            size,
            root,
            rounds,
            entries: report
                .processes
                .iter()
                .map(|p| RankEntries {
                    rank: p.rank,
                    entries: p.entries,
                })
                .collect(),
            order: report.order.clone(),
            holder: report.holder(),
        }
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cluster: {} processes, root {}, {} rounds each",
            self.size, self.root, self.rounds
        )?;
        for rank in &self.entries {
            writeln!(f, "  rank {}: {} entries", rank.rank, rank.entries)?;
        }
        writeln!(f, "Access order: {}", output::join_ranks(&self.order))?;
        if let Some(holder) = self.holder {
            writeln!(f, "Token holder: {}", holder)?;
        }
        write!(f, "Mutual exclusion held")
    }
}

pub async fn simulate(args: SimulateArgs, format: OutputFormat) -> Result<()> {
    let mut config = args.cluster.resolve()?;
    if !config.peers.is_empty() {
        tracing::debug!("ignoring peer addresses in simulation");
    }
    let rounds = *config.rounds.get_or_insert(DEFAULT_ROUNDS);

    let report = LocalCluster::start(&config)?.run_to_completion().await?;

    let expected = config.size as u64 * rounds;
    if report.total_entries() != expected {
        bail!(
            "expected {} critical section entries, saw {}",
            expected,
            report.total_entries()
        );
    }

    output::print(
        &SimulationSummary::new(config.size, config.root, rounds, &report),
        format,
    )
}
