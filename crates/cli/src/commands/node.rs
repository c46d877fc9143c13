// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pathlock node` - run one process over TCP

use crate::args::ClusterArgs;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use pathlock_adapters::{TcpMailbox, TcpTransport, TracedMailbox, TracedTransport};
use pathlock_core::Rank;
use pathlock_engine::{shutdown_signal, HoldFor, ProcessHandle, ProcessReport};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Args)]
pub struct NodeArgs {
    /// Rank of this process
    #[arg(long)]
    pub rank: u32,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Listen address of every rank, in rank order
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<SocketAddr>,

    /// Address to bind instead of this rank's peer address
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Only forward requests and pass the token on
    #[arg(long)]
    pub passive: bool,

    /// How long to keep retrying a peer that is not up yet
    #[arg(long, value_parser = humantime::parse_duration)]
    pub connect_timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct NodeSummary {
    rank: Rank,
    entries: u64,
    delivered: u64,
    rejected: u64,
    token: bool,
}

impl NodeSummary {
    fn new(report: ProcessReport, token: bool) -> Self {
        Self {
            rank: report.rank,
            entries: report.entries,
            delivered: report.dispatch.delivered,
            rejected: report.dispatch.rejected,
            token,
        }
    }
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rank {}: {} entries", self.rank, self.entries)?;
        writeln!(
            f,
            "Messages: {} delivered, {} rejected",
            self.delivered, self.rejected
        )?;
        write!(f, "Holds token: {}", if self.token { "yes" } else { "no" })
    }
}

pub async fn node(args: NodeArgs, format: OutputFormat) -> Result<()> {
    let default_size = match args.peers.len() {
        0 => None,
        n => Some(n as u32),
    };
    let mut config = args.cluster.resolve_sized(default_size)?;
    if !args.peers.is_empty() {
        config.peers = args.peers.clone();
    }
    config.validate()?;

    let rank = Rank(args.rank);
    let state = config.initial_state(rank)?;
    let listen = match args.listen {
        Some(addr) => addr,
        None => config.peer(rank)?,
    };

    let mailbox = TcpMailbox::bind(rank, listen)
        .await
        .with_context(|| format!("binding rank {} to {}", rank, listen))?;
    let mut transport = TcpTransport::new(config.peers.clone());
    if let Some(timeout) = args.connect_timeout {
        transport = transport.with_connect_timeout(timeout);
    }
    let transport = TracedTransport::new(transport);
    let mailbox = TracedMailbox::new(mailbox);
    tracing::info!(%rank, %listen, size = config.size, root = %config.root, "node listening");

    let (shutdown, _) = shutdown_signal();
    let mut process = if args.passive {
        ProcessHandle::spawn_passive(state, transport, mailbox, shutdown.clone())
    } else {
        ProcessHandle::spawn(
            state,
            transport,
            mailbox,
            HoldFor(config.hold),
            config.worker_options(),
            shutdown.clone(),
        )
    };

    let mut stopped = shutdown.listener();
    if !args.passive && config.rounds.is_some() {
        // A worker that failed raised the stop signal too; its error wins
        tokio::select! {
            biased;
            finished = process.worker_finished() => {
                if let Some(report) = finished? {
                    tracing::info!(entries = report.entries, "rounds complete, serving peers until interrupted");
                }
                wait_for_stop(&mut stopped).await;
            }
            _ = stopped.wait() => {}
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        }
    } else {
        wait_for_stop(&mut stopped).await;
    }

    let token = process.node().snapshot().await.token;
    let report = process.shutdown().await?;
    output::print(&NodeSummary::new(report, token), format)
}

/// Block until Ctrl-C or until one of the process loops fails
async fn wait_for_stop(stopped: &mut pathlock_engine::ShutdownListener) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        _ = stopped.wait() => {}
    }
}
