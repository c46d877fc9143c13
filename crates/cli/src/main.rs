// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pathlock - path-reversal distributed mutual exclusion

mod args;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{node, simulate};
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "pathlock",
    version,
    about = "pathlock - token-based distributed mutual exclusion"
)]
struct Cli {
    /// Output format for summaries
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a whole cluster in memory until every process finishes its rounds
    Simulate(simulate::SimulateArgs),
    /// Run one process over TCP
    Node(node::NodeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    match cli.command {
        Commands::Simulate(args) => simulate::simulate(args, cli.format).await,
        Commands::Node(args) => node::node(args, cli.format).await,
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`)
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
