// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pathlock runtime: drives protocol state with async loops over a transport

mod cluster;
pub mod config;
mod dispatcher;
mod error;
mod node;
mod occupancy;
mod process;
mod shutdown;
mod worker;

pub use cluster::{ClusterReport, LocalCluster, LocalTransport};
pub use config::{ClusterConfig, ConfigError, WorkerOptions};
pub use dispatcher::{DispatchStats, MessageDispatcher};
pub use error::RuntimeError;
pub use node::Node;
pub use occupancy::{Monitored, OccupancyMonitor};
pub use process::{ProcessHandle, ProcessReport};
pub use shutdown::{shutdown_signal, ShutdownListener, ShutdownTrigger};
pub use worker::{CriticalSectionWorker, CriticalWork, HoldFor, WorkerReport};
