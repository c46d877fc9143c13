// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A whole cluster in one address space, over the in-memory network

use crate::config::{ClusterConfig, ConfigError};
use crate::error::RuntimeError;
use crate::occupancy::OccupancyMonitor;
use crate::process::{ProcessHandle, ProcessReport};
use crate::shutdown::{shutdown_signal, ShutdownTrigger};
use crate::worker::{CriticalWork, HoldFor};
use pathlock_adapters::{MemoryNetwork, MemoryTransport, TracedMailbox, TracedTransport};
use pathlock_core::{invariants, ProcessState, Rank};

pub type LocalTransport = TracedTransport<MemoryTransport>;

/// Outcome of a completed local run
#[derive(Debug, Clone)]
pub struct ClusterReport {
    pub processes: Vec<ProcessReport>,
    /// Ranks in the order they entered the critical section
    pub order: Vec<Rank>,
    /// Final state of every process
    pub states: Vec<ProcessState>,
}

impl ClusterReport {
    /// Entries per rank, indexed by rank
    pub fn entries(&self) -> Vec<u64> {
        self.processes.iter().map(|p| p.entries).collect()
    }

    pub fn total_entries(&self) -> u64 {
        self.processes.iter().map(|p| p.entries).sum()
    }

    /// Rank holding the token at the end
    pub fn holder(&self) -> Option<Rank> {
        self.states.iter().find(|s| s.token).map(|s| s.pid)
    }
}

pub struct LocalCluster {
    config: ClusterConfig,
    processes: Vec<ProcessHandle<LocalTransport>>,
    monitor: OccupancyMonitor,
    stop_signal: ShutdownTrigger,
}

impl LocalCluster {
    /// Start every process with work that holds for `config.hold`
    pub fn start(config: &ClusterConfig) -> Result<Self, RuntimeError> {
        let hold = config.hold;
        Self::start_with(config, |_| HoldFor(hold))
    }

    /// Start every process with work built by `make_work`
    pub fn start_with<W, F>(config: &ClusterConfig, mut make_work: F) -> Result<Self, RuntimeError>
    where
        W: CriticalWork,
        F: FnMut(Rank) -> W,
    {
        config.validate()?;
        let states = ProcessState::cluster(config.size, config.root)?;
        let (transport, mailboxes) = MemoryNetwork::new(config.size);
        let transport = TracedTransport::new(transport);
        let monitor = OccupancyMonitor::new();
        let (shutdown, _) = shutdown_signal();

        let processes = states
            .into_iter()
            .zip(mailboxes)
            .map(|(state, mailbox)| {
                let work = monitor.wrap(make_work(state.pid));
                ProcessHandle::spawn(
                    state,
                    transport.clone(),
                    TracedMailbox::new(mailbox),
                    work,
                    config.worker_options(),
                    shutdown.clone(),
                )
            })
            .collect();

        tracing::info!(size = config.size, root = %config.root, rounds = ?config.rounds, "cluster started");
        Ok(Self {
            config: config.clone(),
            processes,
            monitor,
            stop_signal: shutdown,
        })
    }

    pub fn monitor(&self) -> &OccupancyMonitor {
        &self.monitor
    }

    pub fn process(&self, rank: Rank) -> Option<&ProcessHandle<LocalTransport>> {
        self.processes.get(rank.index())
    }

    /// Current state of every process, indexed by rank
    pub async fn snapshot(&self) -> Vec<ProcessState> {
        let mut states = Vec::with_capacity(self.processes.len());
        for process in &self.processes {
            states.push(process.node().snapshot().await);
        }
        states
    }

    /// Wait for every worker to use its rounds, then stop and verify
    ///
    /// Fails on any process error, any overlap seen by the monitor, or a
    /// final state that is not quiescent.
    pub async fn run_to_completion(mut self) -> Result<ClusterReport, RuntimeError> {
        if self.config.rounds.is_none() {
            self.shutdown().await?;
            return Err(ConfigError::Unbounded.into());
        }

        let mut first_error = None;
        for process in &mut self.processes {
            if let Err(e) = process.worker_finished().await {
                self.stop_signal.trigger();
                first_error.get_or_insert(e);
            }
        }

        let states = self.snapshot().await;
        let order = self.monitor.order();
        let violations = self.monitor.violations();
        let processes = match self.shutdown().await {
            Ok(processes) => processes,
            Err(e) => return Err(first_error.unwrap_or(e)),
        };
        if let Some(e) = first_error {
            return Err(e);
        }
        if let Some(violation) = violations.into_iter().next() {
            return Err(violation.into());
        }
        invariants::check_quiescent(&states)?;

        tracing::info!(entries = order.len(), "cluster finished");
        Ok(ClusterReport {
            processes,
            order,
            states,
        })
    }

    /// Stop every process without waiting for rounds
    pub async fn shutdown(self) -> Result<Vec<ProcessReport>, RuntimeError> {
        self.stop_signal.trigger();
        let mut reports = Vec::with_capacity(self.processes.len());
        let mut first_error = None;
        for process in self.processes {
            match process.shutdown().await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}
