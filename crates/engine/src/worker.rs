// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Critical section worker loop

use crate::config::WorkerOptions;
use crate::error::RuntimeError;
use crate::node::Node;
use crate::shutdown::ShutdownListener;
use async_trait::async_trait;
use pathlock_adapters::Transport;
use pathlock_core::Rank;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Work performed while holding the token
#[async_trait]
pub trait CriticalWork: Send + 'static {
    async fn run(&mut self, rank: Rank, round: u64) -> Result<(), RuntimeError>;
}

/// Holds the critical section for a fixed duration
#[derive(Debug, Clone, Copy)]
pub struct HoldFor(pub Duration);

#[async_trait]
impl CriticalWork for HoldFor {
    async fn run(&mut self, _rank: Rank, _round: u64) -> Result<(), RuntimeError> {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
        Ok(())
    }
}

/// What a worker did before it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub rank: Rank,
    pub entries: u64,
}

pub struct CriticalSectionWorker<T, W> {
    node: Arc<Node<T>>,
    work: W,
    options: WorkerOptions,
}

impl<T: Transport, W: CriticalWork> CriticalSectionWorker<T, W> {
    pub fn new(node: Arc<Node<T>>, work: W, options: WorkerOptions) -> Self {
        Self {
            node,
            work,
            options,
        }
    }

    /// Request, wait, work, release; until the round budget runs out or stopped
    ///
    /// A stop only interrupts waiting for the token or thinking; work already
    /// started finishes and releases first.
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> Result<WorkerReport, RuntimeError> {
        let rank = self.node.pid();
        let mut entries = 0u64;

        while self.options.rounds.is_none_or(|rounds| entries < rounds) {
            if shutdown.is_triggered() {
                break;
            }

            if !tolerate_stop(self.node.request_access().await, &shutdown)? {
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    tracing::info!(pid = %rank, "stopped while waiting for the token");
                    break;
                }
                granted = self.node.wait_for_access() => granted?,
            }

            let span = tracing::info_span!("critical_section", pid = %rank, round = entries);
            self.work.run(rank, entries).instrument(span).await?;
            let released = tolerate_stop(self.node.release_access().await, &shutdown)?;
            entries += 1;
            if !released {
                break;
            }

            if !self.options.think.is_zero() {
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => break,
                    _ = tokio::time::sleep(self.options.think) => {}
                }
            }
        }

        tracing::info!(pid = %rank, entries, "worker finished");
        Ok(WorkerReport { rank, entries })
    }
}

/// Peers may stop first once shutdown is raised; their sends then fail
fn tolerate_stop(
    result: Result<(), RuntimeError>,
    shutdown: &ShutdownListener,
) -> Result<bool, RuntimeError> {
    match result {
        Ok(()) => Ok(true),
        Err(RuntimeError::Transport(e)) if shutdown.is_triggered() => {
            tracing::debug!(error = %e, "peer stopped first");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
