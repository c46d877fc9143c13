// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster-wide critical section observer
//!
//! Wraps each process's [`CriticalWork`] and records who is inside. Only
//! possible when every process shares one address space, as in a local
//! cluster.

use crate::error::RuntimeError;
use crate::worker::CriticalWork;
use async_trait::async_trait;
use pathlock_core::{InvariantViolation, Rank};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Occupancy {
    inside: Vec<Rank>,
    order: Vec<Rank>,
    violations: Vec<InvariantViolation>,
}

#[derive(Clone, Debug, Default)]
pub struct OccupancyMonitor {
    inner: Arc<Mutex<Occupancy>>,
}

impl OccupancyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `rank` entering; fails if someone else is already inside
    pub fn enter(&self, rank: Rank) -> Result<(), InvariantViolation> {
        let mut occupancy = self.lock();
        occupancy.inside.push(rank);
        occupancy.order.push(rank);
        if occupancy.inside.len() > 1 {
            let violation = InvariantViolation::SharedCriticalSection {
                inside: occupancy.inside.clone(),
            };
            occupancy.violations.push(violation.clone());
            tracing::error!(inside = ?occupancy.inside, "critical section shared");
            return Err(violation);
        }
        Ok(())
    }

    pub fn exit(&self, rank: Rank) {
        self.lock().inside.retain(|r| *r != rank);
    }

    /// Ranks in the order they entered
    pub fn order(&self) -> Vec<Rank> {
        self.lock().order.clone()
    }

    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.lock().violations.clone()
    }

    pub fn wrap<W: CriticalWork>(&self, work: W) -> Monitored<W> {
        Monitored {
            monitor: self.clone(),
            work,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Occupancy> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Work reporting to an [`OccupancyMonitor`]
pub struct Monitored<W> {
    monitor: OccupancyMonitor,
    work: W,
}

#[async_trait]
impl<W: CriticalWork> CriticalWork for Monitored<W> {
    async fn run(&mut self, rank: Rank, round: u64) -> Result<(), RuntimeError> {
        if let Err(violation) = self.monitor.enter(rank) {
            self.monitor.exit(rank);
            return Err(violation.into());
        }
        let result = self.work.run(rank, round).await;
        self.monitor.exit(rank);
        result
    }
}
