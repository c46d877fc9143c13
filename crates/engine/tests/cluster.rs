// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime scenarios over the in-memory network

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use pathlock_adapters::{MemoryNetwork, MemoryTransport};
use pathlock_core::{invariants, ProcessState, Rank};
use pathlock_engine::{
    shutdown_signal, ClusterConfig, ConfigError, CriticalWork, LocalCluster, ProcessHandle,
    RuntimeError, ShutdownTrigger,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

/// Processes with dispatchers only; the test drives access by hand
struct Manual {
    processes: Vec<ProcessHandle<MemoryTransport>>,
    _shutdown: ShutdownTrigger,
}

impl Manual {
    fn new(size: u32) -> Self {
        let (transport, mailboxes) = MemoryNetwork::new(size);
        let (shutdown, _) = shutdown_signal();
        let processes = ProcessState::cluster(size, Rank::ROOT)
            .unwrap()
            .into_iter()
            .zip(mailboxes)
            .map(|(state, mailbox)| {
                ProcessHandle::spawn_passive(state, transport.clone(), mailbox, shutdown.clone())
            })
            .collect();
        Self {
            processes,
            _shutdown: shutdown,
        }
    }

    async fn request(&self, rank: u32) {
        self.processes[rank as usize]
            .node()
            .request_access()
            .await
            .unwrap();
    }

    async fn release(&self, rank: u32) {
        self.processes[rank as usize]
            .node()
            .release_access()
            .await
            .unwrap();
    }

    async fn granted(&self, rank: u32) {
        tokio::time::timeout(WAIT, self.processes[rank as usize].node().wait_for_access())
            .await
            .expect("access not granted in time")
            .unwrap();
    }

    async fn state(&self, rank: u32) -> ProcessState {
        self.processes[rank as usize].node().snapshot().await
    }

    async fn states(&self) -> Vec<ProcessState> {
        let mut states = Vec::new();
        for process in &self.processes {
            states.push(process.node().snapshot().await);
        }
        states
    }

    /// Poll until `check` holds for the state of `rank`
    async fn until(&self, rank: u32, check: impl Fn(&ProcessState) -> bool) {
        tokio::time::timeout(WAIT, async {
            loop {
                if check(&self.state(rank).await) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("state not reached in time");
    }
}

#[tokio::test]
async fn single_requester_gets_token_from_idle_root() {
    let manual = Manual::new(3);

    manual.request(1).await;
    manual.granted(1).await;
    manual.until(0, |s| s.father == Some(Rank(1))).await;

    let zero = manual.state(0).await;
    assert!(!zero.token);
    let one = manual.state(1).await;
    assert!(one.token && one.requesting);
    assert_eq!(one.father, None);
    assert_eq!(manual.state(2).await.father, Some(Rank(0)));

    manual.release(1).await;
    let one = manual.state(1).await;
    assert!(one.token && !one.requesting);
}

#[tokio::test]
async fn concurrent_requesters_are_served_one_after_the_other() {
    let manual = Manual::new(3);

    manual.request(1).await;
    manual.request(2).await;

    // Whoever reached the root first holds the token, the other is queued
    let (first, second) = tokio::select! {
        _ = manual.granted(1) => (1, 2),
        _ = manual.granted(2) => (2, 1),
    };
    manual
        .until(first, |s| s.next == Some(Rank(second)))
        .await;
    assert!(!manual.state(second).await.token);
    invariants::check_mutual_exclusion(&manual.states().await).unwrap();

    manual.release(first).await;
    manual.granted(second).await;
    assert!(!manual.state(first).await.token);
}

#[tokio::test]
async fn token_follows_request_order() {
    let manual = Manual::new(4);

    manual.request(1).await;
    manual.granted(1).await;
    manual.request(2).await;
    manual.until(1, |s| s.next == Some(Rank(2))).await;
    manual.request(3).await;
    manual.until(2, |s| s.next == Some(Rank(3))).await;

    manual.release(1).await;
    manual.granted(2).await;
    manual.release(2).await;
    manual.granted(3).await;
    manual.release(3).await;

    let states = manual.states().await;
    invariants::check_quiescent(&states).unwrap();
    assert!(states[3].token);
}

#[tokio::test]
async fn local_cluster_runs_every_round() {
    let config = ClusterConfig::new(5)
        .with_rounds(4)
        .with_hold(Duration::from_millis(1));

    let report = tokio::time::timeout(Duration::from_secs(30), LocalCluster::start(&config).unwrap().run_to_completion())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.entries(), vec![4; 5]);
    assert_eq!(report.order.len(), 20);
    assert!(report.holder().is_some());
}

#[tokio::test]
async fn local_cluster_with_nonzero_root() {
    let config = ClusterConfig::new(3)
        .with_root(Rank(2))
        .with_rounds(3)
        .with_hold(Duration::ZERO)
        .with_think(Duration::from_millis(1));

    let report = LocalCluster::start(&config)
        .unwrap()
        .run_to_completion()
        .await
        .unwrap();

    assert_eq!(report.total_entries(), 9);
    assert_eq!(report.order.len(), 9);
    assert_eq!(report.states[2].pid, Rank(2));
}

/// Sleeps while inside and notes how many ranks are inside at once
struct Crowding {
    inside: Arc<Mutex<u32>>,
    most: Arc<Mutex<u32>>,
}

#[async_trait]
impl CriticalWork for Crowding {
    async fn run(&mut self, _rank: Rank, _round: u64) -> Result<(), RuntimeError> {
        {
            let mut inside = self.inside.lock().unwrap();
            *inside += 1;
            let mut most = self.most.lock().unwrap();
            *most = (*most).max(*inside);
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        *self.inside.lock().unwrap() -= 1;
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn custom_work_never_overlaps() {
    let inside = Arc::new(Mutex::new(0));
    let most = Arc::new(Mutex::new(0));
    let config = ClusterConfig::new(4).with_rounds(5);

    let cluster = LocalCluster::start_with(&config, |_| Crowding {
        inside: inside.clone(),
        most: most.clone(),
    })
    .unwrap();
    let report = cluster.run_to_completion().await.unwrap();

    assert_eq!(report.total_entries(), 20);
    assert_eq!(*most.lock().unwrap(), 1);
    assert!(report.order.iter().all(|r| r.is_within(4)));
}

#[tokio::test]
async fn unbounded_run_to_completion_is_rejected() {
    let cluster = LocalCluster::start(&ClusterConfig::new(2)).unwrap();

    let result = cluster.run_to_completion().await;

    assert!(matches!(
        result,
        Err(RuntimeError::Config(ConfigError::Unbounded))
    ));
}

#[tokio::test]
async fn unbounded_cluster_stops_on_shutdown() {
    let config = ClusterConfig::new(3).with_hold(Duration::ZERO);
    let cluster = LocalCluster::start(&config).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let reports = tokio::time::timeout(WAIT, cluster.shutdown())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().map(|r| r.entries).sum::<u64>() > 0);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_start() {
    let config = ClusterConfig::new(2).with_root(Rank(4));

    assert!(matches!(
        LocalCluster::start(&config),
        Err(RuntimeError::Config(_))
    ));
}
