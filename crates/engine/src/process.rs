// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One process: a protocol cell driven by a dispatcher and a worker

use crate::config::WorkerOptions;
use crate::dispatcher::{DispatchStats, MessageDispatcher};
use crate::error::RuntimeError;
use crate::node::Node;
use crate::shutdown::ShutdownTrigger;
use crate::worker::{CriticalSectionWorker, CriticalWork, WorkerReport};
use pathlock_adapters::{Mailbox, Transport};
use pathlock_core::{ProcessState, Rank};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Final outcome of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    pub rank: Rank,
    /// Critical section entries; zero for a passive process
    pub entries: u64,
    pub dispatch: DispatchStats,
}

/// Handle to the two tasks of a running process
pub struct ProcessHandle<T> {
    node: Arc<Node<T>>,
    stop_signal: ShutdownTrigger,
    dispatcher: JoinHandle<Result<DispatchStats, RuntimeError>>,
    worker: Option<JoinHandle<Result<WorkerReport, RuntimeError>>>,
    finished: Option<WorkerReport>,
}

impl<T: Transport> ProcessHandle<T> {
    /// Start a dispatcher and a worker for `state`
    ///
    /// `shutdown` stops both loops. Either loop failing raises it, so
    /// processes sharing one trigger stop together.
    pub fn spawn<M, W>(
        state: ProcessState,
        transport: T,
        mailbox: M,
        work: W,
        options: WorkerOptions,
        shutdown: ShutdownTrigger,
    ) -> Self
    where
        M: Mailbox,
        W: CriticalWork,
    {
        let mut handle = Self::spawn_passive(state, transport, mailbox, shutdown);
        let worker = CriticalSectionWorker::new(handle.node.clone(), work, options)
            .run(handle.stop_signal.listener());
        let span = tracing::info_span!("worker", pid = %handle.node.pid());
        handle.worker = Some(tokio::spawn(
            stop_on_error(worker, handle.stop_signal.clone()).instrument(span),
        ));
        handle
    }

    /// Start only a dispatcher: the process forwards requests and passes
    /// the token on but never asks for it
    pub fn spawn_passive<M: Mailbox>(
        state: ProcessState,
        transport: T,
        mailbox: M,
        shutdown: ShutdownTrigger,
    ) -> Self {
        let node = Arc::new(Node::new(state, transport));
        let dispatcher = MessageDispatcher::new(node.clone(), mailbox).run(shutdown.listener());
        let span = tracing::info_span!("dispatcher", pid = %node.pid());
        let dispatcher = tokio::spawn(stop_on_error(dispatcher, shutdown.clone()).instrument(span));
        Self {
            node,
            stop_signal: shutdown,
            dispatcher,
            worker: None,
            finished: None,
        }
    }

    pub fn rank(&self) -> Rank {
        self.node.pid()
    }

    pub fn node(&self) -> &Arc<Node<T>> {
        &self.node
    }

    /// Wait for the worker to use up its rounds
    ///
    /// The dispatcher keeps serving peers afterwards. Resolves immediately
    /// for a passive process.
    ///
    /// Cancel safe: the worker stays attached until it has been joined, so
    /// a later call or [`shutdown`](Self::shutdown) still sees its result.
    pub async fn worker_finished(&mut self) -> Result<Option<WorkerReport>, RuntimeError> {
        if let Some(worker) = self.worker.as_mut() {
            let joined = flatten(worker.await);
            self.worker = None;
            self.finished = Some(joined?);
        }
        Ok(self.finished)
    }

    /// Stop both loops and collect their results
    pub async fn shutdown(mut self) -> Result<ProcessReport, RuntimeError> {
        self.stop_signal.trigger();
        let worker = self.worker_finished().await;
        let dispatch = join(self.dispatcher).await?;
        let entries = worker?.map_or(0, |report| report.entries);
        Ok(ProcessReport {
            rank: self.node.pid(),
            entries,
            dispatch,
        })
    }
}

async fn stop_on_error<R>(
    task: impl std::future::Future<Output = Result<R, RuntimeError>>,
    shutdown: ShutdownTrigger,
) -> Result<R, RuntimeError> {
    let result = task.await;
    if result.is_err() {
        shutdown.trigger();
    }
    result
}

async fn join<R>(handle: JoinHandle<Result<R, RuntimeError>>) -> Result<R, RuntimeError> {
    flatten(handle.await)
}

fn flatten<R>(
    joined: Result<Result<R, RuntimeError>, tokio::task::JoinError>,
) -> Result<R, RuntimeError> {
    joined.map_err(|e| RuntimeError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
