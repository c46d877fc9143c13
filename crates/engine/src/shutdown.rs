// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative stop signal shared by a process's loops

use std::sync::Arc;
use tokio::sync::watch;

/// Create a connected trigger and listener
pub fn shutdown_signal() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(Arc::new(tx)), ShutdownListener(rx))
}

/// Raises the stop signal for every listener
#[derive(Clone, Debug)]
pub struct ShutdownTrigger(Arc<watch::Sender<bool>>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener(self.0.subscribe())
    }
}

/// Observes the stop signal
#[derive(Clone, Debug)]
pub struct ShutdownListener(watch::Receiver<bool>);

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once the signal is raised or every trigger is gone
    ///
    /// Cancel-safe, so it can sit in a `select!` next to a receive.
    pub async fn wait(&mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}
