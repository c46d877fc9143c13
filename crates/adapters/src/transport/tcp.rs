// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP transport
//!
//! Every sender keeps one outgoing connection per peer, each behind its own
//! lock, so frames to a peer arrive in send order and a peer that is slow to
//! come up only delays sends to itself. The mailbox accepts any number of incoming
//! connections and merges their frames into one queue.

use super::{Mailbox, Transport, TransportError};
use crate::wire::{self, WireError};
use async_trait::async_trait;
use pathlock_core::{Envelope, Rank};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Default time spent retrying a connection to a peer that is not up yet
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Sending side of the TCP transport
#[derive(Clone)]
pub struct TcpTransport {
    peers: Arc<Vec<SocketAddr>>,
    connections: Arc<Vec<Mutex<Option<TcpStream>>>>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Transport addressing rank `i` at `peers[i]`
    pub fn new(peers: Vec<SocketAddr>) -> Self {
        let connections = peers.iter().map(|_| Mutex::new(None)).collect();
        Self {
            peers: Arc::new(peers),
            connections: Arc::new(connections),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn connect(&self, to: Rank) -> Result<TcpStream, TransportError> {
        let addr = *self
            .peers
            .get(to.index())
            .ok_or(TransportError::PeerUnreachable(to))?;

        let deadline = tokio::time::Instant::now() + self.connect_timeout;
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    tracing::debug!(peer = %to, %addr, "connected");
                    return Ok(stream);
                }
                Err(e) if tokio::time::Instant::now() < deadline => {
                    tracing::trace!(peer = %to, %addr, error = %e, "connect failed, retrying");
                    tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                }
                Err(e) => {
                    tracing::warn!(peer = %to, %addr, error = %e, "peer unreachable");
                    return Err(TransportError::PeerUnreachable(to));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let to = envelope.to;
        let payload = wire::encode(&envelope)?;

        let slot = self
            .connections
            .get(to.index())
            .ok_or(TransportError::PeerUnreachable(to))?;
        let mut connection = slot.lock().await;
        if connection.is_none() {
            *connection = Some(self.connect(to).await?);
        }
        let Some(stream) = connection.as_mut() else {
            return Err(TransportError::PeerUnreachable(to));
        };

        if let Err(e) = wire::write_frame(stream, &payload).await {
            // Frames written to a broken connection may be lost
            *connection = None;
            tracing::warn!(peer = %to, error = %e, "write failed");
            return Err(TransportError::PeerUnreachable(to));
        }
        Ok(())
    }
}

/// Receiving side of the TCP transport
pub struct TcpMailbox {
    rank: Rank,
    local_addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Envelope>,
    accept_task: JoinHandle<()>,
}

impl TcpMailbox {
    /// Listen for peers of `rank` on `addr`
    pub async fn bind(rank: Rank, addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let accept_task = tokio::spawn(accept_loop(rank, listener, tx));
        tracing::info!(%rank, %local_addr, "mailbox listening");

        Ok(Self {
            rank,
            local_addr,
            rx,
            accept_task,
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Address actually bound, useful with port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for TcpMailbox {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

#[async_trait]
impl Mailbox for TcpMailbox {
    async fn recv(&mut self) -> Result<Option<Envelope>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

async fn accept_loop(rank: Rank, listener: TcpListener, tx: mpsc::UnboundedSender<Envelope>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                tracing::debug!(%rank, %peer_addr, "accepted connection");
                tokio::spawn(read_connection(stream, peer_addr, tx.clone()));
            }
            Err(e) => {
                tracing::error!(%rank, error = %e, "accept failed");
                tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
            }
        }
        if tx.is_closed() {
            break;
        }
    }
}

async fn read_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    tx: mpsc::UnboundedSender<Envelope>,
) {
    loop {
        let frame = match wire::read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(WireError::ConnectionClosed) => {
                tracing::debug!(%peer_addr, "connection closed");
                return;
            }
            Err(WireError::FrameTooLarge(len)) => {
                if let Err(e) = skip(&mut stream, len).await {
                    tracing::warn!(%peer_addr, error = %e, "dropping connection");
                    return;
                }
                tracing::warn!(%peer_addr, len, "discarding oversized frame");
                continue;
            }
            Err(e) => {
                // Framing is lost; nothing after this point can be trusted
                tracing::warn!(%peer_addr, error = %e, "dropping connection");
                return;
            }
        };

        match wire::decode(&frame) {
            Ok(envelope) => {
                if tx.send(envelope).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(%peer_addr, error = %e, "discarding malformed message");
            }
        }
    }
}

/// Consume the payload of a frame whose prefix has been read
async fn skip(stream: &mut TcpStream, len: usize) -> std::io::Result<()> {
    let expected = len as u64;
    let skipped = tokio::io::copy(&mut stream.take(expected), &mut tokio::io::sink()).await?;
    if skipped < expected {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
