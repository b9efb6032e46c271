// src/network/listener.rs
// Connection acceptor: owns the TCP listener and the bounded inbound pool.
// Each admitted connection gets a one-shot reader that delivers exactly one
// control line (plus the write half, so the event loop can answer with SAFE)
// and then the connection is closed. When the pool is full, new connections
// are accepted and immediately closed: backpressure by rejection, not queuing.

use crate::events::model::LogLevel;
use crate::network::events::emit_network_event;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// What the one-shot reader got out of the connection.
#[derive(Debug)]
pub enum InboundRead {
    Line(String),
    /// Peer closed without sending anything
    Eof,
    Error(String),
}

/// One accepted connection, after its single control line was read. The pool
/// slot is held until this is dropped by the event loop.
#[derive(Debug)]
pub struct InboundConnection {
    pub peer_addr: SocketAddr,
    pub read: InboundRead,
    pub writer: OwnedWriteHalf,
    pub received_at: Instant,
    _permit: OwnedSemaphorePermit,
}

pub struct Acceptor {
    listener: TcpListener,
    pool: Arc<Semaphore>,
    tx: mpsc::Sender<InboundConnection>,
}

impl Acceptor {
    /// Bind the control listener and create the channel the event loop drains.
    pub async fn bind(
        host: &str,
        port: u16,
        pool_capacity: usize,
    ) -> std::io::Result<(Self, mpsc::Receiver<InboundConnection>)> {
        let listener = TcpListener::bind((host, port)).await?;
        emit_network_event(
            "listener",
            LogLevel::Info,
            "listener_bind",
            Some(listener.local_addr()?.to_string()),
            None,
        );
        // Channel sized to the pool: there can never be more pending
        // connections than permits.
        let (tx, rx) = mpsc::channel(pool_capacity.max(1));
        Ok((
            Self {
                listener,
                pool: Arc::new(Semaphore::new(pool_capacity)),
                tx,
            },
            rx,
        ))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept at most one connection. Called from the event loop's readiness
    /// arm, so one accept per loop iteration.
    pub async fn accept_one(&self) -> std::io::Result<()> {
        let (stream, peer_addr) = self.listener.accept().await?;
        let permit = match self.pool.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                // Pool full: the peer is not notified, acceptable for a
                // control-plane channel.
                emit_network_event(
                    "listener",
                    LogLevel::Warn,
                    "inbound_pool_full",
                    Some(peer_addr.to_string()),
                    Some("connection closed".to_string()),
                );
                drop(stream);
                return Ok(());
            }
        };
        emit_network_event(
            "listener",
            LogLevel::Info,
            "incoming_connection",
            Some(peer_addr.to_string()),
            None,
        );

        let tx = self.tx.clone();
        let received_at = Instant::now();
        let (read_half, writer) = stream.into_split();
        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();
            let read = match reader.read_line(&mut line).await {
                Ok(0) => InboundRead::Eof,
                Ok(_) => InboundRead::Line(line),
                Err(e) => InboundRead::Error(e.to_string()),
            };
            // If the event loop is gone the connection just closes here.
            let _ = tx
                .send(InboundConnection {
                    peer_addr,
                    read,
                    writer,
                    received_at,
                    _permit: permit,
                })
                .await;
        });
        Ok(())
    }
}
