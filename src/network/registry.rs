// src/network/registry.rs
// Registration client: speaks the rendezvous datagram protocol. One datagram
// per call; REG/UNREG do not wait for their confirmations (the event loop
// observes those asynchronously), NODES waits a bounded time for NODESLIST.

use crate::events::model::LogLevel;
use crate::network::events::emit_registry_event;
use crate::network::message::{RegistryReply, RegistryRequest};
use crate::topology::NodeAddress;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{timeout, Instant};

const MAX_DATAGRAM: usize = 2048;

#[derive(Debug)]
pub enum RegistryError {
    Io(std::io::Error),
    /// No NODESLIST reply within the bound. Distinct from an empty peer list:
    /// the server may simply be unreachable.
    Timeout,
    Resolution(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Io(e) => write!(f, "registry I/O error: {}", e),
            RegistryError::Timeout => write!(f, "no reply from rendezvous server"),
            RegistryError::Resolution(host) => {
                write!(f, "could not resolve rendezvous server '{}'", host)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        RegistryError::Io(e)
    }
}

pub struct RegistryClient {
    socket: UdpSocket,
    server: SocketAddr,
    nodeslist_wait: Duration,
}

impl RegistryClient {
    /// Resolves the server endpoint once; it stays fixed for process lifetime.
    pub async fn new(
        server_host: &str,
        server_port: u16,
        nodeslist_wait: Duration,
    ) -> Result<Self, RegistryError> {
        let target = format!("{}:{}", server_host, server_port);
        let server = lookup_host(&target)
            .await?
            .next()
            .ok_or_else(|| RegistryError::Resolution(target.clone()))?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            server,
            nodeslist_wait,
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Send `REG <net> <ip> <port>`. Send failures are reported and swallowed;
    /// the OKREG confirmation arrives asynchronously at the event loop.
    pub async fn register(&self, network: &str, node: &NodeAddress) {
        let msg = RegistryRequest::Register { network, node }.encode();
        match self.socket.send_to(msg.as_bytes(), self.server).await {
            Ok(_) => emit_registry_event(
                LogLevel::Info,
                "register_sent",
                Some(self.server.to_string()),
                Some(msg),
            ),
            Err(e) => emit_registry_event(
                LogLevel::Error,
                "register_send_failed",
                Some(self.server.to_string()),
                Some(e.to_string()),
            ),
        }
    }

    /// Send `UNREG <net> <ip> <port>`; OKUNREG is observed asynchronously.
    pub async fn unregister(&self, network: &str, node: &NodeAddress) {
        let msg = RegistryRequest::Unregister { network, node }.encode();
        match self.socket.send_to(msg.as_bytes(), self.server).await {
            Ok(_) => emit_registry_event(
                LogLevel::Info,
                "unregister_sent",
                Some(self.server.to_string()),
                Some(msg),
            ),
            Err(e) => emit_registry_event(
                LogLevel::Error,
                "unregister_send_failed",
                Some(self.server.to_string()),
                Some(e.to_string()),
            ),
        }
    }

    /// Send `NODES <net>` and wait up to the configured bound for a NODESLIST
    /// reply. Replies to other in-flight requests may interleave on the shared
    /// socket; they are classified and reported here rather than dropped.
    pub async fn request_peer_list(
        &self,
        network: &str,
    ) -> Result<Vec<NodeAddress>, RegistryError> {
        let msg = RegistryRequest::Nodes { network }.encode();
        self.socket.send_to(msg.as_bytes(), self.server).await?;

        let deadline = Instant::now() + self.nodeslist_wait;
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RegistryError::Timeout);
            }
            let (len, from) = match timeout(remaining, self.socket.recv_from(&mut buf)).await {
                Ok(res) => res?,
                Err(_) => return Err(RegistryError::Timeout),
            };
            let text = String::from_utf8_lossy(&buf[..len]);
            match RegistryReply::parse(&text) {
                RegistryReply::NodesList {
                    network: net,
                    peers,
                    skipped,
                } => {
                    if skipped > 0 {
                        emit_registry_event(
                            LogLevel::Warn,
                            "nodeslist_rows_skipped",
                            Some(from.to_string()),
                            Some(format!("net={} skipped={}", net, skipped)),
                        );
                    }
                    return Ok(peers);
                }
                other => {
                    // An OKREG/OKUNREG for an earlier request; report and keep
                    // waiting for the list within the same deadline.
                    emit_registry_event(
                        LogLevel::Debug,
                        "interleaved_reply",
                        Some(from.to_string()),
                        Some(format!("{:?}", other)),
                    );
                }
            }
        }
    }

    /// Receive one datagram for the event loop's readiness arm.
    pub async fn recv_datagram(&self) -> Result<(String, SocketAddr), RegistryError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        Ok((String::from_utf8_lossy(&buf[..len]).into_owned(), from))
    }
}
