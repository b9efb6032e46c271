// src/network/join.rs
// Join protocol: direct join (dial a known member, send ENTRY, optionally
// collect a SAFE safeguard assignment) and assisted join (ask the rendezvous
// server for candidates first). Every network wait is bounded; a connect
// failure aborts the attempt with no retry.

use crate::events::model::LogLevel;
use crate::network::events::emit_network_event;
use crate::network::message::PeerMessage;
use crate::network::registry::{RegistryClient, RegistryError};
use crate::topology::{NodeAddress, TopologySnapshot};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Phases of one join attempt. A founding join goes straight from `Idle` to
/// `Joined`; a dialing join passes through `Connecting` and `Handshaking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPhase {
    Idle,
    Connecting,
    Handshaking,
    Joined,
    Failed,
}

#[derive(Debug)]
pub enum JoinError {
    Connect {
        peer: NodeAddress,
        detail: String,
    },
    Handshake {
        peer: NodeAddress,
        detail: String,
    },
    /// The rendezvous server did not answer the NODES request. Distinct from
    /// an empty candidate list, which legitimately founds a new network.
    RegistryUnreachable(RegistryError),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Connect { peer, detail } => {
                write!(f, "could not connect to {}: {}", peer, detail)
            }
            JoinError::Handshake { peer, detail } => {
                write!(f, "handshake with {} failed: {}", peer, detail)
            }
            JoinError::RegistryUnreachable(e) => write!(f, "assisted join aborted: {}", e),
        }
    }
}

impl std::error::Error for JoinError {}

/// Result of a successful join attempt, to be applied to the topology by the
/// caller (the event loop owns the topology; this module only does the wire
/// work).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The peer we attached through; ourselves when we founded the network.
    pub external: NodeAddress,
    /// Safeguard assignment from the SAFE reply, if one arrived in time.
    pub safeguard: Option<NodeAddress>,
    /// True when no peer was dialed and this node founded the network.
    pub founded: bool,
}

/// Hooks for the layers behind the topology engine (content store, interest
/// table). The engine calls them and consumes nothing back.
pub trait JoinObserver: Send + Sync {
    fn on_joined(&self, _snapshot: &TopologySnapshot) {}
    fn on_join_failed(&self, _reason: &JoinError) {}
}

/// Default observer for nodes running without a content layer.
pub struct NoopObserver;

impl JoinObserver for NoopObserver {}

/// Bounds for the dial-and-handshake sequence.
#[derive(Debug, Clone, Copy)]
pub struct JoinTimeouts {
    pub connect: Duration,
    pub safe_wait: Duration,
}

/// Dial `peer`, announce ourselves with ENTRY and collect the optional SAFE
/// reply. The founding sentinel (`0.0.0.0:*`) skips all I/O and founds a new
/// network. On success `external` is always the dialed peer, whether or not
/// a SAFE reply arrived.
pub async fn direct_join(
    me: &NodeAddress,
    peer: &NodeAddress,
    timeouts: JoinTimeouts,
) -> Result<JoinOutcome, JoinError> {
    if peer.is_founding_sentinel() {
        emit_network_event(
            "join",
            LogLevel::Info,
            "network_founded",
            Some(me.to_string()),
            None,
        );
        return Ok(JoinOutcome {
            external: me.clone(),
            safeguard: Some(me.clone()),
            founded: true,
        });
    }

    emit_network_event(
        "join",
        LogLevel::Info,
        "dial_start",
        Some(peer.to_string()),
        Some(format!("phase={:?}", JoinPhase::Connecting)),
    );
    let stream = match timeout(timeouts.connect, TcpStream::connect((peer.host.as_str(), peer.port)))
        .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            emit_network_event(
                "join",
                LogLevel::Warn,
                "dial_failed",
                Some(peer.to_string()),
                Some(format!("phase={:?} error={}", JoinPhase::Failed, e)),
            );
            return Err(JoinError::Connect {
                peer: peer.clone(),
                detail: e.to_string(),
            });
        }
        Err(_) => {
            emit_network_event(
                "join",
                LogLevel::Warn,
                "dial_timeout",
                Some(peer.to_string()),
                Some(format!("after {:?}", timeouts.connect)),
            );
            return Err(JoinError::Connect {
                peer: peer.clone(),
                detail: "connect timed out".to_string(),
            });
        }
    };

    // Handshaking: one ENTRY out, at most one SAFE back, then close.
    let (read_half, mut write_half) = stream.into_split();
    let entry = PeerMessage::Entry(me.clone()).encode();
    if let Err(e) = write_half.write_all(entry.as_bytes()).await {
        return Err(JoinError::Handshake {
            peer: peer.clone(),
            detail: e.to_string(),
        });
    }
    emit_network_event(
        "join",
        LogLevel::Info,
        "entry_sent",
        Some(peer.to_string()),
        Some(format!("phase={:?}", JoinPhase::Handshaking)),
    );

    let safeguard = read_safe_reply(read_half, timeouts.safe_wait, peer).await;
    // Sender closes after writing; dropping the halves closes our side.
    let _ = write_half.shutdown().await;

    emit_network_event(
        "join",
        LogLevel::Info,
        "join_complete",
        Some(peer.to_string()),
        Some(format!(
            "phase={:?} safeguard={:?}",
            JoinPhase::Joined,
            safeguard.as_ref().map(|s| s.to_string())
        )),
    );
    Ok(JoinOutcome {
        external: peer.clone(),
        safeguard,
        founded: false,
    })
}

/// Wait briefly for the external neighbor's SAFE assignment. No reply, an
/// early close or an unparsable line all leave the safeguard untouched; the
/// join itself still succeeds.
async fn read_safe_reply(
    read_half: tokio::net::tcp::OwnedReadHalf,
    wait: Duration,
    peer: &NodeAddress,
) -> Option<NodeAddress> {
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    match timeout(wait, reader.read_line(&mut line)).await {
        Ok(Ok(0)) | Err(_) => None,
        Ok(Ok(_)) => match PeerMessage::parse(&line) {
            Ok(PeerMessage::Safe(addr)) => Some(addr),
            Ok(other) => {
                emit_network_event(
                    "join",
                    LogLevel::Debug,
                    "unexpected_handshake_reply",
                    Some(peer.to_string()),
                    Some(format!("{:?}", other)),
                );
                None
            }
            Err(e) => {
                emit_network_event(
                    "join",
                    LogLevel::Debug,
                    "malformed_handshake_reply",
                    Some(peer.to_string()),
                    Some(e.to_string()),
                );
                None
            }
        },
        Ok(Err(e)) => {
            emit_network_event(
                "join",
                LogLevel::Debug,
                "handshake_read_error",
                Some(peer.to_string()),
                Some(e.to_string()),
            );
            None
        }
    }
}

/// Ask the rendezvous server for candidates, then direct-join one of them,
/// chosen uniformly at random to spread join load. An empty candidate list
/// founds a new network; a server timeout fails the attempt instead of
/// founding one next to an unreachable mesh.
pub async fn assisted_join(
    registry: &RegistryClient,
    me: &NodeAddress,
    network: &str,
    timeouts: JoinTimeouts,
) -> Result<JoinOutcome, JoinError> {
    let peers = match registry.request_peer_list(network).await {
        Ok(peers) => peers,
        Err(e) => return Err(JoinError::RegistryUnreachable(e)),
    };

    if peers.is_empty() {
        emit_network_event(
            "join",
            LogLevel::Info,
            "no_candidates",
            None,
            Some(format!("net={}", network)),
        );
        let sentinel = NodeAddress::new(crate::constants::FOUNDING_SENTINEL_HOST, 0);
        return direct_join(me, &sentinel, timeouts).await;
    }

    let idx = rand::thread_rng().gen_range(0..peers.len());
    let candidate = peers[idx].clone();
    emit_network_event(
        "join",
        LogLevel::Info,
        "candidate_selected",
        Some(candidate.to_string()),
        Some(format!("of {}", peers.len())),
    );
    direct_join(me, &candidate, timeouts).await
}
