// src/node.rs
// The process-wide driver: one task owns the topology and multiplexes stdin
// commands, the rendezvous datagram socket, the control listener and the
// pooled inbound connections. Stdin is polled before network sources, so a
// user command is never starved by peer traffic.

use crate::config::Config;
use crate::constants::{DEFAULT_APP_NAME, ICON_PLACEHOLDER};
use crate::events::{
    dispatcher,
    model::{LogEvent, LogLevel, SystemEvent},
};
use crate::network::events::{emit_network_event, emit_registry_event, emit_topology_event};
use crate::network::join::{self, JoinObserver, JoinOutcome, JoinTimeouts};
use crate::network::listener::{Acceptor, InboundConnection, InboundRead};
use crate::network::message::{ParseError, PeerMessage, RegistryReply};
use crate::network::registry::RegistryClient;
use crate::prompt::{help_text, parse_command, Command, CommandError};
use crate::topology::{NodeAddress, Topology, TopologyError};
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Effect of one inbound control line on the topology. Pure apart from the
/// topology mutation itself, so the protocol rules are testable without
/// sockets.
#[derive(Debug)]
pub enum InboundOutcome {
    /// ENTRY accepted; answer with this SAFE assignment before closing.
    InternalAdded {
        peer: NodeAddress,
        safe_reply: PeerMessage,
    },
    /// ENTRY rejected (capacity or duplicate); nothing is sent back, the
    /// protocol has no negative acknowledgment.
    InternalRejected {
        peer: NodeAddress,
        error: TopologyError,
    },
    SafeguardUpdated(NodeAddress),
    /// Unknown verb or wrong shape; no topology change.
    Malformed(ParseError),
}

/// Apply one peer control line to the topology. An accepted ENTRY earns a
/// SAFE reply carrying our external neighbor: the founder hands out itself,
/// a deeper node hands the newcomer a backup that is not its direct parent.
pub fn apply_peer_line(topology: &mut Topology, line: &str) -> InboundOutcome {
    match PeerMessage::parse(line) {
        Ok(PeerMessage::Entry(peer)) => match topology.add_internal(peer.clone()) {
            Ok(()) => InboundOutcome::InternalAdded {
                peer,
                safe_reply: PeerMessage::Safe(topology.external().clone()),
            },
            Err(error) => InboundOutcome::InternalRejected { peer, error },
        },
        Ok(PeerMessage::Safe(addr)) => {
            topology.set_safeguard(addr.clone());
            InboundOutcome::SafeguardUpdated(addr)
        }
        Err(e) => InboundOutcome::Malformed(e),
    }
}

pub struct Node {
    config: Config,
    topology: Topology,
    registry: RegistryClient,
    acceptor: Acceptor,
    inbound_rx: mpsc::Receiver<InboundConnection>,
    observer: Arc<dyn JoinObserver>,
    /// Network we registered with, for the UNREG on exit
    joined_network: Option<String>,
}

impl Node {
    pub async fn new(config: Config, observer: Arc<dyn JoinObserver>) -> anyhow::Result<Self> {
        let topology = Topology::new(config.local_address(), config.internal_capacity());
        let registry = RegistryClient::new(
            &config.registry_host,
            config.registry_port,
            config.nodeslist_wait(),
        )
        .await
        .context("rendezvous endpoint setup failed")?;
        let (acceptor, inbound_rx) =
            Acceptor::bind(&config.host, config.port, config.inbound_capacity())
                .await
                .context("control listener bind failed")?;
        Ok(Self {
            config,
            topology,
            registry,
            acceptor,
            inbound_rx,
            observer,
            joined_network: None,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    fn app_name(&self) -> String {
        self.config
            .app_name
            .clone()
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
    }

    fn join_timeouts(&self) -> JoinTimeouts {
        JoinTimeouts {
            connect: self.config.connect_timeout(),
            safe_wait: self.config.safe_wait(),
        }
    }

    /// Run until `exit`, stdin EOF or Ctrl+C. A failure of the multiplexing
    /// itself (stdin breaking) is fatal and bubbles up; individual socket
    /// errors are reported and the loop keeps running.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!(
            "🟢 {} is running. Type 'help' for commands.",
            self.app_name()
        );

        loop {
            tokio::select! {
                biased;

                line = lines.next_line() => {
                    match line {
                        Ok(Some(input)) => {
                            if !self.handle_command(&input).await {
                                break;
                            }
                        }
                        Ok(None) => {
                            // stdin closed; same path as `exit`
                            self.shutdown().await;
                            break;
                        }
                        Err(e) => {
                            self.shutdown().await;
                            return Err(e).context("stdin read failed");
                        }
                    }
                }

                Some(conn) = self.inbound_rx.recv() => {
                    self.handle_inbound(conn).await;
                }

                res = self.acceptor.accept_one() => {
                    if let Err(e) = res {
                        emit_network_event(
                            "listener",
                            LogLevel::Error,
                            "accept_failed",
                            None,
                            Some(e.to_string()),
                        );
                    }
                }

                dgram = self.registry.recv_datagram() => {
                    match dgram {
                        Ok((text, from)) => self.handle_datagram(&text, from),
                        Err(e) => emit_registry_event(
                            LogLevel::Warn,
                            "recv_failed",
                            None,
                            Some(e.to_string()),
                        ),
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    println!();
                    self.shutdown().await;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Returns false when the loop should stop.
    async fn handle_command(&mut self, input: &str) -> bool {
        match parse_command(input) {
            Ok(Command::ShowTopology) => {
                println!("{}", self.topology.snapshot().render());
            }
            Ok(Command::Help) => {
                println!("{}", help_text());
            }
            Ok(Command::Exit) => {
                self.shutdown().await;
                return false;
            }
            Ok(Command::DirectJoin { network, peer }) => {
                self.do_direct_join(&network, &peer).await;
            }
            Ok(Command::Join { network }) => {
                self.do_assisted_join(&network).await;
            }
            Err(CommandError::Empty) => {}
            Err(e) => {
                println!("⚠️ {}. Type 'help' for commands.", e);
            }
        }
        true
    }

    async fn do_direct_join(&mut self, network: &str, peer: &NodeAddress) {
        let me = self.topology.me().clone();
        match join::direct_join(&me, peer, self.join_timeouts()).await {
            Ok(outcome) => {
                self.apply_join_outcome(network, outcome);
                // Direct join and registration are composed here, not fused
                // inside the join state machine.
                self.registry.register(network, &me).await;
                let snapshot = self.topology.snapshot();
                self.observer.on_joined(&snapshot);
            }
            Err(e) => {
                println!("❌ {}", e);
                self.observer.on_join_failed(&e);
            }
        }
    }

    async fn do_assisted_join(&mut self, network: &str) {
        let me = self.topology.me().clone();
        match join::assisted_join(&self.registry, &me, network, self.join_timeouts()).await {
            Ok(outcome) => {
                self.apply_join_outcome(network, outcome);
                self.registry.register(network, &me).await;
                let snapshot = self.topology.snapshot();
                self.observer.on_joined(&snapshot);
            }
            Err(e) => {
                // A silent rendezvous server is not an empty network; do not
                // found one next to a mesh we merely failed to reach.
                println!("❌ {}", e);
                self.observer.on_join_failed(&e);
            }
        }
    }

    fn apply_join_outcome(&mut self, network: &str, outcome: JoinOutcome) {
        if outcome.founded {
            self.topology.found_network();
            println!(
                "{}Created network {} with this node (first node).",
                ICON_PLACEHOLDER, network
            );
            emit_topology_event(
                LogLevel::Info,
                "network_founded",
                Some(self.topology.me().to_string()),
                Some(format!("net={}", network)),
            );
        } else {
            self.topology.set_external(outcome.external.clone());
            if let Some(safeguard) = outcome.safeguard {
                self.topology.set_safeguard(safeguard);
            }
            println!(
                "{}Joined network {} through {}.",
                ICON_PLACEHOLDER, network, outcome.external
            );
            emit_topology_event(
                LogLevel::Info,
                "external_set",
                Some(outcome.external.to_string()),
                Some(format!("net={}", network)),
            );
        }
        self.joined_network = Some(network.to_string());
    }

    async fn handle_inbound(&mut self, mut conn: InboundConnection) {
        match conn.read {
            InboundRead::Line(ref line) => {
                match apply_peer_line(&mut self.topology, line) {
                    InboundOutcome::InternalAdded { peer, safe_reply } => {
                        println!("{}Added internal neighbor: {}", ICON_PLACEHOLDER, peer);
                        emit_topology_event(
                            LogLevel::Info,
                            "internal_added",
                            Some(peer.to_string()),
                            Some(format!(
                                "total={}/{}",
                                self.topology.internal().len(),
                                self.topology.capacity()
                            )),
                        );
                        if let Err(e) = conn.writer.write_all(safe_reply.encode().as_bytes()).await
                        {
                            emit_network_event(
                                "listener",
                                LogLevel::Warn,
                                "safe_reply_failed",
                                Some(conn.peer_addr.to_string()),
                                Some(e.to_string()),
                            );
                        }
                        let _ = conn.writer.shutdown().await;
                    }
                    InboundOutcome::InternalRejected { peer, error } => {
                        println!("{}{}", ICON_PLACEHOLDER, error);
                        emit_topology_event(
                            LogLevel::Warn,
                            "internal_rejected",
                            Some(peer.to_string()),
                            Some(error.to_string()),
                        );
                    }
                    InboundOutcome::SafeguardUpdated(addr) => {
                        println!("{}Updated safeguard neighbor: {}", ICON_PLACEHOLDER, addr);
                        emit_topology_event(
                            LogLevel::Info,
                            "safeguard_updated",
                            Some(addr.to_string()),
                            None,
                        );
                    }
                    InboundOutcome::Malformed(e) => {
                        emit_network_event(
                            "listener",
                            LogLevel::Warn,
                            "malformed_message",
                            Some(conn.peer_addr.to_string()),
                            Some(e.to_string()),
                        );
                    }
                }
            }
            InboundRead::Eof => {
                emit_network_event(
                    "listener",
                    LogLevel::Debug,
                    "inbound_closed_silent",
                    Some(conn.peer_addr.to_string()),
                    None,
                );
            }
            InboundRead::Error(ref e) => {
                emit_network_event(
                    "listener",
                    LogLevel::Warn,
                    "inbound_read_error",
                    Some(conn.peer_addr.to_string()),
                    Some(e.clone()),
                );
            }
        }
        // Dropping the connection closes it and frees its pool slot; the
        // protocol is one-shot per connection.
    }

    fn handle_datagram(&mut self, text: &str, from: SocketAddr) {
        match RegistryReply::parse(text) {
            RegistryReply::OkReg(_) => {
                println!("{}Registration confirmed.", ICON_PLACEHOLDER);
                emit_registry_event(LogLevel::Info, "registration_confirmed", Some(from.to_string()), None);
            }
            RegistryReply::OkUnreg(_) => {
                println!("{}Unregistration confirmed.", ICON_PLACEHOLDER);
                emit_registry_event(LogLevel::Info, "unregistration_confirmed", Some(from.to_string()), None);
            }
            RegistryReply::NodesList { network, peers, .. } => {
                // Not inside a request_peer_list wait, so nobody asked for
                // this; record it and move on.
                emit_registry_event(
                    LogLevel::Info,
                    "unsolicited_nodeslist",
                    Some(from.to_string()),
                    Some(format!("net={} peers={}", network, peers.len())),
                );
            }
            RegistryReply::Unknown(raw) => {
                emit_registry_event(
                    LogLevel::Warn,
                    "unknown_reply",
                    Some(from.to_string()),
                    Some(raw),
                );
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Some(network) = self.joined_network.take() {
            let me = self.topology.me().clone();
            self.registry.unregister(&network, &me).await;
        }
        let mut meta = dispatcher::meta("node", LogLevel::Info);
        meta.corr_id = Some(dispatcher::correlation_id());
        dispatcher::emit(LogEvent::System(SystemEvent {
            meta,
            action: "shutdown".into(),
            detail: None,
        }));
        println!("🛑 {} shutting down gracefully.", self.app_name());
        // Listener, datagram socket and pooled connections close on drop.
    }
}
