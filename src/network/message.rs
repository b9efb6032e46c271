// src/network/message.rs
// Text codecs for both control protocols: one-shot peer lines over TCP and
// rendezvous datagrams over UDP. Encoding is infallible; parsing returns a
// typed error and never panics on malformed input.

use crate::topology::NodeAddress;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    /// Verb is not part of the protocol
    UnknownVerb(String),
    /// Line did not split into the expected number of tokens
    TokenCount { expected: usize, found: usize },
    BadPort(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty message"),
            ParseError::UnknownVerb(v) => write!(f, "unknown verb '{}'", v),
            ParseError::TokenCount { expected, found } => {
                write!(f, "expected {} tokens, found {}", expected, found)
            }
            ParseError::BadPort(p) => write!(f, "invalid port '{}'", p),
        }
    }
}

impl std::error::Error for ParseError {}

/// Peer control protocol: exactly one message per connection, sender closes
/// after writing, receiver closes after reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerMessage {
    /// `ENTRY <ip> <port>` — the sender joined the mesh through us
    Entry(NodeAddress),
    /// `SAFE <ip> <port>` — safeguard neighbor assignment
    Safe(NodeAddress),
}

impl PeerMessage {
    pub fn encode(&self) -> String {
        match self {
            PeerMessage::Entry(a) => format!("ENTRY {} {}\n", a.host, a.port),
            PeerMessage::Safe(a) => format!("SAFE {} {}\n", a.host, a.port),
        }
    }

    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(ParseError::Empty),
            [verb, host, port] => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| ParseError::BadPort(port.to_string()))?;
                let addr = NodeAddress::new(*host, port);
                match *verb {
                    "ENTRY" => Ok(PeerMessage::Entry(addr)),
                    "SAFE" => Ok(PeerMessage::Safe(addr)),
                    other => Err(ParseError::UnknownVerb(other.to_string())),
                }
            }
            tokens => Err(ParseError::TokenCount {
                expected: 3,
                found: tokens.len(),
            }),
        }
    }
}

/// Requests this node sends to the rendezvous server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryRequest<'a> {
    Register {
        network: &'a str,
        node: &'a NodeAddress,
    },
    Unregister {
        network: &'a str,
        node: &'a NodeAddress,
    },
    Nodes {
        network: &'a str,
    },
}

impl RegistryRequest<'_> {
    pub fn encode(&self) -> String {
        match self {
            RegistryRequest::Register { network, node } => {
                format!("REG {} {} {}", network, node.host, node.port)
            }
            RegistryRequest::Unregister { network, node } => {
                format!("UNREG {} {} {}", network, node.host, node.port)
            }
            RegistryRequest::Nodes { network } => format!("NODES {}", network),
        }
    }
}

/// Replies from the rendezvous server, classified by leading token. The
/// datagram socket is connectionless and replies may interleave, so
/// classification never fails; anything unrecognized is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryReply {
    OkReg(String),
    OkUnreg(String),
    /// `NODESLIST <net>` followed by newline-delimited `<ip> <port>` rows.
    /// Malformed rows are skipped, not fatal; `skipped` counts them so the
    /// caller can report the loss.
    NodesList {
        network: String,
        peers: Vec<NodeAddress>,
        skipped: usize,
    },
    Unknown(String),
}

impl RegistryReply {
    pub fn parse(datagram: &str) -> Self {
        let mut lines = datagram.lines();
        let header = lines.next().unwrap_or("");
        let mut head_tokens = header.split_whitespace();
        match head_tokens.next() {
            Some("OKREG") => RegistryReply::OkReg(datagram.trim_end().to_string()),
            Some("OKUNREG") => RegistryReply::OkUnreg(datagram.trim_end().to_string()),
            Some("NODESLIST") => {
                let network = head_tokens.next().unwrap_or("").to_string();
                let mut peers = Vec::new();
                let mut skipped = 0usize;
                for row in lines {
                    if row.trim().is_empty() {
                        continue;
                    }
                    let tokens: Vec<&str> = row.split_whitespace().collect();
                    match tokens.as_slice() {
                        [host, port] => match port.parse::<u16>() {
                            Ok(port) => peers.push(NodeAddress::new(*host, port)),
                            Err(_) => skipped += 1,
                        },
                        _ => skipped += 1,
                    }
                }
                RegistryReply::NodesList {
                    network,
                    peers,
                    skipped,
                }
            }
            _ => RegistryReply::Unknown(datagram.trim_end().to_string()),
        }
    }
}
