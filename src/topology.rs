// src/topology.rs
// Bounded local view of the overlay: who we joined through (external), the
// fallback neighbor the external supplied (safeguard), and the peers that
// joined through us (internal). Pure data, no I/O.

use crate::constants::FOUNDING_SENTINEL_HOST;
use std::fmt;

/// Host + port identity of a node on the overlay. Equality is exact string
/// match on the host; no DNS normalization is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The "no peer" address (`0.0.0.0:*`): direct-joining it founds a new
    /// network instead of dialing anyone.
    pub fn is_founding_sentinel(&self) -> bool {
        self.host == FOUNDING_SENTINEL_HOST
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The internal neighbor list is at capacity; the candidate was rejected
    /// and existing entries are untouched.
    InternalFull { capacity: usize },
    /// The candidate is already an internal neighbor.
    DuplicateInternal(NodeAddress),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::InternalFull { capacity } => {
                write!(f, "internal neighbor limit reached ({})", capacity)
            }
            TopologyError::DuplicateInternal(addr) => {
                write!(f, "{} is already an internal neighbor", addr)
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// The node's topology state. Owned by the event loop task; every handler
/// mutates it through that single owner.
#[derive(Debug, Clone)]
pub struct Topology {
    me: NodeAddress,
    external: NodeAddress,
    safeguard: NodeAddress,
    internal: Vec<NodeAddress>,
    capacity: usize,
}

impl Topology {
    /// A node that has not joined anything is a network of one: it is its own
    /// external and safeguard neighbor.
    pub fn new(me: NodeAddress, capacity: usize) -> Self {
        Self {
            external: me.clone(),
            safeguard: me.clone(),
            me,
            internal: Vec::new(),
            capacity,
        }
    }

    pub fn me(&self) -> &NodeAddress {
        &self.me
    }

    pub fn external(&self) -> &NodeAddress {
        &self.external
    }

    pub fn safeguard(&self) -> &NodeAddress {
        &self.safeguard
    }

    pub fn internal(&self) -> &[NodeAddress] {
        &self.internal
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_external(&mut self, addr: NodeAddress) {
        self.external = addr;
    }

    /// Replaces the whole safeguard address; there is no partial update.
    pub fn set_safeguard(&mut self, addr: NodeAddress) {
        self.safeguard = addr;
    }

    /// Append a peer that joined through us. Arrival order is preserved.
    /// Duplicates and over-capacity candidates are rejected without touching
    /// existing entries.
    pub fn add_internal(&mut self, addr: NodeAddress) -> Result<(), TopologyError> {
        if self.internal.contains(&addr) {
            return Err(TopologyError::DuplicateInternal(addr));
        }
        if self.internal.len() >= self.capacity {
            return Err(TopologyError::InternalFull {
                capacity: self.capacity,
            });
        }
        self.internal.push(addr);
        Ok(())
    }

    /// Found a new network: this node becomes its own external and safeguard
    /// neighbor. Internal neighbors are kept; they joined through us and a
    /// re-found does not disown them.
    pub fn found_network(&mut self) {
        self.external = self.me.clone();
        self.safeguard = self.me.clone();
    }

    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            me: self.me.clone(),
            external: self.external.clone(),
            safeguard: self.safeguard.clone(),
            internal: self.internal.clone(),
        }
    }
}

/// Read-only copy handed to observers and the `show topology` command.
#[derive(Debug, Clone)]
pub struct TopologySnapshot {
    pub me: NodeAddress,
    pub external: NodeAddress,
    pub safeguard: NodeAddress,
    pub internal: Vec<NodeAddress>,
}

impl TopologySnapshot {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("----- Current Topology -----\n");
        out.push_str(&format!("External Neighbor: {}\n", self.external));
        out.push_str(&format!("Safeguard Neighbor: {}\n", self.safeguard));
        out.push_str(&format!("Internal Neighbors ({}):\n", self.internal.len()));
        for n in &self.internal {
            out.push_str(&format!("  {}\n", n));
        }
        out.push_str("----------------------------");
        out
    }
}
