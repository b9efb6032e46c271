//! OverMesh public prelude (curated stable-intent exports).
//! Import with: `use overmesh::prelude::*;`

pub use crate::config::Config;
pub use crate::network::join::{JoinError, JoinObserver, JoinOutcome, NoopObserver};
pub use crate::network::message::{PeerMessage, RegistryReply, RegistryRequest};
pub use crate::node::Node;
pub use crate::topology::{NodeAddress, Topology, TopologySnapshot};
