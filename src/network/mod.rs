pub(crate) mod events;
pub mod join;
pub mod listener;
pub mod message;
pub mod registry;

pub use join::{assisted_join, direct_join, JoinError, JoinObserver, JoinOutcome, JoinTimeouts};
pub use listener::{Acceptor, InboundConnection, InboundRead};
pub use message::{ParseError, PeerMessage, RegistryReply, RegistryRequest};
pub use registry::{RegistryClient, RegistryError};
