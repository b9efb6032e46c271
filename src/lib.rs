//! # OverMesh Core Library
//!
//! Overlay-network node: joins a peer-to-peer mesh by contacting a rendezvous
//! (registration) server and/or directly handshaking with an existing member,
//! then maintains a small, bounded view of its local topology.
//!
//! ## Design Principles
//! * Single-owner state: the event loop task owns the topology; listeners and
//!   readers feed it over channels, so no locking is needed.
//! * Bounded everything: internal neighbors, the inbound connection pool and
//!   every network wait have explicit limits.
//! * One-shot control connections: exactly one message per inbound TCP
//!   connection, then close. No persistent peer sessions.
//! * Stdin first: user commands are polled before network readiness, so the
//!   prompt is never starved by peer traffic.
//! * Event-driven instrumentation (JSON line log + console).
//!
//! ## Key Modules
//! * `config` – Runtime configuration (TOML file + CLI precedence).
//! * `topology` – Neighbor relations: external, safeguard, bounded internal.
//! * `network` – Wire codecs, rendezvous client, join protocol, acceptor.
//! * `node` – The event loop driving all of the above.
//! * `events` – Structured logging/events dispatcher.
//! * `prompt` – Interactive command parsing.
//!
//! The content store and pending-interest layers of a full content-centric
//! node attach behind [`network::join::JoinObserver`]; this crate only calls
//! their hooks.

pub mod config;
pub mod constants;
pub mod events;
pub mod network;
pub mod node;
pub mod prelude; // curated stable-intent re-exports
pub mod prompt;
pub mod topology;
