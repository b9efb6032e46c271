//! Central place for application-wide constants and default values.

/// Default application name (can be overridden in config)
pub const DEFAULT_APP_NAME: &str = "OverMesh";

/// Left padding used to align log lines with those that include emoji prefixes.
/// Keep this to a fixed width matching the emoji prefix you use elsewhere.
pub const ICON_PLACEHOLDER: &str = "   "; // Three spaces for alignment

/// Protocol branding shown in logs
pub const PROTOCOL_NAME: &str = "OverMesh";
/// Protocol version for compatibility checks (bump when wire format changes)
pub const PROTOCOL_VERSION: &str = "1";

/// Application / crate version (populated from Cargo.toml via env! macro)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum internal neighbors (peers that joined the mesh through this node)
pub const DEFAULT_INTERNAL_CAPACITY: usize = 10;

/// Maximum concurrently pooled inbound control connections
pub const DEFAULT_INBOUND_CAPACITY: usize = 10;

/// Seconds to wait for a NODESLIST reply from the rendezvous server
pub const DEFAULT_NODESLIST_WAIT_SECS: u64 = 2;

/// Seconds to wait for an outbound join connection to establish
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Seconds to wait for the optional SAFE reply after sending ENTRY
pub const DEFAULT_SAFE_WAIT_SECS: u64 = 2;

/// The "no peer" sentinel host: a direct join against it founds a new network
pub const FOUNDING_SENTINEL_HOST: &str = "0.0.0.0";

/// Human friendly composite version string used in prompts / logs.
pub fn full_version() -> String {
    format!("v{} (protocol={})", APP_VERSION, PROTOCOL_VERSION)
}
