use crate::constants::*;
use crate::topology::NodeAddress;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address peers use to reach this node's control listener
    pub host: String,
    pub port: u16,
    /// Rendezvous (registration) server endpoint; resolved once at startup
    pub registry_host: String,
    pub registry_port: u16,
    /// Opaque content-cache size hint, forwarded to the content store layer
    pub cache_size: Option<usize>,
    pub app_name: Option<String>,
    /// Logging / events configuration
    pub logging: Option<LoggingConfig>,
    /// Capacity bounds (internal neighbors, inbound connection pool)
    pub limits: Option<LimitsConfig>,
    /// Bounded waits for join and rendezvous traffic
    pub timeouts: Option<TimeoutsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 58000,
            registry_host: "127.0.0.1".to_string(),
            registry_port: 59000,
            cache_size: None,
            app_name: None,
            logging: None,
            limits: Some(LimitsConfig::default()),
            timeouts: Some(TimeoutsConfig::default()),
        }
    }
}

impl Config {
    /// The identity this node advertises in ENTRY messages and registrations.
    pub fn local_address(&self) -> NodeAddress {
        NodeAddress::new(self.host.clone(), self.port)
    }

    pub fn internal_capacity(&self) -> usize {
        self.limits
            .as_ref()
            .and_then(|l| l.internal_capacity)
            .unwrap_or(DEFAULT_INTERNAL_CAPACITY)
    }

    pub fn inbound_capacity(&self) -> usize {
        self.limits
            .as_ref()
            .and_then(|l| l.inbound_capacity)
            .unwrap_or(DEFAULT_INBOUND_CAPACITY)
    }

    pub fn nodeslist_wait(&self) -> Duration {
        Duration::from_secs(
            self.timeouts
                .as_ref()
                .and_then(|t| t.nodeslist_wait_secs)
                .unwrap_or(DEFAULT_NODESLIST_WAIT_SECS),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeouts
                .as_ref()
                .and_then(|t| t.connect_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn safe_wait(&self) -> Duration {
        Duration::from_secs(
            self.timeouts
                .as_ref()
                .and_then(|t| t.safe_wait_secs)
                .unwrap_or(DEFAULT_SAFE_WAIT_SECS),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Path to JSON line event log (rotated). If unset, defaults to logs/node_events.jsonl
    pub json_path: Option<String>,
    /// Max size in bytes before rotation (default 5MB)
    pub json_max_bytes: Option<usize>,
    /// Number of rotated files to retain (default 3)
    pub json_rotate: Option<u32>,
    /// Disable console sink (default false)
    pub disable_console: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Internal neighbor capacity (default 10). Further ENTRY messages are
    /// rejected without a wire-level negative acknowledgment.
    pub internal_capacity: Option<usize>,
    /// Concurrent inbound control connections (default 10). Excess
    /// connections are accepted and immediately closed.
    pub inbound_capacity: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            internal_capacity: Some(DEFAULT_INTERNAL_CAPACITY),
            inbound_capacity: Some(DEFAULT_INBOUND_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    /// Seconds to wait for a NODESLIST reply (default 2)
    pub nodeslist_wait_secs: Option<u64>,
    /// Seconds to wait for an outbound join connection (default 5)
    pub connect_secs: Option<u64>,
    /// Seconds to wait for the optional SAFE handshake reply (default 2)
    pub safe_wait_secs: Option<u64>,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            nodeslist_wait_secs: Some(DEFAULT_NODESLIST_WAIT_SECS),
            connect_secs: Some(DEFAULT_CONNECT_TIMEOUT_SECS),
            safe_wait_secs: Some(DEFAULT_SAFE_WAIT_SECS),
        }
    }
}
