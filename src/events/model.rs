use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    pub ts: SystemTime,
    pub level: LogLevel,
    pub corr_id: Option<String>,
    pub session_id: String,
    pub component: &'static str,
    pub suppress_console: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkEvent {
    pub meta: EventMeta,
    pub action: String,
    pub addr: Option<String>,
    pub detail: Option<String>,
}

/// Topology mutations: neighbor added/rejected, safeguard updated, network founded.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyEvent {
    pub meta: EventMeta,
    pub action: String,
    pub neighbor: Option<String>,
    pub detail: Option<String>,
}

/// Traffic with the rendezvous (registration) server.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEvent {
    pub meta: EventMeta,
    pub action: String,
    pub server: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemEvent {
    pub meta: EventMeta,
    pub action: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    Network(NetworkEvent),
    Topology(TopologyEvent),
    Registry(RegistryEvent),
    System(SystemEvent),
}
