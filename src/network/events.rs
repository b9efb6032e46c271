use crate::events::{
    dispatcher,
    model::{LogEvent, LogLevel, NetworkEvent, RegistryEvent, TopologyEvent},
};

/// Emit a structured network event.
pub(crate) fn emit_network_event(
    component: &'static str,
    level: LogLevel,
    action: &str,
    addr: Option<String>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta(component, level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Network(NetworkEvent {
        meta,
        action: action.to_string(),
        addr,
        detail,
    }));
}

/// Emit a structured topology event (neighbor changes, founding, rejections).
pub(crate) fn emit_topology_event(
    level: LogLevel,
    action: &str,
    neighbor: Option<String>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta("topology", level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Topology(TopologyEvent {
        meta,
        action: action.to_string(),
        neighbor,
        detail,
    }));
}

/// Emit a structured registry event (rendezvous server traffic).
pub(crate) fn emit_registry_event(
    level: LogLevel,
    action: &str,
    server: Option<String>,
    detail: Option<String>,
) {
    let mut meta = dispatcher::meta("registry", level);
    meta.corr_id = Some(dispatcher::correlation_id());
    dispatcher::emit(LogEvent::Registry(RegistryEvent {
        meta,
        action: action.to_string(),
        server,
        detail,
    }));
}
