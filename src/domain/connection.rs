use serde::Serialize;

/// Connection state as observed by the listener.
///
/// The transport owns the real socket; this mirror only exists so updates are
/// handled strictly inside a connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Counters kept by the listener across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListenerStats {
    pub connects: u64,
    pub disconnects: u64,
    pub updates: u64,
    pub reloads: u64,
    pub failed_reloads: u64,
    pub ignored_events: u64,
}
