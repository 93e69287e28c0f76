use std::fmt;

/// Lifecycle of the realtime session.
///
/// `Idle → Handshaking → Open → Ready`, then `Closed` when the transport
/// drops, and back to `Handshaking` on reconnect or `Idle` on teardown.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    /// Bootstrap HTTP call or WebSocket upgrade in progress.
    Handshaking,
    /// Socket open; bootstrap reconciliation not finished yet.
    Open,
    Ready,
    Closed,
}

impl ConnectionState {
    /// True while a transport handle exists.
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Open | ConnectionState::Ready)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Handshaking => "handshaking",
            ConnectionState::Open => "open",
            ConnectionState::Ready => "ready",
            ConnectionState::Closed => "closed",
        };
        f.write_str(label)
    }
}
