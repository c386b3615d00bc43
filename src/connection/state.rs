// ABOUTME: The connection's observable lifecycle state and its allowed transitions.
// ABOUTME: Four states cover this protocol's whole lifecycle: no finer-grained bind/session states are needed.

/// Lifecycle state of a [`super::Connection`].
///
/// ```text
/// disconnected -> connecting -> connected -> disconnected
///                      \-----------> error -> connecting
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport. The initial state, and the state after a graceful or
    /// forced teardown.
    Disconnected,
    /// Transport handshake (and, if configured, AUTH/SELECT) in progress.
    Connecting,
    /// Transport up, bootstrap complete, `send`/`pipeline`/`execute` usable.
    Connected,
    /// Terminal until a fresh `connect()` call resets it to `Connecting`.
    Error,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}
