// ABOUTME: Event channel surfacing connection status changes and unsolicited frames to the owning application.
// ABOUTME: Backed by a broadcast channel so multiple subscribers can observe the same stream.

use crate::connection::ConnectionState;
use crate::frame::Frame;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel. A slow subscriber that falls this
/// far behind starts missing events (`broadcast::error::RecvError::Lagged`);
/// that's a deliberate trade-off for an unsolicited-frame stream, which is
/// explicitly best-effort: pub/sub flow control is out of scope here.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something the connection wants the owning application to know about,
/// outside the request/response flow.
#[derive(Clone, Debug)]
pub enum Event {
    /// The connection transitioned to a new state.
    Status(ConnectionState),
    /// The transport closed. `true` if it closed because of an error.
    Close { had_error: bool },
    /// A transport- or protocol-level error occurred outside any single
    /// command's lifecycle.
    Error(String),
    /// A frame arrived with no waiter at the head of the pending queue
    /// — the hook by which subscription-style
    /// deliveries reach a consumer.
    Message(Frame),
}

pub fn channel() -> (broadcast::Sender<Event>, broadcast::Receiver<Event>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
