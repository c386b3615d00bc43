// ABOUTME: Messages the public handle sends to the actor task over the internal mpsc channel.
// ABOUTME: A Write carries its own waiter(s) so enqueue-then-write stays one critical section inside the actor.

use crate::pending::Waiter;
use bytes::Bytes;
use tokio::sync::oneshot;

pub enum ActorCommand {
    /// One or more already-serialized commands, in wire order, with one
    /// waiter per command.
    Write { bytes: Bytes, waiters: Vec<Waiter> },
    /// Graceful teardown: reject pending waiters, send FIN, wait for the
    /// remote half-close.
    Disconnect { ack: oneshot::Sender<()> },
    /// Forced teardown: reject pending waiters and drop the transport
    /// immediately.
    Destroy { ack: oneshot::Sender<()> },
}
