// ABOUTME: The task that owns the socket, the parser and the pending queue for one connection.
// ABOUTME: The single task reads the socket and drains an internal command channel in the same select loop.

use super::command::ActorCommand;
use super::state::ConnectionState;
use super::transport::BoxedStream;
use crate::events::Event;
use crate::parser::Parser;
use crate::pending::PendingQueue;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Owns everything mutable about a live connection. Reached only from its
/// own task; the public [`super::Connection`] handle talks to it over
/// `commands`.
pub struct Actor {
    stream: BoxedStream,
    parser: Parser,
    pending: PendingQueue,
    commands: mpsc::Receiver<ActorCommand>,
    state_tx: watch::Sender<ConnectionState>,
    events_tx: broadcast::Sender<Event>,
}

impl Actor {
    pub fn new(
        stream: BoxedStream,
        commands: mpsc::Receiver<ActorCommand>,
        state_tx: watch::Sender<ConnectionState>,
        events_tx: broadcast::Sender<Event>,
    ) -> Actor {
        Actor {
            stream,
            parser: Parser::new(),
            pending: PendingQueue::new(),
            commands,
            state_tx,
            events_tx,
        }
    }

    /// Drives the receive loop and the command channel until the
    /// connection tears down, one way or another.
    pub async fn run(mut self) {
        let mut read_buf = [0u8; READ_CHUNK];

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(ActorCommand::Write { bytes, waiters }) => {
                            for waiter in waiters {
                                self.pending.push(waiter);
                            }
                            if let Err(e) = self.stream.write_all(&bytes).await {
                                warn!(error = %e, "write failed, tearing down connection");
                                self.teardown(ConnectionState::Error, format!("transport error: {e}"), true);
                                return;
                            }
                        }
                        Some(ActorCommand::Disconnect { ack }) => {
                            self.pending.fail_all("client disconnecting");
                            let _ = self.stream.shutdown().await;
                            // Drain until the peer observes our FIN and closes its side.
                            while let Ok(n) = self.stream.read(&mut read_buf).await {
                                if n == 0 {
                                    break;
                                }
                            }
                            self.set_state(ConnectionState::Disconnected);
                            let _ = self.events_tx.send(Event::Close { had_error: false });
                            let _ = ack.send(());
                            return;
                        }
                        Some(ActorCommand::Destroy { ack }) => {
                            self.pending.fail_all("client destroyed");
                            self.set_state(ConnectionState::Disconnected);
                            let _ = self.events_tx.send(Event::Close { had_error: false });
                            let _ = ack.send(());
                            return;
                        }
                        None => {
                            // Every handle (and the liveness task) dropped its sender.
                            self.pending.fail_all("client destroyed");
                            self.set_state(ConnectionState::Disconnected);
                            return;
                        }
                    }
                }
                read = self.stream.read(&mut read_buf) => {
                    match read {
                        Ok(0) => {
                            debug!("peer closed connection");
                            self.teardown(ConnectionState::Disconnected, "connection closed by peer".into(), true);
                            return;
                        }
                        Ok(n) => {
                            self.parser.append(&read_buf[..n]);
                            if let Err(stop) = self.drain_frames() {
                                let _ = stop;
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "read failed, tearing down connection");
                            self.teardown(ConnectionState::Error, format!("transport error: {e}"), true);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Parses every complete frame currently buffered, matching each to
    /// the pending queue or surfacing it as an unsolicited event (spec
    /// the pending queue or surfacing it as an unsolicited event. Returns
    /// `Err(())` once a wire-format error
    /// has torn the connection down, signalling the caller to stop.
    fn drain_frames(&mut self) -> Result<(), ()> {
        loop {
            match self.parser.try_parse() {
                Ok(Some(frame)) => {
                    if self.pending.deliver_next(frame.clone()).is_none() {
                        let _ = self.events_tx.send(Event::Message(frame));
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "protocol error, tearing down connection");
                    self.parser.reset();
                    self.teardown(ConnectionState::Error, format!("protocol error: {e}"), true);
                    return Err(());
                }
            }
        }
    }

    fn teardown(&mut self, state: ConnectionState, message: String, had_error: bool) {
        self.pending.fail_all(message.clone());
        self.set_state(state);
        if had_error {
            let _ = self.events_tx.send(Event::Error(message));
        }
        let _ = self.events_tx.send(Event::Close { had_error });
    }

    fn set_state(&mut self, state: ConnectionState) {
        let _ = self.state_tx.send(state);
        let _ = self.events_tx.send(Event::Status(state));
    }
}
