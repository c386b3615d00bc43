// ABOUTME: The public handle applications hold: connect/send/pipeline/execute/disconnect/destroy.
// ABOUTME: One handle covers connect/send/pipeline/execute/disconnect/destroy since this protocol has a single command family.

use super::actor::Actor;
use super::command::ActorCommand;
use super::state::ConnectionState;
use super::transport;
use crate::config::ConnectionConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{self, Event};
use crate::frame::{Frame, Reply};
use crate::pending::{Waiter, WaiterOutcome};
use crate::serialize::{self, Arg};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

/// Capacity of the internal command channel between a [`Connection`] handle
/// (and its clones, and the liveness task) and the actor task.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// The outcome of [`Connection::execute`]: the convenience shape the
/// per-command shortcut wrappers (GET/SET/...) are built over.
#[derive(Clone, Debug)]
pub struct ExecuteResult {
    pub success: bool,
    pub data: Option<Reply>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// A live (or not-yet-connected) client connection.
///
/// Cloning shares the same underlying actor task: every clone can submit
/// commands, and they interleave on the wire in the order the actor's
/// command channel delivers them.
#[derive(Clone)]
pub struct Connection {
    config: ConnectionConfig,
    commands: mpsc::Sender<ActorCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    events_tx: broadcast::Sender<Event>,
}

impl Connection {
    /// Opens the transport, performs optional AUTH/SELECT, and spawns the
    /// actor task. Transport failure, handshake failure, AUTH/SELECT
    /// failure, and connect-timeout all tear the transport down and
    /// return `Err`, transitioning to `Error` rather than `Connected`.
    pub async fn connect(config: ConnectionConfig) -> ClientResult<Connection> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (events_tx, _events_rx) = events::channel();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let _ = events_tx.send(Event::Status(ConnectionState::Connecting));

        let stream = match tokio::time::timeout(config.connect_timeout, transport::dial(&config)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let _ = state_tx.send(ConnectionState::Error);
                let _ = events_tx.send(Event::Error(e.to_string()));
                let _ = events_tx.send(Event::Status(ConnectionState::Error));
                return Err(e);
            }
            Err(_) => {
                let _ = state_tx.send(ConnectionState::Error);
                let _ = events_tx.send(Event::Error("connect timed out".into()));
                let _ = events_tx.send(Event::Status(ConnectionState::Error));
                return Err(ClientError::Timeout);
            }
        };

        let actor = Actor::new(stream, commands_rx, state_tx.clone(), events_tx.clone());
        tokio::spawn(actor.run());

        let connection = Connection {
            config: config.clone(),
            commands: commands_tx.clone(),
            state_rx,
            events_tx: events_tx.clone(),
        };

        // AUTH/SELECT during bootstrap go through this private path rather
        // than the public `send`, which refuses to run outside `Connected`
        // while the state is still Connecting.
        if let Err(e) = connection.bootstrap(&config).await {
            let _ = state_tx.send(ConnectionState::Error);
            let _ = events_tx.send(Event::Status(ConnectionState::Error));
            return Err(e);
        }

        let _ = state_tx.send(ConnectionState::Connected);
        let _ = events_tx.send(Event::Status(ConnectionState::Connected));
        info!(addr = %config.addr(), "connected");

        if let Some(interval) = config.liveness_interval {
            spawn_liveness(commands_tx, interval, config.command_timeout);
        }

        Ok(connection)
    }

    async fn bootstrap(&self, config: &ConnectionConfig) -> ClientResult<()> {
        if let Some(password) = &config.password {
            let reply = self
                .privileged_send(vec![Arg::from("AUTH"), Arg::from(password.clone())], config.connect_timeout)
                .await
                .map_err(|e| ClientError::AuthFailed(e.to_string()))?;
            if let Frame::Error(msg) = reply {
                return Err(ClientError::AuthFailed(msg));
            }
        }
        if let Some(db) = config.db {
            let reply = self
                .privileged_send(vec![Arg::from("SELECT"), Arg::from(db)], config.connect_timeout)
                .await
                .map_err(|e| ClientError::SelectFailed(e.to_string()))?;
            if let Frame::Error(msg) = reply {
                return Err(ClientError::SelectFailed(msg));
            }
        }
        Ok(())
    }

    /// Bootstrap-only command submission: bypasses the `Connected` state
    /// check that gates `send`.
    async fn privileged_send(&self, args: Vec<Arg>, timeout: Duration) -> ClientResult<Frame> {
        submit(&self.commands, args, timeout).await
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events_tx.subscribe()
    }

    /// Sends one command, usable only in the `Connected` state.
    pub async fn send(&self, args: Vec<Arg>) -> ClientResult<Frame> {
        self.send_with_timeout(args, self.config.command_timeout).await
    }

    /// Sends one command with an explicit deadline instead of the
    /// connection's configured `command_timeout`.
    pub async fn send_with_timeout(&self, args: Vec<Arg>, timeout: Duration) -> ClientResult<Frame> {
        self.require_connected()?;
        submit(&self.commands, args, timeout).await
    }

    /// Sends every command in one write, returning one result per command
    /// in submission order; one failure does not abort the others (spec
    /// one command at a time.
    pub async fn pipeline(&self, cmds: Vec<Vec<Arg>>) -> ClientResult<Vec<ClientResult<Frame>>> {
        self.require_connected()?;
        if cmds.is_empty() {
            return Ok(Vec::new());
        }

        let bytes = serialize::encode_pipeline(&cmds);
        let mut waiters = Vec::with_capacity(cmds.len());
        let mut receivers = Vec::with_capacity(cmds.len());
        for _ in &cmds {
            let (waiter, rx) = Waiter::channel();
            waiters.push(waiter);
            receivers.push(rx);
        }

        self.commands
            .send(ActorCommand::Write { bytes, waiters })
            .await
            .map_err(|_| ClientError::ConnectionClosed("actor task is gone".into()))?;

        let mut results = Vec::with_capacity(receivers.len());
        for rx in receivers {
            results.push(await_reply(rx, self.config.command_timeout).await);
        }
        Ok(results)
    }

    /// Convenience wrapper over [`Connection::send`], converting the
    /// outcome into the result record the command shortcuts build on
    /// execute.
    pub async fn execute(&self, args: Vec<Arg>) -> ExecuteResult {
        let start = Instant::now();
        let outcome = self.send(args).await.and_then(|frame| {
            frame.into_reply().map_err(ClientError::Server)
        });
        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(reply) => ExecuteResult {
                success: true,
                data: Some(reply),
                error: None,
                duration_ms,
            },
            Err(e) => ExecuteResult {
                success: false,
                data: None,
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }

    /// Graceful teardown: rejects pending waiters, sends FIN, resolves
    /// once the remote half-close is observed.
    pub async fn disconnect(&self) -> ClientResult<()> {
        let (ack_tx, ack_rx) = tokio::sync::oneshot::channel();
        if self.commands.send(ActorCommand::Disconnect { ack: ack_tx }).await.is_err() {
            return Ok(()); // already gone
        }
        let _ = ack_rx.await;
        Ok(())
    }

    /// Forced teardown: rejects pending waiters and drops the transport
    /// immediately.
    pub async fn destroy(&self) -> ClientResult<()> {
        let (ack_tx, ack_rx) = tokio::sync::oneshot::channel();
        if self.commands.send(ActorCommand::Destroy { ack: ack_tx }).await.is_err() {
            return Ok(());
        }
        let _ = ack_rx.await;
        Ok(())
    }

    fn require_connected(&self) -> ClientResult<()> {
        if self.state().is_connected() {
            Ok(())
        } else {
            Err(ClientError::Usage(format!(
                "command issued while not connected (state: {:?})",
                self.state()
            )))
        }
    }
}

async fn submit(commands: &mpsc::Sender<ActorCommand>, args: Vec<Arg>, timeout: Duration) -> ClientResult<Frame> {
    let bytes = serialize::encode_command(&args);
    let (waiter, rx) = Waiter::channel();
    commands
        .send(ActorCommand::Write { bytes, waiters: vec![waiter] })
        .await
        .map_err(|_| ClientError::ConnectionClosed("actor task is gone".into()))?;
    await_reply(rx, timeout).await
}

async fn await_reply(rx: tokio::sync::oneshot::Receiver<WaiterOutcome>, timeout: Duration) -> ClientResult<Frame> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(frame))) => Ok(frame),
        Ok(Ok(Err(message))) => Err(ClientError::ConnectionClosed(message)),
        Ok(Err(_)) => Err(ClientError::ConnectionClosed("connection torn down while waiting for reply".into())),
        Err(_) => Err(ClientError::Timeout),
    }
}

/// Periodic liveness `PING`, run as its own task over a clone of the
/// command channel so it can never block the actor's own receive loop
/// waiting on its own reply.
fn spawn_liveness(commands: mpsc::Sender<ActorCommand>, interval: Duration, timeout: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            match submit(&commands, vec![Arg::from("PING")], timeout).await {
                Ok(Frame::Error(msg)) => {
                    warn!(error = %msg, "liveness ping rejected by server, destroying connection");
                    destroy_quietly(&commands).await;
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "liveness ping failed, destroying connection");
                    destroy_quietly(&commands).await;
                    return;
                }
            }
        }
    });
}

async fn destroy_quietly(commands: &mpsc::Sender<ActorCommand>) {
    let (ack_tx, ack_rx) = tokio::sync::oneshot::channel();
    if commands.send(ActorCommand::Destroy { ack: ack_tx }).await.is_ok() {
        let _ = ack_rx.await;
    }
}
