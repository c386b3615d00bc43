// ABOUTME: Connection module: the public handle, its lifecycle state, the actor task, and the transport it drives.
// ABOUTME: Exports the handle and its supporting types at the top level.

//! Connection state machine.
//!
//! `connect()` spawns one task (the [`actor::Actor`]) that owns the
//! socket, the incremental parser, and the pending-reply queue. Every
//! other operation on [`Connection`] is a message sent to that task over
//! an internal channel; the actor is the single owner the concurrency
//! model requires, so no mutex guards connection state directly.
//!
//! ```rust,no_run
//! use respio::{ConnectionConfig, Connection};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = Connection::connect(ConnectionConfig::new("127.0.0.1", 6379)).await?;
//! let reply = conn.send(vec!["PING".into()]).await?;
//! assert_eq!(reply, respio::Frame::simple("PONG"));
//! conn.disconnect().await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod command;
mod handle;
mod state;
mod transport;

pub use handle::{Connection, ExecuteResult};
pub use state::ConnectionState;
