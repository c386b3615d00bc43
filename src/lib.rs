//! An async client for a text-line / length-prefixed request-response
//! wire protocol used by in-memory key-value servers: a streaming
//! incremental parser, a pure serializer, and a connection state machine
//! that multiplexes many in-flight commands over one duplex stream.
//!
//! ```rust,no_run
//! use respio::{Connection, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = Connection::connect(ConnectionConfig::new("127.0.0.1", 6379)).await?;
//!
//!     let result = conn.execute(vec!["SET".into(), "key".into(), "value".into()]).await;
//!     assert!(result.success);
//!
//!     conn.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod frame;
pub mod parser;
pub mod pending;
pub mod quoting;
pub mod serialize;

pub use config::{ConnectionConfig, TlsConfig};
pub use connection::{Connection, ConnectionState, ExecuteResult};
pub use error::{ClientError, ClientResult};
pub use events::Event;
pub use frame::{Frame, Reply, ReplyError};
pub use parser::{ParseError, Parser};
pub use serialize::{encode_command, encode_pipeline, Arg};

/// Error returned by call sites that don't need to match on [`ClientError`]
/// specifically — a caller's own `main`, an example, or glue code that just
/// wants `?` to work across this crate and others.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A boxed-error `Result` alias for the same callers.
pub type Result<T> = std::result::Result<T, Error>;
