// ABOUTME: Connection-level error taxonomy: wire-format, server-reported, timeout, transport, usage.
// ABOUTME: Splits wire-format errors (parse) from protocol/usage errors, the way connection-level error enums usually do.

use crate::frame::ReplyError;
use crate::parser::ParseError;
use thiserror::Error;

/// Errors surfaced by [`crate::connection::Connection`] and its commands.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A wire-format error from the parser. Fatal to the stream; the
    /// connection tears itself down after surfacing this.
    #[error("wire protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// The server replied with an error-tagged frame.
    #[error("server error: {0}")]
    Server(#[from] ReplyError),

    /// The command's deadline elapsed before a reply arrived.
    #[error("command timed out")]
    Timeout,

    /// The transport closed, errored, or went idle.
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// The connection closed (gracefully or forcibly) while this command
    /// was pending.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// `send`/`pipeline` called while not in the `Connected` state.
    #[error("usage error: {0}")]
    Usage(String),

    /// Authentication (`AUTH`) failed during `connect`.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// `SELECT` failed during `connect`.
    #[error("database selection failed: {0}")]
    SelectFailed(String),

    /// TLS handshake failed during `connect`.
    #[error("TLS handshake failed: {0}")]
    Tls(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
