//! The tagged value representing one parsed protocol frame, and the
//! conversion from a frame into an idiomatic reply value.

use bytes::Bytes;
use std::fmt;

/// One complete RESP protocol value.
///
/// Exactly one of the five legacy frame kinds. `Bulk(None)` and
/// `Array(None)` are the distinguished null bulk-string / null array
/// values; there is no separate "nil" variant at this layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// `+line\r\n`
    Simple(String),
    /// `-line\r\n`, conventionally an uppercase error code token followed
    /// by a message.
    Error(String),
    /// `:<i64>\r\n`
    Integer(i64),
    /// `$len\r\nbody\r\n`, or the null bulk string when `None`.
    Bulk(Option<Bytes>),
    /// `*len\r\n` followed by `len` frames, or the null array when `None`.
    Array(Option<Vec<Frame>>),
}

impl Frame {
    pub fn simple(s: impl Into<String>) -> Frame {
        Frame::Simple(s.into())
    }

    pub fn error(s: impl Into<String>) -> Frame {
        Frame::Error(s.into())
    }

    pub fn integer(n: i64) -> Frame {
        Frame::Integer(n)
    }

    pub fn bulk(data: impl Into<Bytes>) -> Frame {
        Frame::Bulk(Some(data.into()))
    }

    pub fn null_bulk() -> Frame {
        Frame::Bulk(None)
    }

    pub fn array(items: Vec<Frame>) -> Frame {
        Frame::Array(Some(items))
    }

    pub fn null_array() -> Frame {
        Frame::Array(None)
    }

    /// Converts this frame into the idiomatic reply value a caller sees.
    ///
    /// This is the single place a protocol error frame becomes an
    /// application-visible failure rather than a plain value.
    pub fn into_reply(self) -> Result<Reply, ReplyError> {
        match self {
            Frame::Simple(s) => Ok(Reply::Simple(s)),
            Frame::Error(msg) => Err(ReplyError(msg)),
            Frame::Integer(n) => Ok(Reply::Int(n)),
            Frame::Bulk(Some(b)) => Ok(Reply::Bulk(b)),
            Frame::Bulk(None) => Ok(Reply::Nil),
            Frame::Array(Some(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.into_reply()?);
                }
                Ok(Reply::Array(out))
            }
            Frame::Array(None) => Ok(Reply::Nil),
        }
    }
}

/// The idiomatic value a caller gets back from a successful command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Int(i64),
    Bulk(Bytes),
    Simple(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            Reply::Simple(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Borrowed string view, if this reply is textual and valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Simple(s) => Some(s.as_str()),
            Reply::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// The failure raised when a server reply is an error-tagged frame.
///
/// Carries the error-frame payload verbatim: a server-reported error is
/// delivered to the caller as a command failure whose message is the
/// error-frame payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyError(pub String);

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ReplyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_bulk_become_strings() {
        assert_eq!(
            Frame::simple("OK").into_reply().unwrap(),
            Reply::Simple("OK".to_string())
        );
        assert_eq!(
            Frame::bulk(&b"hello"[..]).into_reply().unwrap(),
            Reply::Bulk(Bytes::from_static(b"hello"))
        );
    }

    #[test]
    fn null_bulk_and_null_array_become_nil() {
        assert_eq!(Frame::null_bulk().into_reply().unwrap(), Reply::Nil);
        assert_eq!(Frame::null_array().into_reply().unwrap(), Reply::Nil);
    }

    #[test]
    fn integer_is_preserved() {
        assert_eq!(Frame::integer(-1).into_reply().unwrap(), Reply::Int(-1));
    }

    #[test]
    fn error_frame_is_raised_as_failure() {
        let err = Frame::error("ERR no such key").into_reply().unwrap_err();
        assert_eq!(err.0, "ERR no such key");
    }

    #[test]
    fn nested_array_recurses() {
        let frame = Frame::array(vec![
            Frame::array(vec![Frame::bulk(&b"a"[..]), Frame::bulk(&b"b"[..])]),
            Frame::array(vec![Frame::bulk(&b"c"[..])]),
        ]);
        let reply = frame.into_reply().unwrap();
        let outer = reply.into_array().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(
            outer[0].clone().into_array().unwrap()[0].as_str(),
            Some("a")
        );
    }

    #[test]
    fn error_inside_array_propagates() {
        let frame = Frame::array(vec![Frame::integer(1), Frame::error("ERR bad")]);
        assert!(frame.into_reply().is_err());
    }
}
