//! Renders a command (an ordered, non-empty sequence of arguments) into
//! the wire encoding: one RESP array of bulk strings.

use bytes::{BufMut, Bytes, BytesMut};

/// One command argument. Each shape renders to a single bulk string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    Bytes(Bytes),
    Str(String),
    Int(i64),
}

impl From<&str> for Arg {
    fn from(s: &str) -> Arg {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Arg {
        Arg::Str(s)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Arg {
        Arg::Int(n)
    }
}

impl From<Bytes> for Arg {
    fn from(b: Bytes) -> Arg {
        Arg::Bytes(b)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Arg {
        Arg::Bytes(Bytes::from(b))
    }
}

impl Arg {
    fn as_bytes(&self) -> Bytes {
        match self {
            Arg::Bytes(b) => b.clone(),
            Arg::Str(s) => Bytes::copy_from_slice(s.as_bytes()),
            Arg::Int(n) => Bytes::from(n.to_string().into_bytes()),
        }
    }
}

/// Encodes a single command as `*N\r\n($L\r\n<bytes>\r\n)*N`.
///
/// Pure and allocation-visible: callers control where the resulting
/// buffer lives, and encoding never fails for a non-empty argument list.
///
/// # Panics
///
/// Panics if `args` is empty; the wire protocol has no representation
/// for a zero-argument command.
pub fn encode_command(args: &[Arg]) -> Bytes {
    assert!(!args.is_empty(), "a command must have at least one argument");

    let mut buf = BytesMut::new();
    buf.put_u8(b'*');
    buf.extend_from_slice(args.len().to_string().as_bytes());
    buf.extend_from_slice(b"\r\n");
    for arg in args {
        let bytes = arg.as_bytes();
        buf.put_u8(b'$');
        buf.extend_from_slice(bytes.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&bytes);
        buf.extend_from_slice(b"\r\n");
    }
    buf.freeze()
}

/// Encodes and concatenates several commands into one contiguous buffer:
/// the pipelining case, where the caller wants a single write.
pub fn encode_pipeline(commands: &[Vec<Arg>]) -> Bytes {
    let mut buf = BytesMut::new();
    for cmd in commands {
        buf.extend_from_slice(&encode_command(cmd));
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<Arg> {
        strs.iter().map(|s| Arg::from(*s)).collect()
    }

    #[test]
    fn ping_round_trip_law() {
        let encoded = encode_command(&args(&["PING"]));
        assert_eq!(encoded.as_ref(), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn set_key_value_round_trip_law() {
        let encoded = encode_command(&args(&["SET", "key", "value"]));
        assert_eq!(
            encoded.as_ref(),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"
        );
    }

    #[test]
    fn empty_string_argument_is_a_zero_length_bulk() {
        let encoded = encode_command(&args(&["SET", "key", ""]));
        assert_eq!(
            encoded.as_ref(),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$0\r\n\r\n"
        );
    }

    #[test]
    fn integer_argument_renders_as_shortest_decimal() {
        let encoded = encode_command(&[Arg::from("INCRBY"), Arg::from("k"), Arg::from(-42i64)]);
        assert_eq!(
            encoded.as_ref(),
            b"*3\r\n$6\r\nINCRBY\r\n$1\r\nk\r\n$3\r\n-42\r\n"
        );
    }

    #[test]
    fn pipelining_concatenates_buffers() {
        let one = encode_command(&args(&["SET", "a", "1"]));
        let two = encode_command(&args(&["SET", "b", "2"]));
        let mut expected = BytesMut::new();
        expected.extend_from_slice(&one);
        expected.extend_from_slice(&two);

        let piped = encode_pipeline(&[
            vec![Arg::from("SET"), Arg::from("a"), Arg::from("1")],
            vec![Arg::from("SET"), Arg::from("b"), Arg::from("2")],
        ]);
        assert_eq!(piped, expected.freeze());
    }

    #[test]
    #[should_panic]
    fn empty_command_panics() {
        encode_command(&[]);
    }
}
