//! Streaming incremental parser: turns an arbitrarily-chunked byte stream
//! into a sequence of [`Frame`]s without ever blocking or losing byte
//! boundaries between reads.
//!
//! Uses a check-then-parse discipline
//! (`frame::Error::Incomplete` signals "not enough bytes yet", and a
//! successful parse discards exactly the bytes it consumed), but owns its
//! buffer directly so the compaction/growth invariants below are
//! unit-testable without a socket.

use crate::frame::Frame;
use std::io::Cursor;
use thiserror::Error;

/// Initial buffer capacity. A recommended default, not a hard limit.
const INITIAL_CAPACITY: usize = 64 * 1024;

/// Threshold, in bytes already consumed, past which the buffer is
/// compacted (shifted to offset 0) before being grown.
const COMPACT_FRACTION: usize = 2;

const CRLF: &[u8] = b"\r\n";

/// A wire-format error: an unknown tag, a malformed numeric field, an
/// impossible length, or a missing CRLF after a bulk body. Carries the
/// byte offset (relative to the start of the pending slice at the time
/// parsing began) that triggered it. Fatal to the stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown frame tag {tag:?} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("malformed integer at offset {offset}")]
    MalformedInteger { offset: usize },

    #[error("invalid utf-8 in simple string or error line at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid bulk length {len} at offset {offset}")]
    InvalidBulkLength { len: i64, offset: usize },

    #[error("invalid array length {len} at offset {offset}")]
    InvalidArrayLength { len: i64, offset: usize },

    #[error("expected CRLF after bulk body at offset {offset}")]
    MissingTrailingCrlf { offset: usize },

    #[error("line exceeds maximum length at offset {offset}")]
    LineTooLong { offset: usize },
}

impl ParseError {
    /// The byte offset (into the stream as of when the offending frame
    /// started) that triggered this error.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnknownTag { offset, .. }
            | ParseError::MalformedInteger { offset }
            | ParseError::InvalidUtf8 { offset }
            | ParseError::InvalidBulkLength { offset, .. }
            | ParseError::InvalidArrayLength { offset, .. }
            | ParseError::MissingTrailingCrlf { offset }
            | ParseError::LineTooLong { offset } => *offset,
        }
    }
}

/// "Need more bytes before a complete frame can be reported." Not an
/// error condition; returned internally during a parse attempt and
/// translated to `Ok(None)` by [`Parser::try_parse`].
struct Incomplete;

type StepResult<T> = Result<T, StepError>;

enum StepError {
    Incomplete,
    Parse(ParseError),
}

impl From<Incomplete> for StepError {
    fn from(_: Incomplete) -> Self {
        StepError::Incomplete
    }
}

impl From<ParseError> for StepError {
    fn from(e: ParseError) -> Self {
        StepError::Parse(e)
    }
}

/// Incremental parser state: a growable byte buffer, a write offset
/// (bytes produced by the network) and a read offset (bytes consumed by
/// successful frames). Invariant: `0 <= read <= write <= buf.len()`.
pub struct Parser {
    buf: Vec<u8>,
    read: usize,
    write: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            buf: vec![0u8; INITIAL_CAPACITY],
            read: 0,
            write: 0,
        }
    }

    /// Bytes not yet bound to a complete frame.
    fn pending(&self) -> &[u8] {
        &self.buf[self.read..self.write]
    }

    /// Appends freshly-read network bytes, growing or compacting the
    /// buffer as needed. O(1) amortised.
    pub fn append(&mut self, data: &[u8]) {
        let free_tail = self.buf.len() - self.write;
        if free_tail < data.len() {
            let used = self.write - self.read;
            if self.read * COMPACT_FRACTION > self.buf.len() {
                // Consumed prefix exceeds half the buffer: compact first.
                self.buf.copy_within(self.read..self.write, 0);
                self.write = used;
                self.read = 0;
            }
            let free_tail = self.buf.len() - self.write;
            if free_tail < data.len() {
                let used = self.write - self.read;
                let new_cap = std::cmp::max(
                    self.buf.len() * 2,
                    used + data.len() + INITIAL_CAPACITY,
                );
                let mut grown = vec![0u8; new_cap];
                grown[..used].copy_from_slice(&self.buf[self.read..self.write]);
                self.buf = grown;
                self.write = used;
                self.read = 0;
            }
        }
        let start = self.write;
        let end = start + data.len();
        self.buf[start..end].copy_from_slice(data);
        self.write = end;
    }

    /// Attempts to parse and remove the next complete frame from the
    /// pending slice. Returns `Ok(None)` when more bytes are needed; the
    /// read offset is left exactly where it was before the attempt
    /// ("atomic" per-frame consumption). Returns `Err` on a wire-format
    /// error, which halts the parser for this stream.
    pub fn try_parse(&mut self) -> Result<Option<Frame>, ParseError> {
        let start = self.read;
        let mut cursor = Cursor::new(&self.buf[start..self.write]);
        match parse_frame(&mut cursor) {
            Ok(frame) => {
                let consumed = cursor.position() as usize;
                self.read = start + consumed;
                Ok(Some(frame))
            }
            Err(StepError::Incomplete) => Ok(None),
            Err(StepError::Parse(e)) => Err(e),
        }
    }

    /// Discards all buffered state. Used when tearing down a connection:
    /// any partial frame in flight is dropped along with the stream.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Bytes currently buffered but not yet parsed into a frame.
    pub fn pending_len(&self) -> usize {
        self.write - self.read
    }
}

fn parse_frame(cur: &mut Cursor<&[u8]>) -> StepResult<Frame> {
    let offset = cur.position() as usize;
    let tag = read_u8(cur)?;
    match tag {
        b'+' => Ok(Frame::Simple(read_line_string(cur, offset)?)),
        b'-' => Ok(Frame::Error(read_line_string(cur, offset)?)),
        b':' => Ok(Frame::Integer(read_line_integer(cur, offset)?)),
        b'$' => parse_bulk(cur, offset),
        b'*' => parse_array(cur, offset),
        other => Err(ParseError::UnknownTag {
            tag: other,
            offset,
        }
        .into()),
    }
}

fn parse_bulk(cur: &mut Cursor<&[u8]>, offset: usize) -> StepResult<Frame> {
    let len = read_line_integer(cur, offset)?;
    if len == -1 {
        return Ok(Frame::Bulk(None));
    }
    if len < -1 {
        return Err(ParseError::InvalidBulkLength { len, offset }.into());
    }
    let len = len as usize;
    let body_start = cur.position() as usize;
    let remaining = cur.get_ref().len();
    if remaining < body_start + len + 2 {
        return Err(Incomplete.into());
    }
    let body = cur.get_ref()[body_start..body_start + len].to_vec();
    cur.set_position((body_start + len) as u64);
    if &cur.get_ref()[cur.position() as usize..cur.position() as usize + 2] != CRLF {
        return Err(ParseError::MissingTrailingCrlf {
            offset: cur.position() as usize,
        }
        .into());
    }
    cur.set_position(cur.position() + 2);
    Ok(Frame::Bulk(Some(body.into())))
}

fn parse_array(cur: &mut Cursor<&[u8]>, offset: usize) -> StepResult<Frame> {
    let len = read_line_integer(cur, offset)?;
    if len == -1 {
        return Ok(Frame::Array(None));
    }
    if len < -1 {
        return Err(ParseError::InvalidArrayLength { len, offset }.into());
    }
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(parse_frame(cur)?);
    }
    Ok(Frame::Array(Some(items)))
}

fn read_u8(cur: &mut Cursor<&[u8]>) -> StepResult<u8> {
    let pos = cur.position() as usize;
    let buf = cur.get_ref();
    if pos >= buf.len() {
        return Err(Incomplete.into());
    }
    let byte = buf[pos];
    cur.set_position((pos + 1) as u64);
    Ok(byte)
}

/// Locates the next `\r\n` in the pending slice starting at the cursor's
/// current position. Matches the separator as a two-byte pair, not by
/// scanning for `\r` alone, and never matches at or past the write
/// offset (i.e. never matches past the end of the slice given to us).
fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == CRLF)
        .map(|i| from + i)
}

fn read_line_bytes<'a>(cur: &mut Cursor<&'a [u8]>) -> StepResult<&'a [u8]> {
    let buf = *cur.get_ref();
    let start = cur.position() as usize;
    match find_crlf(buf, start) {
        Some(end) => {
            cur.set_position((end + 2) as u64);
            Ok(&buf[start..end])
        }
        None => Err(Incomplete.into()),
    }
}

fn read_line_string(cur: &mut Cursor<&[u8]>, offset: usize) -> StepResult<String> {
    let line = read_line_bytes(cur)?;
    String::from_utf8(line.to_vec()).map_err(|_| ParseError::InvalidUtf8 { offset }.into())
}

fn read_line_integer(cur: &mut Cursor<&[u8]>, offset: usize) -> StepResult<i64> {
    let line = read_line_bytes(cur)?;
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ParseError::MalformedInteger { offset }.into())
}
