//! Framing: splitting a byte stream into records.
//!
//! The stream has no length prefix. A record ends at `\n`; anything after the
//! last terminator is an incomplete record and stays buffered until more
//! bytes arrive. Because only complete lines are decoded, a multi-byte UTF-8
//! character split across two reads is never corrupted.

use bytes::{Buf, BytesMut};

use crate::{OutboundCommand, RECORD_TERMINATOR, Record};

/// Longest unterminated line the [`PendingBuffer`] keeps before discarding it.
///
/// A peer that never sends a terminator would otherwise grow the buffer
/// without bound.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Encode one command into a freshly allocated record.
pub fn encode(command: &OutboundCommand) -> Vec<u8> {
    let mut buf = Vec::new();
    command.encode(&mut buf);
    buf
}

/// Decode every complete record in `buffer`.
///
/// Returns the records in wire order and the unterminated tail, which is not
/// yet a record. Malformed lines and unknown command tags are dropped.
pub fn decode(buffer: &[u8]) -> (Vec<Record>, &[u8]) {
    let mut records = Vec::new();
    let mut rest = buffer;

    while let Some(pos) = find_terminator(rest) {
        let (line, tail) = rest.split_at(pos);
        rest = &tail[1..];

        if let Some(record) = decode_line(line) {
            records.push(record);
        }
    }

    (records, rest)
}

/// Bytes received from the transport that do not yet form a record.
///
/// Owned by a single reader. Feeding the stream in any fragmentation yields
/// the same records as feeding it whole.
#[derive(Debug)]
pub struct PendingBuffer {
    buf: BytesMut,
    /// Prefix of `buf` already known to contain no terminator.
    scanned: usize,
    /// Longest tail kept before it is discarded.
    max_line: usize,
    /// Currently dropping an oversized line up to its terminator.
    discarding: bool,
}

impl Default for PendingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingBuffer {
    /// Empty buffer with the default [`MAX_LINE_LENGTH`].
    pub fn new() -> Self {
        Self::with_max_line(MAX_LINE_LENGTH)
    }

    /// Empty buffer that discards unterminated tails longer than `max_line`.
    pub fn with_max_line(max_line: usize) -> Self {
        Self { buf: BytesMut::new(), scanned: 0, max_line, discarding: false }
    }

    /// Append bytes read from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Remove and decode every complete record, in arrival order.
    pub fn drain_records(&mut self) -> Vec<Record> {
        let mut records = Vec::new();

        while let Some(offset) = find_terminator(&self.buf[self.scanned..]) {
            let end = self.scanned + offset;
            let line = self.buf.split_to(end);
            self.buf.advance(1);
            self.scanned = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }

            if let Some(record) = decode_line(&line) {
                records.push(record);
            }
        }

        self.scanned = self.buf.len();

        if self.buf.len() > self.max_line {
            tracing::warn!(
                buffered = self.buf.len(),
                max_line = self.max_line,
                "discarding unterminated oversized record"
            );
            self.buf.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        records
    }

    /// Decode the unterminated tail as the last record of a closed stream.
    ///
    /// Returns `None` if nothing is buffered, the tail is malformed, or it is
    /// the rest of a line already discarded as oversized. The buffer is empty
    /// afterwards.
    pub fn finish(&mut self) -> Option<Record> {
        let tail = self.buf.split();
        self.scanned = 0;

        if std::mem::take(&mut self.discarding) || tail.is_empty() {
            return None;
        }
        decode_line(&tail)
    }

    /// Unterminated tail currently buffered.
    pub fn leftover(&self) -> &[u8] {
        &self.buf
    }

    /// Whether no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == RECORD_TERMINATOR)
}

fn decode_line(line: &[u8]) -> Option<Record> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = String::from_utf8_lossy(line);

    match Record::parse_line(&text) {
        Ok(record) => Some(record),
        Err(error) => {
            tracing::trace!(%error, "dropping malformed record");
            None
        },
    }
}
