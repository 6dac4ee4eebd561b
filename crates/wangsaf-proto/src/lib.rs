//! Wangsaf wire protocol.
//!
//! Records are UTF-8 text lines of the form `COMMAND|field1|field2|...`
//! terminated by `\n` (a preceding `\r` is tolerated). There is no escaping:
//! a field value containing `|` or a line terminator desynchronizes the peer's
//! parser, so callers must keep such values off the wire.
//!
//! # Components
//!
//! - [`OutboundCommand`]: commands the client writes (`LOGIN`, `MESSAGE`,
//!   `PRIVATE`, `LOGOUT`)
//! - [`Record`]: decoded inbound protocol units
//! - [`encode`] / [`decode`]: one-shot codec functions
//! - [`PendingBuffer`]: incremental decoder for a continuous byte stream
//!
//! Malformed lines (fewer than two fields, unknown command tags) are dropped
//! by the decoder and never surfaced. [`ProtocolError`] only exists to name
//! the cause in logs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod command;
mod errors;
mod record;

pub use codec::{MAX_LINE_LENGTH, PendingBuffer, decode, encode};
pub use command::OutboundCommand;
pub use errors::{ProtocolError, Result};
pub use record::Record;

/// Separator between fields of a record.
pub const FIELD_SEPARATOR: u8 = b'|';

/// Terminator ending every record.
pub const RECORD_TERMINATOR: u8 = b'\n';

/// Separator between usernames inside a `USERLIST` record.
pub const USER_SEPARATOR: char = ',';

/// Wire tags for every command the protocol knows.
pub mod tag {
    /// Login handshake (`LOGIN|username`).
    pub const LOGIN: &str = "LOGIN";
    /// Public chat message (`MESSAGE|text` out, `MESSAGE|sender|text` in).
    pub const MESSAGE: &str = "MESSAGE";
    /// Private message (`PRIVATE|target|text` out,
    /// `PRIVATE|sender|target|text` in).
    pub const PRIVATE: &str = "PRIVATE";
    /// Online users (`USERLIST|a,b,c`).
    pub const USERLIST: &str = "USERLIST";
    /// Server notice (`SYSTEM|text`).
    pub const SYSTEM: &str = "SYSTEM";
    /// Server error (`ERROR|text`).
    pub const ERROR: &str = "ERROR";
    /// Logout announcement (`LOGOUT|`).
    pub const LOGOUT: &str = "LOGOUT";
}

/// Whether `value` can be carried in a single field without desynchronizing
/// the peer's parser.
pub fn is_wire_safe(value: &str) -> bool {
    !value.bytes().any(|b| b == FIELD_SEPARATOR || b == RECORD_TERMINATOR || b == b'\r')
}
