//! Protocol error types.

use thiserror::Error;

/// Reasons a received line does not become a [`crate::Record`].
///
/// The decoder drops such lines silently; this type names the cause so the
/// drop can be logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line was empty once the terminator was stripped.
    #[error("empty record")]
    Empty,

    /// Fewer fields than the command requires.
    #[error("{command} record needs {expected} fields, got {actual}")]
    TooFewFields {
        /// Command tag of the record
        command: String,
        /// Minimum number of fields, tag included
        expected: usize,
        /// Number of fields present, tag included
        actual: usize,
    },

    /// Command tag is not part of the protocol.
    #[error("unknown command tag {0:?}")]
    UnknownCommand(String),
}

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;
