//! Error types for the session engine.
//!
//! Strongly-typed errors for the synchronous half of each operation. Failures
//! that happen on the background receive task are never returned; they are
//! converted into notices on the event channel.

use std::{io, time::Duration};

use thiserror::Error;

use crate::lifecycle::SessionState;

/// Input rejected before any I/O happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty or whitespace.
    #[error("Please enter a username")]
    EmptyUsername,

    /// Server address is empty or whitespace.
    #[error("Please enter a server IP address")]
    EmptyAddress,

    /// Message body is empty or whitespace.
    #[error("message is empty")]
    EmptyMessage,

    /// Private message has no recipient.
    #[error("private message needs a target user")]
    EmptyTarget,

    /// Value would break record framing on the wire.
    #[error("{field} must not contain '|' or line breaks")]
    ForbiddenCharacter {
        /// Which input carried the character
        field: &'static str,
    },
}

/// Errors returned by [`crate::Session`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Input rejected before any I/O
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Transport handshake did not complete within the bound
    #[error("connection timeout after {after:?}")]
    ConnectTimeout {
        /// Bound that was exceeded
        after: Duration,
    },

    /// Underlying read, write or connect failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Operation not allowed in the current state
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

impl SessionError {
    /// Returns true if retrying the same operation may succeed.
    ///
    /// Timeouts and transport failures depend on the network. Validation and
    /// state errors do not change by retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::Transport(_))
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
