//! Connection lifecycle state machine.
//!
//! Pure transition logic with no I/O. Each transition either rejects the
//! request or moves the state and returns the events to emit, in order. The
//! [`crate::Session`] driver performs the I/O between transitions.
//!
//! ```text
//! Disconnected --begin_connect--> Connecting --connected--> Connected
//!      ^                              |                         |
//!      +-------connect_failed---------+                  begin_disconnect
//!      |                                                        v
//!      +-----------------finish_disconnect---------------- Disconnecting
//! ```

use wangsaf_proto::is_wire_safe;

use crate::{
    error::{SessionError, ValidationError},
    event::{DISCONNECTED_NOTICE, SessionEvent, Status},
};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No transport.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Transport open and logged in.
    Connected,
    /// Teardown in progress.
    Disconnecting,
}

/// Lifecycle bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: SessionState,
    username: Option<String>,
    /// Incremented on every successful connect.
    generation: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Fresh lifecycle in [`SessionState::Disconnected`].
    pub fn new() -> Self {
        Self { state: SessionState::Disconnected, username: None, generation: 0 }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Username of the current attempt or connection.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Identifier of the current connection.
    ///
    /// A receive loop carries the generation it was started with so a late
    /// teardown request from a superseded connection is ignored.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a connect attempt.
    ///
    /// Inputs are trimmed. Validation runs before the state check so bad input
    /// is reported as such in every state.
    ///
    /// # Errors
    ///
    /// - `Validation` if the username or address is empty, or the username
    ///   contains a field separator or line break
    /// - `InvalidState` unless [`SessionState::Disconnected`]
    pub fn begin_connect(
        &mut self,
        address: &str,
        username: &str,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        if address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }
        if !is_wire_safe(username) {
            return Err(ValidationError::ForbiddenCharacter { field: "username" }.into());
        }
        if self.state != SessionState::Disconnected {
            return Err(SessionError::InvalidState { state: self.state, operation: "connect" });
        }

        self.state = SessionState::Connecting;
        self.username = Some(username.to_owned());

        Ok(vec![SessionEvent::StatusChanged(Status::Connecting)])
    }

    /// Handshake and login succeeded. Returns the new generation.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless [`SessionState::Connecting`]
    pub fn connected(&mut self) -> Result<(u64, Vec<SessionEvent>), SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::InvalidState { state: self.state, operation: "connected" });
        }

        self.state = SessionState::Connected;
        self.generation += 1;

        Ok((self.generation, vec![SessionEvent::StatusChanged(Status::Connected)]))
    }

    /// Connect attempt failed with `reason`.
    ///
    /// Returns nothing if no attempt is in progress.
    pub fn connect_failed(&mut self, reason: &str) -> Vec<SessionEvent> {
        if self.state != SessionState::Connecting {
            return Vec::new();
        }

        self.state = SessionState::Disconnected;
        self.username = None;

        vec![
            SessionEvent::ErrorNotice(format!("Connection error: {reason}")),
            SessionEvent::StatusChanged(Status::Failed),
        ]
    }

    /// Claim teardown of connection `generation`.
    ///
    /// Returns false, leaving the state untouched, if that connection is not
    /// the current one or is not [`SessionState::Connected`]. Exactly one
    /// caller wins for each connection.
    pub fn begin_disconnect(&mut self, generation: u64) -> bool {
        if self.state != SessionState::Connected || generation != self.generation {
            return false;
        }

        self.state = SessionState::Disconnecting;
        true
    }

    /// Teardown finished.
    ///
    /// Returns nothing unless [`SessionState::Disconnecting`].
    pub fn finish_disconnect(&mut self) -> Vec<SessionEvent> {
        if self.state != SessionState::Disconnecting {
            return Vec::new();
        }

        self.state = SessionState::Disconnected;
        self.username = None;

        vec![
            SessionEvent::StatusChanged(Status::Disconnected),
            SessionEvent::SystemNotice(DISCONNECTED_NOTICE.to_string()),
        ]
    }
}
