//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (keys, submitted lines, roster selection).
//! - Session notifications forwarded from the event channel.

use wangsaf_client::SessionEvent;

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// A whole input line, from frontends that read line by line.
    Submit(String),

    /// User picked a name from the online list.
    SelectUser(String),

    /// Notification from the chat session.
    Session(SessionEvent),

    /// A session operation was rejected before reaching the network.
    Error {
        /// Error description.
        message: String,
    },
}

impl From<SessionEvent> for AppEvent {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}
