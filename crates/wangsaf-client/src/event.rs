//! Outward notifications.
//!
//! Everything a session reports to the UI is a [`SessionEvent`] on one
//! unbounded channel. The consumer drains it on its own task and, if it
//! prefers callbacks, replays each event into an [`EventSink`].

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use wangsaf_proto::Record;

/// Notice emitted after every completed teardown.
pub const DISCONNECTED_NOTICE: &str = "Disconnected from server";

/// Receiving end of a session's event channel.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Connection status as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Transport handshake in progress.
    Connecting,
    /// Logged in; records are flowing.
    Connected,
    /// Torn down after being connected.
    Disconnected,
    /// Connect attempt did not succeed.
    Failed,
}

impl Status {
    /// Lowercase label for captions and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        }
    }
}

/// Notification from a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Public chat line.
    ChatMessage {
        /// Author
        sender: String,
        /// Body
        text: String,
    },
    /// Private message addressed to this user.
    PrivateMessage {
        /// Author
        sender: String,
        /// Body
        text: String,
    },
    /// Full roster of online users.
    UserListChanged(Vec<String>),
    /// Informational notice from the server or the session itself.
    SystemNotice(String),
    /// Error notice from the server or the session itself.
    ErrorNotice(String),
    /// Connection status transition.
    StatusChanged(Status),
}

impl SessionEvent {
    /// Map an inbound record to the event it raises.
    ///
    /// Echoed `LOGIN` and `LOGOUT` records raise nothing.
    pub fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Chat { sender, text } => Some(Self::ChatMessage { sender, text }),
            Record::Private { sender, text, .. } => Some(Self::PrivateMessage { sender, text }),
            Record::UserList(users) => Some(Self::UserListChanged(users)),
            Record::SystemNotice(text) => Some(Self::SystemNotice(text)),
            Record::ErrorNotice(text) => Some(Self::ErrorNotice(text)),
            Record::Login { .. } | Record::Logout => None,
        }
    }

    /// Invoke the matching callback on `sink`.
    pub fn deliver<S: EventSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Self::ChatMessage { sender, text } => sink.on_chat_message(sender, text),
            Self::PrivateMessage { sender, text } => sink.on_private_message(sender, text),
            Self::UserListChanged(users) => sink.on_user_list_changed(users),
            Self::SystemNotice(text) => sink.on_system_notice(text),
            Self::ErrorNotice(text) => sink.on_error_notice(text),
            Self::StatusChanged(status) => sink.on_status_changed(*status),
        }
    }
}

/// Callback-style consumer of session events.
///
/// Runs on whatever task drains the event channel, never on the receive loop.
pub trait EventSink {
    /// Public chat line arrived.
    fn on_chat_message(&mut self, sender: &str, text: &str);

    /// Private message arrived.
    fn on_private_message(&mut self, sender: &str, text: &str);

    /// Roster replaced.
    fn on_user_list_changed(&mut self, users: &[String]);

    /// Informational notice.
    fn on_system_notice(&mut self, text: &str);

    /// Error notice.
    fn on_error_notice(&mut self, text: &str);

    /// Status transition.
    fn on_status_changed(&mut self, status: Status);
}

/// Producer side of the event channel.
#[derive(Debug, Clone)]
pub(crate) struct EventSender(mpsc::UnboundedSender<SessionEvent>);

impl EventSender {
    pub(crate) fn channel() -> (Self, SessionEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if self.0.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }

    pub(crate) fn emit_all(&self, events: impl IntoIterator<Item = SessionEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Per-connection switch in front of the event channel.
///
/// The receive loop delivers records through the gate. Teardown closes it
/// before emitting the disconnect notices, so no record from a torn-down
/// connection can be observed after them.
#[derive(Debug, Clone)]
pub(crate) struct DeliveryGate {
    sender: Arc<Mutex<Option<EventSender>>>,
}

impl DeliveryGate {
    pub(crate) fn open(sender: EventSender) -> Self {
        Self { sender: Arc::new(Mutex::new(Some(sender))) }
    }

    /// Emit `event` unless the gate is closed. Returns whether it was emitted.
    pub(crate) fn deliver(&self, event: SessionEvent) -> bool {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => {
                sender.emit(event);
                true
            },
            None => false,
        }
    }

    pub(crate) fn close(&self) {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
