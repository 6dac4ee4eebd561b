//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use wangsaf_app::App;
use wangsaf_client::Status;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Snapshot every App, each under its username.
    pub fn from_apps<'a>(apps: impl IntoIterator<Item = &'a App>) -> Self {
        Self { clients: apps.into_iter().map(ClientSnapshot::from_app).collect() }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    /// Username the client logs in as.
    pub username: String,
    /// Connection status shown to the user.
    pub status: Status,
    /// Roster shown to the user.
    pub users: Vec<String>,
    /// Transcript length.
    pub transcript_len: usize,
}

impl ClientSnapshot {
    /// Create a snapshot with an empty roster and transcript.
    pub fn new(username: impl Into<String>, status: Status) -> Self {
        Self { username: username.into(), status, users: Vec::new(), transcript_len: 0 }
    }

    /// Capture an App's observable state.
    pub fn from_app(app: &App) -> Self {
        Self {
            username: app.username().to_owned(),
            status: app.status(),
            users: app.users().to_vec(),
            transcript_len: app.transcript().len(),
        }
    }

    /// Set the roster.
    #[must_use]
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users = users.into_iter().map(Into::into).collect();
        self
    }
}
