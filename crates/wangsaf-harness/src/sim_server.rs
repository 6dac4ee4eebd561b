//! Reference chat server for simulation and loopback tests.
//!
//! `ChatServer` speaks the client protocol: it accepts `LOGIN`, relays
//! `MESSAGE` to everyone and `PRIVATE` to its target, broadcasts the roster on
//! every join and leave, and closes on `LOGOUT`. The same connection handler
//! runs over turmoil's simulated TCP and over real tokio sockets.
//!
//! Tests hold a clone of the server to inspect what it received and to kick
//! users.

use std::{
    collections::BTreeMap,
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use wangsaf_proto::{OutboundCommand, tag};

/// Relay record the server writes for a command from `sender`.
///
/// Returns `None` for commands that are not relayed.
pub fn relay(sender: &str, command: &OutboundCommand) -> Option<String> {
    match command {
        OutboundCommand::Chat { text } => Some(format!("{}|{sender}|{text}\n", tag::MESSAGE)),
        OutboundCommand::Private { target, text } => {
            Some(format!("{}|{sender}|{target}|{text}\n", tag::PRIVATE))
        },
        OutboundCommand::Login { .. } | OutboundCommand::Logout => None,
    }
}

fn notice(tag: &str, text: &str) -> String {
    format!("{tag}|{text}\n")
}

/// One accepted connection.
struct Client {
    /// Set once `LOGIN` succeeds.
    username: Option<String>,
    /// Records queued for this connection's writer task.
    outbox: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct ServerState {
    /// Connections in accept order.
    clients: BTreeMap<u64, Client>,
    next_id: u64,
    /// Every parsed command with the username that sent it.
    received: Vec<(Option<String>, OutboundCommand)>,
}

impl ServerState {
    fn id_of(&self, username: &str) -> Option<u64> {
        self.clients
            .iter()
            .find(|(_, client)| client.username.as_deref() == Some(username))
            .map(|(id, _)| *id)
    }

    fn roster(&self) -> Vec<String> {
        self.clients.values().filter_map(|client| client.username.clone()).collect()
    }

    fn send(&self, id: u64, record: &str) {
        if let Some(client) = self.clients.get(&id) {
            // A closed outbox means the connection is already going away.
            let _ = client.outbox.send(record.to_owned());
        }
    }

    fn broadcast(&self, record: &str) {
        for (id, client) in &self.clients {
            if client.username.is_some() {
                self.send(*id, record);
            }
        }
    }

    fn broadcast_roster(&self) {
        let record = notice(tag::USERLIST, &self.roster().join(","));
        self.broadcast(&record);
    }
}

/// Chat server shared between its accept loop and the test.
#[derive(Clone, Default)]
pub struct ChatServer {
    state: Arc<Mutex<ServerState>>,
}

impl ChatServer {
    /// Create a server with nobody online.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept connections from a simulated listener forever.
    pub async fn run_sim(self, listener: turmoil::net::TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!(%peer, "accepted");
            let server = self.clone();
            tokio::spawn(async move { server.serve(stream).await });
        }
    }

    /// Accept connections from a real listener forever.
    pub async fn run_tcp(self, listener: tokio::net::TcpListener) -> io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!(%peer, "accepted");
            let server = self.clone();
            tokio::spawn(async move { server.serve(stream).await });
        }
    }

    /// Serve one connection until the client logs out or disconnects.
    pub async fn serve<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let (outbox, mut inbox) = mpsc::unbounded_channel::<String>();
        let id = self.register(outbox);

        let writer_task = tokio::spawn(async move {
            while let Some(record) = inbox.recv().await {
                if writer.write_all(record.as_bytes()).await.is_err() {
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !self.handle_line(id, line.trim_end_matches('\r')) {
                break;
            }
        }

        self.unregister(id);
        let _ = writer_task.await;
    }

    fn register(&self, outbox: mpsc::UnboundedSender<String>) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.clients.insert(id, Client { username: None, outbox });
        id
    }

    fn unregister(&self, id: u64) {
        let mut state = self.lock();
        let Some(client) = state.clients.remove(&id) else {
            return;
        };
        if let Some(username) = client.username {
            tracing::debug!(%username, "left");
            state.broadcast(&notice(tag::SYSTEM, &format!("{username} left the chat")));
            state.broadcast_roster();
        }
    }

    /// Handle one command line. Returns false to close the connection.
    fn handle_line(&self, id: u64, line: &str) -> bool {
        let command = match OutboundCommand::parse_line(line) {
            Ok(command) => command,
            Err(error) => {
                tracing::debug!(%error, "ignoring malformed command");
                return true;
            },
        };

        let mut state = self.lock();
        let Some(sender) = state.clients.get(&id).map(|client| client.username.clone()) else {
            return false;
        };
        state.received.push((sender.clone(), command.clone()));

        match (command, sender) {
            (OutboundCommand::Login { username }, None) => {
                if username.is_empty() || state.id_of(&username).is_some() {
                    state.send(id, &notice(tag::ERROR, "Username already taken"));
                    return false;
                }
                tracing::debug!(%username, "logged in");
                if let Some(client) = state.clients.get_mut(&id) {
                    client.username = Some(username.clone());
                }
                state.broadcast(&notice(tag::SYSTEM, &format!("{username} joined the chat")));
                state.broadcast_roster();
            },
            (OutboundCommand::Login { .. }, Some(_)) => {
                state.send(id, &notice(tag::ERROR, "Already logged in"));
            },
            (OutboundCommand::Logout, _) => return false,
            (_, None) => {
                state.send(id, &notice(tag::ERROR, "Please login first"));
            },
            (command @ OutboundCommand::Chat { .. }, Some(sender)) => {
                if let Some(record) = relay(&sender, &command) {
                    state.broadcast(&record);
                }
            },
            (command @ OutboundCommand::Private { .. }, Some(sender)) => {
                let OutboundCommand::Private { target, .. } = &command else {
                    return true;
                };
                match (state.id_of(target), relay(&sender, &command)) {
                    (Some(target_id), Some(record)) => state.send(target_id, &record),
                    _ => {
                        let text = format!("User {target} is not online");
                        state.send(id, &notice(tag::ERROR, &text));
                    },
                }
            },
        }
        true
    }

    /// Close `username`'s connection from the server side.
    ///
    /// Returns false if nobody by that name is online.
    pub fn kick(&self, username: &str) -> bool {
        let mut state = self.lock();
        let Some(id) = state.id_of(username) else {
            return false;
        };
        if let Some(client) = state.clients.remove(&id) {
            let _ = client.outbox.send(notice(tag::SYSTEM, "You were removed from the chat"));
        }
        state.broadcast(&notice(tag::SYSTEM, &format!("{username} left the chat")));
        state.broadcast_roster();
        true
    }

    /// Usernames currently online, in connection order.
    pub fn online(&self) -> Vec<String> {
        self.lock().roster()
    }

    /// Every command received so far, with the sender's username.
    pub fn received(&self) -> Vec<(Option<String>, OutboundCommand)> {
        self.lock().received.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_prefixes_sender() {
        assert_eq!(
            relay("alice", &OutboundCommand::Chat { text: "hi".into() }).as_deref(),
            Some("MESSAGE|alice|hi\n")
        );
        assert_eq!(
            relay("alice", &OutboundCommand::Private { target: "bob".into(), text: "psst".into() })
                .as_deref(),
            Some("PRIVATE|alice|bob|psst\n")
        );
        assert_eq!(relay("alice", &OutboundCommand::Logout), None);
    }

    #[tokio::test]
    async fn login_broadcasts_roster() {
        let server = ChatServer::new();
        let (client, remote) = tokio::io::duplex(1024);
        let serving = tokio::spawn({
            let server = server.clone();
            async move { server.serve(remote).await }
        });

        let (read, mut write) = tokio::io::split(client);
        write.write_all(b"LOGIN|alice\n").await.unwrap();
        let mut lines = BufReader::new(read).lines();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("SYSTEM|alice joined the chat"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("USERLIST|alice"));
        assert_eq!(server.online(), vec!["alice".to_string()]);

        write.write_all(b"LOGOUT|\n").await.unwrap();
        serving.await.unwrap();
        assert!(server.online().is_empty());
    }

    #[tokio::test]
    async fn commands_before_login_are_refused() {
        let server = ChatServer::new();
        let (client, remote) = tokio::io::duplex(1024);
        tokio::spawn({
            let server = server.clone();
            async move { server.serve(remote).await }
        });

        let (read, mut write) = tokio::io::split(client);
        write.write_all(b"MESSAGE|hello\n").await.unwrap();
        let mut lines = BufReader::new(read).lines();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ERROR|Please login first"));
    }
}
