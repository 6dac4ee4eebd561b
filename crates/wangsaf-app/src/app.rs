//! Application state machine.
//!
//! This module defines the [`App`] state machine, which holds everything the
//! chat window shows, completely decoupled from I/O and the session.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Edits the input line and turns submitted lines into commands.
//! - Keeps the transcript and the online-user list.
//! - Tracks connection status for captions and input gating.

use wangsaf_client::{SessionEvent, Status};

use crate::{AppAction, AppEvent, ChatLine, Clock, Command, KeyInput, LineKind};

/// Error shown when a command needs a connection.
pub const NOT_CONNECTED: &str = "Not connected to server";

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection status as last reported by the session.
    status: Status,
    /// Server host to connect to.
    server_addr: String,
    /// Server port.
    port: u16,
    /// Name to log in as.
    username: String,
    /// Online users, in server order.
    users: Vec<String>,
    /// Chat transcript, oldest first.
    transcript: Vec<ChatLine>,
    /// Input line being edited.
    input: String,
    /// Timestamp source for new transcript lines.
    clock: Clock,
}

impl App {
    /// Create a disconnected App for the given server and username.
    pub fn new(server_addr: String, port: u16, username: String) -> Self {
        Self {
            status: Status::Disconnected,
            server_addr,
            port,
            username,
            users: Vec::new(),
            transcript: Vec::new(),
            input: String::new(),
            clock: Clock::Local,
        }
    }

    /// Use `clock` for transcript timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Submit(line) => {
                self.input.clear();
                self.submit(&line)
            },
            AppEvent::SelectUser(user) => {
                self.input = format!("/w {user} ");
                vec![AppAction::Render]
            },
            AppEvent::Session(event) => self.handle_session(event),
            AppEvent::Error { message } => {
                self.push(LineKind::Error(message));
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Char(c) => {
                self.input.push(c);
                vec![AppAction::Render]
            },
            KeyInput::Backspace => {
                self.input.pop();
                vec![AppAction::Render]
            },
            KeyInput::Enter => {
                let line = std::mem::take(&mut self.input);
                let mut actions = self.submit(&line);
                if !actions.contains(&AppAction::Render) {
                    actions.push(AppAction::Render);
                }
                actions
            },
            KeyInput::Esc => self.quit(),
        }
    }

    fn handle_session(&mut self, event: SessionEvent) -> Vec<AppAction> {
        match event {
            SessionEvent::ChatMessage { sender, text } => {
                self.push(LineKind::Chat { sender, text });
            },
            SessionEvent::PrivateMessage { sender, text } => {
                self.push(LineKind::Private { sender, text });
            },
            SessionEvent::UserListChanged(users) => {
                if self.status != Status::Connected {
                    tracing::debug!(count = users.len(), "roster while not connected ignored");
                    return vec![];
                }
                self.users = users;
            },
            SessionEvent::SystemNotice(text) => self.push(LineKind::System(text)),
            SessionEvent::ErrorNotice(text) => self.push(LineKind::Error(text)),
            SessionEvent::StatusChanged(status) => {
                tracing::debug!(status = status.label(), "session status changed");
                self.status = status;
                if status != Status::Connected {
                    self.users.clear();
                }
            },
        }
        vec![AppAction::Render]
    }

    /// Interpret a submitted input line.
    fn submit(&mut self, line: &str) -> Vec<AppAction> {
        let command = match Command::parse(line) {
            None => return vec![],
            Some(Ok(command)) => command,
            Some(Err(error)) => return self.error(error.to_string()),
        };

        match command {
            Command::Chat(text) => self.send_chat(text),
            Command::Private { target, text } => self.send_private(target, text),
            Command::Connect { host, username } => {
                if let Some(host) = host {
                    self.server_addr = host;
                }
                if let Some(username) = username {
                    self.username = username;
                }
                self.connect()
            },
            Command::Disconnect => self.disconnect(),
            Command::Quit => self.quit(),
        }
    }

    fn push(&mut self, kind: LineKind) {
        self.transcript.push(ChatLine::new(self.clock.now(), kind));
    }

    fn error(&mut self, message: impl Into<String>) -> Vec<AppAction> {
        self.push(LineKind::Error(message.into()));
        vec![AppAction::Render]
    }

    /// Connect with the configured server and username.
    pub fn connect(&mut self) -> Vec<AppAction> {
        match self.status {
            Status::Connecting | Status::Connected => self.error("Already connected"),
            Status::Disconnected | Status::Failed => {
                if self.username.trim().is_empty() {
                    return self.error("Please enter a username");
                }
                vec![
                    AppAction::Connect {
                        address: self.server_addr.clone(),
                        port: self.port,
                        username: self.username.clone(),
                    },
                    AppAction::Render,
                ]
            },
        }
    }

    /// Disconnect from the server.
    pub fn disconnect(&mut self) -> Vec<AppAction> {
        if self.status != Status::Connected {
            return self.error(NOT_CONNECTED);
        }
        vec![AppAction::Disconnect, AppAction::Render]
    }

    /// Send a public chat message.
    pub fn send_chat(&mut self, text: String) -> Vec<AppAction> {
        if self.status != Status::Connected {
            return self.error(NOT_CONNECTED);
        }
        vec![AppAction::SendChat { text }, AppAction::Render]
    }

    /// Send a private message to `target`.
    pub fn send_private(&mut self, target: String, text: String) -> Vec<AppAction> {
        if self.status != Status::Connected {
            return self.error(NOT_CONNECTED);
        }
        vec![AppAction::SendPrivate { target, text }, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Connection status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the input line can send anything.
    pub fn input_enabled(&self) -> bool {
        self.status == Status::Connected
    }

    /// Window caption, e.g. `Wangsaf - Connected`.
    pub fn caption(&self) -> String {
        let status = match self.status {
            Status::Connecting => "Connecting...",
            Status::Connected => "Connected",
            Status::Disconnected => "Disconnected",
            Status::Failed => "Connection failed",
        };
        format!("Wangsaf - {status}")
    }

    /// Roster caption, e.g. `Users online: 3`.
    pub fn users_caption(&self) -> String {
        format!("Users online: {}", self.users.len())
    }

    /// Server host.
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Configured username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Online users.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Transcript, oldest first.
    pub fn transcript(&self) -> &[ChatLine] {
        &self.transcript
    }

    /// Current input line.
    pub fn input(&self) -> &str {
        &self.input
    }
}
