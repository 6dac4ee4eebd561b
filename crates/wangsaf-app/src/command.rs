//! Commands typed into the input line.
//!
//! `/w <user> <message>` sends a private message, `/connect [host]
//! [username]`, `/disconnect` and `/quit` control the session. Anything else
//! is a public chat message.

use thiserror::Error;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Public chat message.
    Chat(String),
    /// Private message.
    Private {
        /// Recipient username.
        target: String,
        /// Message body.
        text: String,
    },
    /// Connect, optionally overriding the configured host and username.
    Connect {
        /// Host override.
        host: Option<String>,
        /// Username override.
        username: Option<String>,
    },
    /// Disconnect from the server.
    Disconnect,
    /// Leave the application.
    Quit,
}

/// Input line that looks like a command but is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `/w` without both a target and a message.
    #[error("Invalid private message format. Use: /w username message")]
    PrivateFormat,
}

impl Command {
    /// Parse one submitted line.
    ///
    /// Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix("/w ") {
            return Some(parse_private(rest));
        }

        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some("/connect") => Self::Connect {
                host: words.next().map(str::to_owned),
                username: words.next().map(str::to_owned),
            },
            Some("/disconnect") => Self::Disconnect,
            Some("/quit") => Self::Quit,
            _ => Self::Chat(line.to_owned()),
        };

        Some(Ok(command))
    }
}

fn parse_private(rest: &str) -> Result<Command, CommandError> {
    let (target, text) = rest.split_once(' ').ok_or(CommandError::PrivateFormat)?;
    let text = text.trim();

    if target.is_empty() || text.is_empty() {
        return Err(CommandError::PrivateFormat);
    }

    Ok(Command::Private { target: target.to_owned(), text: text.to_owned() })
}
