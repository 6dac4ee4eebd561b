//! Decoded inbound records.

use crate::{
    FIELD_SEPARATOR, USER_SEPARATOR,
    errors::{ProtocolError, Result},
    tag,
};

/// One fully decoded protocol unit.
///
/// Produced only by the decoder and consumed once by the dispatch layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `LOGIN|username`. Handshake only, never surfaced to the UI.
    Login {
        /// Username echoed by the peer.
        username: String,
    },

    /// `MESSAGE|sender|text`.
    Chat {
        /// Author of the message.
        sender: String,
        /// Message body.
        text: String,
    },

    /// `PRIVATE|sender|target|text`.
    Private {
        /// Author of the message.
        sender: String,
        /// Recipient as written by the peer.
        target: String,
        /// Message body.
        text: String,
    },

    /// `USERLIST|a,b,c`. Empty entries and repeats are dropped, order kept.
    UserList(Vec<String>),

    /// `SYSTEM|text`.
    SystemNotice(String),

    /// `ERROR|text`.
    ErrorNotice(String),

    /// `LOGOUT|`. The peer is about to close; transport close is the
    /// authoritative signal.
    Logout,
}

impl Record {
    /// Wire tag of this record.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Login { .. } => tag::LOGIN,
            Self::Chat { .. } => tag::MESSAGE,
            Self::Private { .. } => tag::PRIVATE,
            Self::UserList(_) => tag::USERLIST,
            Self::SystemNotice(_) => tag::SYSTEM,
            Self::ErrorNotice(_) => tag::ERROR,
            Self::Logout => tag::LOGOUT,
        }
    }

    /// Parse a single line with its terminator already stripped.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Empty` for an empty line
    /// - `ProtocolError::TooFewFields` if the line has fewer than two fields,
    ///   or fewer than the command needs (`MESSAGE` 3, `PRIVATE` 4)
    /// - `ProtocolError::UnknownCommand` for an unrecognized tag
    pub fn parse_line(line: &str) -> Result<Self> {
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let fields: Vec<&str> = line.split(char::from(FIELD_SEPARATOR)).collect();
        let command = fields[0];

        let require = |expected: usize| {
            if fields.len() < expected {
                Err(ProtocolError::TooFewFields {
                    command: command.to_owned(),
                    expected,
                    actual: fields.len(),
                })
            } else {
                Ok(())
            }
        };

        require(2)?;

        match command {
            tag::LOGIN => Ok(Self::Login { username: fields[1].to_owned() }),
            tag::MESSAGE => {
                require(3)?;
                Ok(Self::Chat { sender: fields[1].to_owned(), text: fields[2].to_owned() })
            },
            tag::PRIVATE => {
                require(4)?;
                Ok(Self::Private {
                    sender: fields[1].to_owned(),
                    target: fields[2].to_owned(),
                    text: fields[3].to_owned(),
                })
            },
            tag::USERLIST => Ok(Self::UserList(split_users(fields[1]))),
            tag::SYSTEM => Ok(Self::SystemNotice(fields[1].to_owned())),
            tag::ERROR => Ok(Self::ErrorNotice(fields[1].to_owned())),
            tag::LOGOUT => Ok(Self::Logout),
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        }
    }
}

fn split_users(csv: &str) -> Vec<String> {
    let mut users: Vec<String> = Vec::new();
    for user in csv.split(USER_SEPARATOR).filter(|u| !u.is_empty()) {
        if !users.iter().any(|known| known == user) {
            users.push(user.to_owned());
        }
    }
    users
}
