//! Outbound commands.

use bytes::BufMut;

use crate::{FIELD_SEPARATOR, ProtocolError, RECORD_TERMINATOR, Result, tag};

/// Command written by the client.
///
/// Ephemeral: built immediately before encoding and dropped after the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// `LOGIN|username`, sent once right after the transport connects.
    Login {
        /// Name to log in as.
        username: String,
    },

    /// `MESSAGE|text`, broadcast to every online user.
    Chat {
        /// Message body.
        text: String,
    },

    /// `PRIVATE|target|text`, delivered to one user.
    Private {
        /// Recipient username.
        target: String,
        /// Message body.
        text: String,
    },

    /// `LOGOUT|`, sent best-effort before closing.
    Logout,
}

impl OutboundCommand {
    /// Wire tag of this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Login { .. } => tag::LOGIN,
            Self::Chat { .. } => tag::MESSAGE,
            Self::Private { .. } => tag::PRIVATE,
            Self::Logout => tag::LOGOUT,
        }
    }

    /// Field values in wire order, tag excluded.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Login { username } => vec![username.as_str()],
            Self::Chat { text } => vec![text.as_str()],
            Self::Private { target, text } => vec![target.as_str(), text.as_str()],
            Self::Logout => vec![""],
        }
    }

    /// Append exactly one record, terminator included, to `dst`.
    ///
    /// Field values are written verbatim. A value containing `|` or a line
    /// terminator produces a record the peer will misparse; see
    /// [`crate::is_wire_safe`].
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(self.tag().as_bytes());
        for field in self.fields() {
            dst.put_u8(FIELD_SEPARATOR);
            dst.put_slice(field.as_bytes());
        }
        dst.put_u8(RECORD_TERMINATOR);
    }

    /// Parse a command line as the server receives it, terminator stripped.
    ///
    /// The server-side counterpart of [`OutboundCommand::encode`]. Extra
    /// fields are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Empty` for an empty line
    /// - `ProtocolError::TooFewFields` if a field the command needs is missing
    /// - `ProtocolError::UnknownCommand` for an unrecognized tag
    pub fn parse_line(line: &str) -> Result<Self> {
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let fields: Vec<&str> = line.split(char::from(FIELD_SEPARATOR)).collect();
        let command = fields[0];
        let expected = match command {
            tag::LOGIN | tag::MESSAGE | tag::LOGOUT => 2,
            tag::PRIVATE => 3,
            other => return Err(ProtocolError::UnknownCommand(other.to_owned())),
        };
        if fields.len() < expected {
            return Err(ProtocolError::TooFewFields {
                command: command.to_owned(),
                expected,
                actual: fields.len(),
            });
        }

        Ok(match command {
            tag::LOGIN => Self::Login { username: fields[1].to_owned() },
            tag::MESSAGE => Self::Chat { text: fields[1].to_owned() },
            tag::PRIVATE => {
                Self::Private { target: fields[1].to_owned(), text: fields[2].to_owned() }
            },
            _ => Self::Logout,
        })
    }
}
