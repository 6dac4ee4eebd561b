//! Outbound path: validation and framed writes.

use std::{io, time::Duration};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use wangsaf_proto::{OutboundCommand, is_wire_safe};

use crate::error::ValidationError;

/// Check that `command` can be sent as a single well-formed record.
///
/// # Errors
///
/// - `EmptyUsername`, `EmptyTarget` or `EmptyMessage` for blank fields
/// - `ForbiddenCharacter` if a field holds `|`, `\n` or `\r`
pub fn validate(command: &OutboundCommand) -> Result<(), ValidationError> {
    match command {
        OutboundCommand::Login { username } => {
            require(username, ValidationError::EmptyUsername)?;
            require_wire_safe(username, "username")
        },
        OutboundCommand::Chat { text } => {
            require(text, ValidationError::EmptyMessage)?;
            require_wire_safe(text, "message")
        },
        OutboundCommand::Private { target, text } => {
            require(target, ValidationError::EmptyTarget)?;
            require(text, ValidationError::EmptyMessage)?;
            require_wire_safe(target, "target")?;
            require_wire_safe(text, "message")
        },
        OutboundCommand::Logout => Ok(()),
    }
}

fn require(value: &str, missing: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(missing) } else { Ok(()) }
}

fn require_wire_safe(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if is_wire_safe(value) { Ok(()) } else { Err(ValidationError::ForbiddenCharacter { field }) }
}

/// Encode `command` and write it in full, then flush.
///
/// Fails with `TimedOut` if the write does not finish within `limit`.
pub(crate) async fn write_command<W>(
    writer: &mut W,
    command: &OutboundCommand,
    limit: Duration,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = wangsaf_proto::encode(command);

    tokio::time::timeout(limit, async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| {
        io::Error::new(io::ErrorKind::TimedOut, format!("{} write timed out", command.tag()))
    })?
}
