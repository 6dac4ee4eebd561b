//! CLI errors.

use std::io;

use thiserror::Error;

/// Errors from the terminal client.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error on stdin or stdout.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log filter directive could not be parsed.
    #[error("invalid log level: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global tracing subscriber was already installed.
    #[error("logging already initialized: {0}")]
    Logging(String),
}
