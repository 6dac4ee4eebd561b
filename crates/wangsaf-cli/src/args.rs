//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use wangsaf_client::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, SessionConfig};

/// Wangsaf chat client
#[derive(Parser, Debug)]
#[command(name = "wangsaf")]
#[command(about = "Line-based client for the Wangsaf chat protocol")]
#[command(version)]
pub struct Args {
    /// Server host to connect to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub server: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Username; when given, the client connects on startup
    #[arg(short, long)]
    pub username: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    pub connect_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Session settings derived from the arguments.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ..SessionConfig::default()
        }
    }
}
