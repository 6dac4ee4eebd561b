//! Session configuration.

use std::time::Duration;

use wangsaf_proto::MAX_LINE_LENGTH;

/// Port the chat server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8888;

/// Time allowed for the transport handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the best-effort `LOGOUT` during teardown.
pub const DEFAULT_LOGOUT_TIMEOUT: Duration = Duration::from_secs(1);

/// Time allowed for a single outbound write before the transport is
/// considered broken.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bytes requested from the transport per read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// What happens to a connect attempt that lost the race against the timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AbandonPolicy {
    /// Abort the attempt as soon as the timeout fires.
    #[default]
    Abort,
    /// Let the attempt finish in the background and drop whatever stream it
    /// produces.
    Discard,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout for the transport handshake
    pub connect_timeout: Duration,
    /// Upper bound on the `LOGOUT` write during teardown
    pub logout_timeout: Duration,
    /// Upper bound on each outbound write
    pub write_timeout: Duration,
    /// Read chunk size of the receive loop
    pub read_buffer_size: usize,
    /// Longest unterminated record kept by the receive loop
    pub max_line_length: usize,
    /// Fate of a connect attempt abandoned on timeout
    pub abandoned_connect: AbandonPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            logout_timeout: DEFAULT_LOGOUT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_line_length: MAX_LINE_LENGTH,
            abandoned_connect: AbandonPolicy::default(),
        }
    }
}
