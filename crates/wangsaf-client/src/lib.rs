//! Client
//!
//! Chat session engine for the Wangsaf protocol. Owns one long-lived byte
//! stream to the chat server, performs the login handshake, decodes inbound
//! records on a background task and writes outbound commands on behalf of the
//! caller.
//!
//! # Architecture
//!
//! The connection lifecycle is a pure state machine ([`Lifecycle`]) that
//! validates transitions and returns the notices to emit. [`Session`] wraps it
//! with the I/O: it opens the transport through a [`Connector`], spawns the
//! receive loop, and serializes sends and teardown behind one mutex.
//!
//! All notifications for a session travel over a single channel of
//! [`SessionEvent`]s, so the UI consumes them on its own task in one order.
//! Nothing in this crate calls UI code directly.
//!
//! # Components
//!
//! - [`Session`]: connect, send, disconnect
//! - [`Lifecycle`]: `Disconnected → Connecting → Connected → Disconnecting`
//! - [`SessionEvent`] / [`EventSink`]: outward notification contract
//! - [`Connector`] / [`TcpConnector`]: transport seam
//! - [`SessionConfig`]: timeouts and buffer sizes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod lifecycle;
mod receive;
mod send;
mod session;
mod transport;

pub use config::{
    AbandonPolicy, DEFAULT_CONNECT_TIMEOUT, DEFAULT_LOGOUT_TIMEOUT, DEFAULT_PORT,
    DEFAULT_READ_BUFFER_SIZE, DEFAULT_WRITE_TIMEOUT, SessionConfig,
};
pub use error::{SessionError, ValidationError};
pub use event::{DISCONNECTED_NOTICE, EventSink, SessionEvent, SessionEvents, Status};
pub use lifecycle::{Lifecycle, SessionState};
pub use send::validate;
pub use session::Session;
pub use transport::{ByteStream, Connector, TcpConnector};
pub use wangsaf_proto::{OutboundCommand, Record};
