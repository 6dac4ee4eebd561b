//! Session driver.
//!
//! Executes the I/O around [`Lifecycle`] transitions. One async mutex guards
//! the lifecycle and the write half of the current connection, so connect,
//! send and teardown are serialized and a send can never interleave with a
//! teardown of the same connection.
//!
//! The receive loop holds its own read half and a clone of the shared state.
//! When it sees the peer close or a read fail it requests teardown with the
//! generation it was started for; a stale request is a no-op.

use std::sync::Arc;

use tokio::{
    io::{AsyncWriteExt, WriteHalf},
    sync::{Mutex, MutexGuard},
};
use tokio_util::sync::CancellationToken;
use wangsaf_proto::OutboundCommand;

use crate::{
    config::{AbandonPolicy, SessionConfig},
    error::SessionError,
    event::{DeliveryGate, EventSender, SessionEvent, SessionEvents},
    lifecycle::{Lifecycle, SessionState},
    receive::ReceiveLoop,
    send,
    transport::{ByteStream, Connector, TcpConnector},
};

/// Why a connection is being torn down.
#[derive(Debug)]
pub(crate) enum Cause {
    /// Caller invoked [`Session::disconnect`].
    Requested,
    /// Peer closed its end.
    PeerClosed,
    /// Read on the receive loop failed.
    ReadFailed(String),
    /// Write on the send path failed.
    WriteFailed(String),
}

impl Cause {
    fn failure(&self) -> Option<&str> {
        match self {
            Self::ReadFailed(reason) | Self::WriteFailed(reason) => Some(reason),
            Self::Requested | Self::PeerClosed => None,
        }
    }
}

/// Resources of the current connection.
struct Link<S> {
    writer: WriteHalf<S>,
    cancel: CancellationToken,
    gate: DeliveryGate,
}

struct Inner<S> {
    lifecycle: Lifecycle,
    /// Present iff the lifecycle is `Connected`.
    link: Option<Link<S>>,
}

/// Connect attempt holding the session lock.
///
/// Dropped while still connecting, it fails the attempt so the session is
/// left disconnected and can be connected again.
struct Attempt<'a, S> {
    inner: MutexGuard<'a, Inner<S>>,
    events: &'a EventSender,
}

impl<S> Drop for Attempt<'_, S> {
    fn drop(&mut self) {
        let events = self.inner.lifecycle.connect_failed(CANCELLED_REASON);
        if !events.is_empty() {
            tracing::debug!("connect attempt cancelled");
            self.events.emit_all(events);
        }
    }
}

/// Reason reported when a connect attempt is abandoned by its caller.
const CANCELLED_REASON: &str = "Connection cancelled";

/// State shared between the session handle and its receive loop.
pub(crate) struct Shared<S> {
    inner: Mutex<Inner<S>>,
    events: EventSender,
    pub(crate) config: SessionConfig,
}

impl<S: ByteStream> Shared<S> {
    /// Tear down connection `generation` if it is still the current one.
    ///
    /// Returns whether this call performed the teardown.
    pub(crate) async fn shut_down(&self, generation: u64, cause: Cause) -> bool {
        let mut inner = self.inner.lock().await;
        self.shut_down_locked(&mut inner, generation, cause).await
    }

    async fn shut_down_locked(&self, inner: &mut Inner<S>, generation: u64, cause: Cause) -> bool {
        if !inner.lifecycle.begin_disconnect(generation) {
            tracing::trace!(generation, ?cause, "teardown not applicable");
            return false;
        }

        tracing::info!(generation, ?cause, "disconnecting");

        if let Some(Link { mut writer, cancel, gate }) = inner.link.take() {
            cancel.cancel();
            gate.close();

            if let Some(reason) = cause.failure() {
                self.events.emit(SessionEvent::ErrorNotice(format!("Connection error: {reason}")));
            }

            if !matches!(cause, Cause::WriteFailed(_)) {
                let logout = send::write_command(
                    &mut writer,
                    &OutboundCommand::Logout,
                    self.config.logout_timeout,
                )
                .await;
                if let Err(error) = logout {
                    tracing::debug!(%error, "logout not delivered");
                }
            }

            if tokio::time::timeout(self.config.logout_timeout, writer.shutdown()).await.is_err() {
                tracing::debug!("transport shutdown timed out");
            }
        }

        self.events.emit_all(inner.lifecycle.finish_disconnect());
        true
    }
}

/// A chat session: one connection at a time to one server.
///
/// Created once and reused; it moves between connected and disconnected as
/// often as the caller likes. Notifications arrive on the [`SessionEvents`]
/// channel returned by [`Session::new`].
pub struct Session<C: Connector = TcpConnector> {
    connector: C,
    shared: Arc<Shared<C::Stream>>,
}

impl Session<TcpConnector> {
    /// Session over plain TCP.
    pub fn tcp(config: SessionConfig) -> (Self, SessionEvents) {
        Self::new(TcpConnector, config)
    }
}

impl<C: Connector> Session<C> {
    /// Create a disconnected session and the channel its events arrive on.
    pub fn new(connector: C, config: SessionConfig) -> (Self, SessionEvents) {
        let (events, rx) = EventSender::channel();
        let inner = Inner { lifecycle: Lifecycle::new(), link: None };
        let shared = Arc::new(Shared { inner: Mutex::new(inner), events, config });

        (Self { connector, shared }, rx)
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.shared.inner.lock().await.lifecycle.state()
    }

    /// Username of the current connection, if any.
    pub async fn username(&self) -> Option<String> {
        self.shared.inner.lock().await.lifecycle.username().map(str::to_owned)
    }

    /// Whether the session is connected.
    pub async fn is_connected(&self) -> bool {
        self.state().await == SessionState::Connected
    }

    /// Connect to `address:port` and log in as `username`.
    ///
    /// Emits `StatusChanged(Connecting)`, then either `StatusChanged(Connected)`
    /// or an `ErrorNotice` followed by `StatusChanged(Failed)`. Dropping the
    /// returned future before it completes fails the attempt the same way.
    ///
    /// # Errors
    ///
    /// - `Validation` if the username or address is blank
    /// - `InvalidState` unless disconnected
    /// - `ConnectTimeout` if the handshake exceeds the configured bound
    /// - `Transport` if the handshake or the login write fails
    pub async fn connect(
        &self,
        address: &str,
        port: u16,
        username: &str,
    ) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock().await;

        let events = inner.lifecycle.begin_connect(address, username)?;
        self.shared.events.emit_all(events);
        let mut attempt = Attempt { inner, events: &self.shared.events };

        let address = address.trim();
        let username = username.trim();
        tracing::info!(%address, port, %username, "connecting");

        let stream = match self.establish(address, port, username).await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%address, port, %error, "connect failed");
                let events = attempt.inner.lifecycle.connect_failed(&failure_reason(&error));
                self.shared.events.emit_all(events);
                return Err(error);
            },
        };

        let (reader, writer) = tokio::io::split(stream);
        let (generation, events) = attempt.inner.lifecycle.connected()?;
        let cancel = CancellationToken::new();
        let gate = DeliveryGate::open(self.shared.events.clone());

        attempt.inner.link = Some(Link { writer, cancel: cancel.clone(), gate: gate.clone() });
        self.shared.events.emit_all(events);

        let receive = ReceiveLoop::new(reader, Arc::clone(&self.shared), gate, cancel, generation);
        tokio::spawn(receive.run());

        tracing::info!(%address, port, generation, "connected");
        Ok(())
    }

    /// Open the transport and write the login record.
    async fn establish(
        &self,
        address: &str,
        port: u16,
        username: &str,
    ) -> Result<C::Stream, SessionError> {
        let mut stream = self.open(address, port).await?;

        let login = OutboundCommand::Login { username: username.to_owned() };
        send::write_command(&mut stream, &login, self.shared.config.write_timeout)
            .await
            .map_err(|error| SessionError::Transport(format!("login failed: {error}")))?;

        Ok(stream)
    }

    /// Race the connect attempt against the connect timeout.
    async fn open(&self, address: &str, port: u16) -> Result<C::Stream, SessionError> {
        let limit = self.shared.config.connect_timeout;
        let connector = self.connector.clone();
        let host = address.to_owned();
        let mut attempt = tokio::spawn(async move { connector.connect(&host, port).await });

        match tokio::time::timeout(limit, &mut attempt).await {
            Ok(Ok(Ok(stream))) => Ok(stream),
            Ok(Ok(Err(error))) => Err(error.into()),
            Ok(Err(join_error)) => Err(SessionError::Transport(join_error.to_string())),
            Err(_) => {
                match self.shared.config.abandoned_connect {
                    AbandonPolicy::Abort => attempt.abort(),
                    AbandonPolicy::Discard => {
                        tokio::spawn(async move {
                            if let Ok(Ok(stream)) = attempt.await {
                                tracing::debug!("discarding late connection");
                                drop(stream);
                            }
                        });
                    },
                }
                Err(SessionError::ConnectTimeout { after: limit })
            },
        }
    }

    /// Tear down the current connection.
    ///
    /// Sends a best-effort `LOGOUT`, closes the transport and emits
    /// `StatusChanged(Disconnected)` and the disconnect notice. Returns false
    /// without emitting anything if there was no connection to tear down.
    pub async fn disconnect(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        let generation = inner.lifecycle.generation();
        self.shared.shut_down_locked(&mut inner, generation, Cause::Requested).await
    }

    /// Validate, encode and write one command.
    ///
    /// # Errors
    ///
    /// - `Validation` if the command would be malformed on the wire
    /// - `InvalidState` unless connected
    /// - `Transport` if the write fails; the connection is torn down
    pub async fn send(&self, command: OutboundCommand) -> Result<(), SessionError> {
        send::validate(&command)?;

        let mut inner = self.shared.inner.lock().await;
        let state = inner.lifecycle.state();
        let generation = inner.lifecycle.generation();

        let Some(link) = inner.link.as_mut() else {
            return Err(SessionError::InvalidState { state, operation: "send" });
        };

        let written =
            send::write_command(&mut link.writer, &command, self.shared.config.write_timeout).await;

        match written {
            Ok(()) => {
                tracing::trace!(tag = command.tag(), "sent");
                Ok(())
            },
            Err(error) => {
                tracing::warn!(tag = command.tag(), %error, "send failed");
                let reason = error.to_string();
                self.shared
                    .shut_down_locked(&mut inner, generation, Cause::WriteFailed(reason.clone()))
                    .await;
                Err(SessionError::Transport(reason))
            },
        }
    }

    /// Send a public chat message.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_chat(&self, text: &str) -> Result<(), SessionError> {
        self.send(OutboundCommand::Chat { text: text.to_owned() }).await
    }

    /// Send a private message to `target`.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_private(&self, target: &str, text: &str) -> Result<(), SessionError> {
        self.send(OutboundCommand::Private { target: target.to_owned(), text: text.to_owned() })
            .await
    }
}

impl<C: Connector> Drop for Session<C> {
    fn drop(&mut self) {
        // Stop the receive loop so it releases the shared state and the socket.
        if let Ok(inner) = self.shared.inner.try_lock()
            && let Some(link) = &inner.link
        {
            link.cancel.cancel();
        }
    }
}

/// Text used in the connection-failure notice.
fn failure_reason(error: &SessionError) -> String {
    match error {
        SessionError::ConnectTimeout { .. } => "Connection timeout".to_string(),
        SessionError::Transport(reason) => reason.clone(),
        other => other.to_string(),
    }
}
