//! Session tests against a loopback TCP peer.
//!
//! Each test plays the server side by hand on a `TcpListener` and checks the
//! bytes the session writes and the events it emits.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{TcpListener, TcpStream, tcp::OwnedReadHalf, tcp::OwnedWriteHalf},
};
use wangsaf_client::{
    Connector, DISCONNECTED_NOTICE, Session, SessionConfig, SessionError, SessionEvent,
    SessionEvents, SessionState, Status, TcpConnector, ValidationError,
};

/// Counts connect attempts before delegating to TCP.
#[derive(Clone, Default)]
struct CountingConnector(Arc<AtomicUsize>);

impl CountingConnector {
    fn attempts(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Connector for CountingConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        self.0.fetch_add(1, Ordering::SeqCst);
        TcpConnector.connect(host, port).await
    }
}

/// Server side of one accepted connection.
struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn accept(listener: &TcpListener) -> Self {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, writer) = socket.into_split();
        Self { lines: BufReader::new(read).lines(), writer }
    }

    async fn next_line(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("peer read timed out")
            .unwrap()
    }

    async fn write(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }
}

async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn next_event(events: &mut SessionEvents) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event within 5s")
        .expect("event channel closed")
}

/// Connect as `username` and consume the handshake on both sides.
async fn connected(
    username: &str,
) -> (Session<CountingConnector>, SessionEvents, Peer, CountingConnector) {
    let (listener, port) = bind().await;
    let connector = CountingConnector::default();
    let (session, mut events) = Session::new(connector.clone(), SessionConfig::default());

    let (result, mut peer) =
        tokio::join!(session.connect("127.0.0.1", port, username), Peer::accept(&listener));
    result.unwrap();

    assert_eq!(peer.next_line().await.as_deref(), Some(format!("LOGIN|{username}").as_str()));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Connecting));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Connected));

    (session, events, peer, connector)
}

#[tokio::test]
async fn connect_logs_in_and_delivers_records_in_order() {
    let (session, mut events, mut peer, _) = connected("alice").await;

    assert!(session.is_connected().await);
    assert_eq!(session.username().await.as_deref(), Some("alice"));

    peer.write(b"USERLIST|alice,bob\nMESSAGE|bob|hi\n").await;

    assert_eq!(
        next_event(&mut events).await,
        SessionEvent::UserListChanged(vec!["alice".into(), "bob".into()])
    );
    assert_eq!(next_event(&mut events).await, SessionEvent::ChatMessage {
        sender: "bob".into(),
        text: "hi".into()
    });
}

#[tokio::test]
async fn record_split_across_writes_is_delivered_once() {
    let (_session, mut events, mut peer, _) = connected("alice").await;

    peer.write(b"MESS").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    peer.write(b"AGE|bob|hi\n").await;

    assert_eq!(next_event(&mut events).await, SessionEvent::ChatMessage {
        sender: "bob".into(),
        text: "hi".into()
    });
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn private_message_surfaces_sender_and_body() {
    let (_session, mut events, mut peer, _) = connected("alice").await;

    peer.write(b"PRIVATE|bob|alice|psst\nLOGIN|carol\nSYSTEM|carol joined\n").await;

    assert_eq!(next_event(&mut events).await, SessionEvent::PrivateMessage {
        sender: "bob".into(),
        text: "psst".into()
    });
    // Echoed LOGIN raises nothing.
    assert_eq!(next_event(&mut events).await, SessionEvent::SystemNotice("carol joined".into()));
}

#[tokio::test]
async fn send_writes_framed_commands() {
    let (session, _events, mut peer, _) = connected("alice").await;

    session.send_chat("hello").await.unwrap();
    session.send_private("bob", "hi there").await.unwrap();

    assert_eq!(peer.next_line().await.as_deref(), Some("MESSAGE|hello"));
    assert_eq!(peer.next_line().await.as_deref(), Some("PRIVATE|bob|hi there"));
}

#[tokio::test]
async fn invalid_send_is_rejected_without_writing() {
    let (session, _events, mut peer, _) = connected("alice").await;

    assert_eq!(
        session.send_chat("   ").await,
        Err(SessionError::Validation(ValidationError::EmptyMessage))
    );
    assert_eq!(
        session.send_chat("a|b").await,
        Err(SessionError::Validation(ValidationError::ForbiddenCharacter { field: "message" }))
    );

    session.send_chat("ok").await.unwrap();
    assert_eq!(peer.next_line().await.as_deref(), Some("MESSAGE|ok"));
    assert!(session.is_connected().await);
}

#[tokio::test]
async fn disconnect_sends_logout_and_notifies_once() {
    let (session, mut events, mut peer, _) = connected("alice").await;

    assert!(session.disconnect().await);

    assert_eq!(peer.next_line().await.as_deref(), Some("LOGOUT|"));
    assert_eq!(peer.next_line().await, None);
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Disconnected));
    assert_eq!(next_event(&mut events).await, SessionEvent::SystemNotice(DISCONNECTED_NOTICE.into()));

    // Second disconnect is a no-op.
    assert!(!session.disconnect().await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(session.state().await, SessionState::Disconnected);
    assert_eq!(session.username().await, None);
}

#[tokio::test]
async fn peer_close_disconnects_without_error() {
    let (session, mut events, peer, _) = connected("alice").await;

    drop(peer);

    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Disconnected));
    assert_eq!(next_event(&mut events).await, SessionEvent::SystemNotice(DISCONNECTED_NOTICE.into()));
    assert_eq!(session.state().await, SessionState::Disconnected);
}

#[tokio::test]
async fn send_while_disconnected_is_invalid_state() {
    let (session, mut events) = Session::tcp(SessionConfig::default());

    assert_eq!(
        session.send_chat("hello").await,
        Err(SessionError::InvalidState { state: SessionState::Disconnected, operation: "send" })
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn blank_username_never_opens_transport() {
    let connector = CountingConnector::default();
    let (session, mut events) = Session::new(connector.clone(), SessionConfig::default());

    let result = session.connect("127.0.0.1", 1, "   ").await;

    assert_eq!(result, Err(SessionError::Validation(ValidationError::EmptyUsername)));
    assert_eq!(connector.attempts(), 0);
    assert_eq!(session.state().await, SessionState::Disconnected);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn connect_while_connected_changes_nothing() {
    let (session, mut events, _peer, connector) = connected("alice").await;

    let result = session.connect("127.0.0.1", 1, "bob").await;

    assert_eq!(
        result,
        Err(SessionError::InvalidState { state: SessionState::Connected, operation: "connect" })
    );
    assert_eq!(connector.attempts(), 1);
    assert_eq!(session.username().await.as_deref(), Some("alice"));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn refused_connect_fails_then_retry_succeeds() {
    let (listener, port) = bind().await;
    drop(listener);

    let (session, mut events) = Session::tcp(SessionConfig::default());

    let result = session.connect("127.0.0.1", port, "alice").await;
    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Connecting));
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::ErrorNotice(text) if text.starts_with("Connection error: ")
    ));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Failed));
    assert_eq!(session.state().await, SessionState::Disconnected);

    let (listener, port) = bind().await;
    let (result, mut peer) =
        tokio::join!(session.connect("127.0.0.1", port, "alice"), Peer::accept(&listener));
    result.unwrap();

    assert_eq!(peer.next_line().await.as_deref(), Some("LOGIN|alice"));
    assert!(session.is_connected().await);
}

#[tokio::test]
async fn reconnect_after_disconnect_uses_fresh_connection() {
    let (session, mut events, _old_peer, _) = connected("alice").await;
    assert!(session.disconnect().await);
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Disconnected));
    assert_eq!(next_event(&mut events).await, SessionEvent::SystemNotice(DISCONNECTED_NOTICE.into()));

    let (listener, port) = bind().await;
    let (result, mut peer) =
        tokio::join!(session.connect("127.0.0.1", port, "bob"), Peer::accept(&listener));
    result.unwrap();

    assert_eq!(peer.next_line().await.as_deref(), Some("LOGIN|bob"));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Connecting));
    assert_eq!(next_event(&mut events).await, SessionEvent::StatusChanged(Status::Connected));

    peer.write(b"SYSTEM|welcome bob\n").await;
    assert_eq!(next_event(&mut events).await, SessionEvent::SystemNotice("welcome bob".into()));
}
