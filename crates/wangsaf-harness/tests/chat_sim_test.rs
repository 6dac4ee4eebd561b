//! Multi-client chat over turmoil's simulated network.
//!
//! Every client runs a real [`Session`] against the reference [`ChatServer`]
//! and feeds its notifications into an [`App`], checking App invariants after
//! each one.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Each transcript reads as that user's chat window would
//! - Settled invariants hold across all clients
//! - The server saw exactly the commands the clients sent

use std::time::Duration;

use chrono::NaiveTime;
use turmoil::net::TcpListener;
use wangsaf_app::{App, Clock};
use wangsaf_client::{Session, SessionConfig, SessionEvents, Status};
use wangsaf_harness::{ChatServer, InvariantRegistry, SimConnector, SystemSnapshot};
use wangsaf_proto::OutboundCommand;

const PORT: u16 = 8888;

fn start_server(sim: &mut turmoil::Sim<'_>, server: &ChatServer) {
    let server = server.clone();
    sim.host("server", move || {
        let server = server.clone();
        async move {
            let listener = TcpListener::bind("0.0.0.0:8888").await?;
            server.run_sim(listener).await?;
            Ok(())
        }
    });
}

/// One user: a live session feeding an App.
struct User {
    app: App,
    session: Session<SimConnector>,
    events: SessionEvents,
}

impl User {
    async fn join(name: &str) -> Self {
        let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let app = App::new("server".into(), PORT, name.into()).with_clock(Clock::Fixed(time));
        let (session, events) = Session::new(SimConnector, SessionConfig::default());
        session.connect("server", PORT, name).await.unwrap();
        Self { app, session, events }
    }

    /// Apply notifications until `condition` holds.
    async fn until(&mut self, condition: impl Fn(&App) -> bool) {
        let registry = InvariantRegistry::standard();
        while !condition(&self.app) {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for notification")
                .expect("event channel closed");
            self.app.handle(event.into());
            registry.assert_all(&SystemSnapshot::from_apps([&self.app]), self.app.username());
        }
    }

    async fn until_roster(&mut self, users: &[&str]) {
        self.until(|app| app.users() == users).await;
    }

    async fn until_line(&mut self, line: &str) {
        self.until(|app| app.transcript().iter().any(|l| l.to_string() == line)).await;
    }

    fn transcript(&self) -> Vec<String> {
        self.app.transcript().iter().map(ToString::to_string).collect()
    }
}

#[test]
fn chat_between_two_users() {
    let mut sim = turmoil::Builder::new().build();
    let server = ChatServer::new();
    start_server(&mut sim, &server);

    let observer = server.clone();
    sim.client("users", async move {
        let mut alice = User::join("alice").await;
        alice.until_roster(&["alice"]).await;

        let mut bob = User::join("bob").await;
        bob.until_roster(&["alice", "bob"]).await;
        alice.until_roster(&["alice", "bob"]).await;
        InvariantRegistry::settled()
            .assert_all(&SystemSnapshot::from_apps([&alice.app, &bob.app]), "after join");

        alice.session.send_chat("hi bob").await?;
        alice.until_line("[12:00] alice: hi bob").await;
        bob.until_line("[12:00] alice: hi bob").await;

        bob.session.send_private("alice", "psst").await?;
        alice.until_line("[12:00] [PM from bob]: psst").await;

        assert!(alice.session.disconnect().await);
        alice.until(|app| app.status() == Status::Disconnected).await;
        alice.until_line("[12:00] System: Disconnected from server").await;
        bob.until_roster(&["bob"]).await;

        // Oracle: each window
        assert_eq!(alice.transcript(), vec![
            "[12:00] System: alice joined the chat",
            "[12:00] System: bob joined the chat",
            "[12:00] alice: hi bob",
            "[12:00] [PM from bob]: psst",
            "[12:00] System: Disconnected from server",
        ]);
        assert_eq!(bob.transcript(), vec![
            "[12:00] System: bob joined the chat",
            "[12:00] alice: hi bob",
            "[12:00] System: alice left the chat",
        ]);

        // Oracle: settled state
        InvariantRegistry::settled()
            .assert_all(&SystemSnapshot::from_apps([&alice.app, &bob.app]), "after leave");
        assert_eq!(observer.online(), vec!["bob".to_string()]);

        // Oracle: server input
        let alice_sent: Vec<_> = observer
            .received()
            .into_iter()
            .filter(|(sender, _)| sender.as_deref() == Some("alice"))
            .map(|(_, command)| command)
            .collect();
        assert_eq!(alice_sent, vec![
            OutboundCommand::Chat { text: "hi bob".into() },
            OutboundCommand::Logout,
        ]);

        bob.session.disconnect().await;
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn users_on_separate_hosts() {
    let mut sim = turmoil::Builder::new().build();
    let server = ChatServer::new();
    start_server(&mut sim, &server);

    sim.client("alice", async {
        let mut alice = User::join("alice").await;
        alice.until(|app| app.users().iter().any(|u| u == "bob")).await;
        alice.until_line("[12:00] bob: hello alice").await;
        alice.session.send_chat("hi bob").await?;
        alice.until_line("[12:00] alice: hi bob").await;
        alice.session.disconnect().await;
        Ok(())
    });

    sim.client("bob", async {
        let mut bob = User::join("bob").await;
        bob.until(|app| app.users().iter().any(|u| u == "alice")).await;
        bob.session.send_chat("hello alice").await?;
        bob.until_line("[12:00] alice: hi bob").await;
        bob.until_roster(&["bob"]).await;
        bob.until_line("[12:00] System: alice left the chat").await;
        bob.session.disconnect().await;
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn private_to_absent_user_reports_error() {
    let mut sim = turmoil::Builder::new().build();
    let server = ChatServer::new();
    start_server(&mut sim, &server);

    sim.client("alice", async {
        let mut alice = User::join("alice").await;
        alice.until_roster(&["alice"]).await;

        alice.session.send_private("nobody", "hello?").await?;
        alice.until_line("[12:00] Error: User nobody is not online").await;

        assert_eq!(alice.app.status(), Status::Connected);
        alice.session.disconnect().await;
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn server_kick_ends_session_without_error() {
    let mut sim = turmoil::Builder::new().build();
    let server = ChatServer::new();
    start_server(&mut sim, &server);

    let admin = server.clone();
    sim.client("alice", async move {
        let mut alice = User::join("alice").await;
        alice.until_roster(&["alice"]).await;

        assert!(admin.kick("alice"));
        alice.until(|app| app.status() == Status::Disconnected).await;
        alice.until_line("[12:00] System: Disconnected from server").await;

        assert_eq!(alice.transcript(), vec![
            "[12:00] System: alice joined the chat",
            "[12:00] System: You were removed from the chat",
            "[12:00] System: Disconnected from server",
        ]);
        assert!(alice.app.users().is_empty());
        Ok(())
    });

    sim.run().expect("simulation failed");
}

#[test]
fn taken_username_is_refused() {
    let mut sim = turmoil::Builder::new().build();
    let server = ChatServer::new();
    start_server(&mut sim, &server);

    sim.client("users", async {
        let mut first = User::join("alice").await;
        first.until_roster(&["alice"]).await;

        let mut second = User::join("alice").await;
        second.until(|app| app.status() == Status::Disconnected).await;
        second.until_line("[12:00] System: Disconnected from server").await;

        assert!(second.transcript().contains(&"[12:00] Error: Username already taken".to_string()));
        assert_eq!(first.app.users(), ["alice".to_string()]);

        first.session.disconnect().await;
        Ok(())
    });

    sim.run().expect("simulation failed");
}
