//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: view-model state machine
//! - [`Session`]: the chat connection
//! - [`Frontend`]: platform-specific input and rendering
//!
//! Session notifications are consumed here, on the runtime's own task, so
//! the session never calls into UI code.

use wangsaf_client::{Connector, Session, SessionConfig, SessionError, SessionEvents};

use crate::{App, AppAction, AppEvent, Frontend, app::NOT_CONNECTED};

/// What woke the event loop.
enum Wake {
    Input(Option<AppEvent>),
    Session(AppEvent),
}

/// How a connect attempt driven by the runtime ended.
enum Connecting {
    /// The attempt finished; actions raised meanwhile run afterwards.
    Settled(Result<(), SessionError>, Vec<AppAction>),
    /// The user quit, abandoning the attempt.
    Quit,
}

/// Generic runtime that orchestrates App, Session, and Frontend.
///
/// # Type Parameters
///
/// - `C`: transport connector for the session
/// - `F`: platform-specific frontend
pub struct Runtime<C, F>
where
    C: Connector,
    F: Frontend,
{
    app: App,
    session: Session<C>,
    events: SessionEvents,
    frontend: F,
}

impl<C, F> Runtime<C, F>
where
    C: Connector,
    F: Frontend,
{
    /// Create a runtime with a fresh session over `connector`.
    pub fn new(app: App, connector: C, config: SessionConfig, frontend: F) -> Self {
        let (session, events) = Session::new(connector, config);
        Self { app, session, events, frontend }
    }

    /// Run the main event loop until the user quits or input ends.
    ///
    /// Each cycle waits for either user input or a session notification,
    /// feeds it to the App, and executes the resulting actions. On exit the
    /// session is disconnected and the final state rendered.
    ///
    /// Returns the final App state.
    ///
    /// # Errors
    ///
    /// Returns an error if the frontend fails.
    pub async fn run(mut self) -> Result<App, F::Error> {
        self.frontend.render(&self.app)?;

        loop {
            let wake = tokio::select! {
                input = self.frontend.next_input() => Wake::Input(input?),
                Some(event) = self.events.recv() => Wake::Session(AppEvent::Session(event)),
            };

            let event = match wake {
                Wake::Input(Some(event)) | Wake::Session(event) => event,
                Wake::Input(None) => {
                    tracing::debug!("input closed");
                    break;
                },
            };

            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                break;
            }
        }

        self.shutdown().await?;
        Ok(self.app)
    }

    /// Connect using the App's configured server and username.
    ///
    /// # Errors
    ///
    /// Returns an error if the frontend fails.
    pub async fn connect(&mut self) -> Result<(), F::Error> {
        let actions = self.app.connect();
        self.process_actions(actions).await?;
        Ok(())
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, F::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                let outcome = match action {
                    AppAction::Render => {
                        self.frontend.render(&self.app)?;
                        continue;
                    },
                    AppAction::Quit => return Ok(true),
                    AppAction::Connect { address, port, username } => {
                        match self.drive_connect(&address, port, &username).await? {
                            Connecting::Settled(outcome, deferred) => {
                                pending_actions.extend(deferred);
                                outcome
                            },
                            Connecting::Quit => return Ok(true),
                        }
                    },
                    AppAction::Disconnect => {
                        self.session.disconnect().await;
                        Ok(())
                    },
                    AppAction::SendChat { text } => self.session.send_chat(&text).await,
                    AppAction::SendPrivate { target, text } => {
                        self.session.send_private(&target, &text).await
                    },
                };

                if let Err(error) = outcome
                    && let Some(message) = rejection_message(&error)
                {
                    pending_actions.extend(self.app.handle(AppEvent::Error { message }));
                }
            }
        }
        Ok(false)
    }

    /// Connect while still rendering notifications and reading input.
    ///
    /// The handshake may take up to the connect timeout. Meanwhile the
    /// `Connecting` status is shown and a quit abandons the attempt; other
    /// actions wait until the attempt settles.
    async fn drive_connect(
        &mut self,
        address: &str,
        port: u16,
        username: &str,
    ) -> Result<Connecting, F::Error> {
        let Self { app, session, events, frontend } = self;
        let attempt = session.connect(address, port, username);
        tokio::pin!(attempt);

        let mut deferred = Vec::new();
        loop {
            let actions = tokio::select! {
                outcome = &mut attempt => return Ok(Connecting::Settled(outcome, deferred)),
                Some(event) = events.recv() => app.handle(AppEvent::Session(event)),
                input = frontend.next_input() => match input? {
                    Some(event) => app.handle(event),
                    None => return Ok(Connecting::Quit),
                },
            };

            for action in actions {
                match action {
                    AppAction::Render => frontend.render(app)?,
                    AppAction::Quit => {
                        tracing::debug!("connect abandoned");
                        return Ok(Connecting::Quit);
                    },
                    other => deferred.push(other),
                }
            }
        }
    }

    /// Disconnect and apply the final notifications.
    async fn shutdown(&mut self) -> Result<(), F::Error> {
        let mut changed = self.session.disconnect().await;
        while let Ok(event) = self.events.try_recv() {
            self.app.handle(AppEvent::Session(event));
            changed = true;
        }
        if changed {
            self.frontend.render(&self.app)?;
        }
        Ok(())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Get a mutable reference to the Frontend
    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }
}

/// Message for a session error that produced no notice of its own.
///
/// Network failures already arrive on the event channel as error notices.
fn rejection_message(error: &SessionError) -> Option<String> {
    if error.is_transient() {
        return None;
    }
    match error {
        SessionError::Validation(validation) => Some(validation.to_string()),
        SessionError::InvalidState { operation: "send", .. } => Some(NOT_CONNECTED.to_string()),
        other => Some(other.to_string()),
    }
}
