//! Scripted frontend for deterministic runtime tests.
//!
//! Implements [`Frontend`] so the same [`wangsaf_app::Runtime`] orchestration
//! code runs in both the CLI and simulation tests. The script interleaves
//! user input with waits on App state, since session notifications arrive
//! asynchronously.

use std::collections::VecDeque;

use wangsaf_app::{App, AppEvent, Frontend};

use crate::invariants::{InvariantRegistry, SystemSnapshot};

/// Error type for the scripted frontend.
#[derive(Debug)]
pub struct ScriptError(pub String);

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScriptError: {}", self.0)
    }
}

impl std::error::Error for ScriptError {}

type Condition = Box<dyn Fn(&App) -> bool + Send + Sync>;

enum Step {
    /// Hand this event to the runtime.
    Input(AppEvent),
    /// Hold input until a render shows the App in this state.
    Until(Condition),
}

/// What one render showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Window caption.
    pub caption: String,
    /// Roster caption.
    pub users_caption: String,
    /// Transcript lines as displayed.
    pub transcript: Vec<String>,
}

impl RenderedFrame {
    fn capture(app: &App) -> Self {
        Self {
            caption: app.caption(),
            users_caption: app.users_caption(),
            transcript: app.transcript().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Frontend that replays a fixed script and records every render.
///
/// Input ends, and the runtime shuts down, once the script is exhausted.
#[derive(Default)]
pub struct ScriptedFrontend {
    steps: VecDeque<Step>,
    frames: Vec<RenderedFrame>,
    invariants: Option<InvariantRegistry>,
}

impl ScriptedFrontend {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `registry` on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Append an input event.
    #[must_use]
    pub fn input(mut self, event: AppEvent) -> Self {
        self.steps.push_back(Step::Input(event));
        self
    }

    /// Append a submitted input line.
    #[must_use]
    pub fn submit(self, line: &str) -> Self {
        self.input(AppEvent::Submit(line.to_owned()))
    }

    /// Hold further input until a render satisfies `condition`.
    #[must_use]
    pub fn until<P>(mut self, condition: P) -> Self
    where
        P: Fn(&App) -> bool + Send + Sync + 'static,
    {
        self.steps.push_back(Step::Until(Box::new(condition)));
        self
    }

    /// Every render so far, oldest first.
    pub fn frames(&self) -> &[RenderedFrame] {
        &self.frames
    }

    /// The most recent render.
    pub fn last_frame(&self) -> Option<&RenderedFrame> {
        self.frames.last()
    }

    /// Whether every step has been consumed.
    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Frontend for ScriptedFrontend {
    type Error = ScriptError;

    async fn next_input(&mut self) -> Result<Option<AppEvent>, ScriptError> {
        let waiting = matches!(self.steps.front(), Some(Step::Until(_)));
        if waiting {
            // Resolved by `render`; the runtime is woken by session events.
            return std::future::pending().await;
        }
        match self.steps.pop_front() {
            Some(Step::Input(event)) => Ok(Some(event)),
            Some(Step::Until(_)) | None => Ok(None),
        }
    }

    fn render(&mut self, app: &App) -> Result<(), ScriptError> {
        if let Some(registry) = &self.invariants {
            let snapshot = SystemSnapshot::from_apps([app]);
            registry.check_all(&snapshot).map_err(|violations| {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                ScriptError(messages.join("; "))
            })?;
        }

        self.frames.push(RenderedFrame::capture(app));

        while let Some(Step::Until(condition)) = self.steps.front() {
            if !condition(app) {
                break;
            }
            self.steps.pop_front();
        }
        Ok(())
    }
}
