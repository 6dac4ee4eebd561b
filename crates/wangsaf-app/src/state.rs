//! Observable application state types.
//!
//! These structures are the view model: what a frontend needs to draw the
//! transcript, independent of how the session produced it.

use std::fmt;

use chrono::NaiveTime;

/// Source of transcript timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Local wall-clock time.
    #[default]
    Local,
    /// Always the same time. Used by tests and simulation.
    Fixed(NaiveTime),
}

impl Clock {
    /// Current time of day.
    pub fn now(self) -> NaiveTime {
        match self {
            Self::Local => chrono::Local::now().time(),
            Self::Fixed(time) => time,
        }
    }
}

/// What a transcript line says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Public chat message.
    Chat {
        /// Author.
        sender: String,
        /// Body.
        text: String,
    },
    /// Private message addressed to us.
    Private {
        /// Author.
        sender: String,
        /// Body.
        text: String,
    },
    /// Informational notice.
    System(String),
    /// Error notice.
    Error(String),
}

/// One line of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Time the line was added.
    pub time: NaiveTime,
    /// Content.
    pub kind: LineKind,
}

impl ChatLine {
    /// Line stamped at `time`.
    pub fn new(time: NaiveTime, kind: LineKind) -> Self {
        Self { time, kind }
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self.time.format("%H:%M");
        match &self.kind {
            LineKind::Chat { sender, text } => write!(f, "[{stamp}] {sender}: {text}"),
            LineKind::Private { sender, text } => write!(f, "[{stamp}] [PM from {sender}]: {text}"),
            LineKind::System(text) => write!(f, "[{stamp}] System: {text}"),
            LineKind::Error(text) => write!(f, "[{stamp}] Error: {text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, min, 0).unwrap()
    }

    #[test]
    fn lines_render_with_zero_padded_time() {
        let chat = ChatLine::new(at(9, 5), LineKind::Chat {
            sender: "bob".into(),
            text: "hi".into(),
        });
        let private = ChatLine::new(at(14, 30), LineKind::Private {
            sender: "carol".into(),
            text: "psst".into(),
        });
        let system = ChatLine::new(at(0, 0), LineKind::System("Disconnected from server".into()));
        let error = ChatLine::new(at(23, 59), LineKind::Error("Not connected to server".into()));

        assert_eq!(chat.to_string(), "[09:05] bob: hi");
        assert_eq!(private.to_string(), "[14:30] [PM from carol]: psst");
        assert_eq!(system.to_string(), "[00:00] System: Disconnected from server");
        assert_eq!(error.to_string(), "[23:59] Error: Not connected to server");
    }

    #[test]
    fn fixed_clock_is_stable() {
        let clock = Clock::Fixed(at(12, 0));
        assert_eq!(clock.now(), clock.now());
    }
}
