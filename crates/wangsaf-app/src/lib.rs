//! Application layer for Wangsaf
//!
//! Pure view-model state machine and a generic runtime that connects it to a
//! [`wangsaf_client::Session`] and a frontend. The same orchestration code runs
//! in the terminal binary and in simulation.
//!
//! # Components
//!
//! - [`App`]: view-model state machine (input, transcript, roster, status)
//! - [`Command`]: commands parsed from a submitted input line
//! - [`Frontend`]: trait for platform-specific input and rendering
//! - [`Runtime`]: orchestration loop over a session and a frontend

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod command;
mod event;
mod frontend;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, NOT_CONNECTED};
pub use command::{Command, CommandError};
pub use event::AppEvent;
pub use frontend::Frontend;
pub use input::KeyInput;
pub use runtime::Runtime;
pub use state::{ChatLine, Clock, LineKind};
