//! Terminal client for Wangsaf.
//!
//! A thin shell over [`wangsaf_app::Frontend`] that reads input lines and
//! prints the chat window as text. All orchestration logic lives in the
//! generic [`wangsaf_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod error;
pub mod terminal;

pub use args::Args;
pub use error::CliError;
pub use terminal::LineFrontend;
pub use wangsaf_app::{App, AppEvent, Frontend, Runtime};
