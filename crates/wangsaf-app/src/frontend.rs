//! Frontend trait for abstracting user-facing I/O.
//!
//! The [`Frontend`] trait decouples the application runtime from a specific
//! terminal or window system. Each frontend supplies input events and draws
//! the [`App`], while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use crate::{App, AppEvent};

/// Abstracts user-facing I/O for the application runtime.
///
/// # Implementations
///
/// - **CLI**: line-based stdin input, transcript printed to stdout
/// - **Simulation**: scripted input, renders captured for assertions
pub trait Frontend: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next user input.
    ///
    /// Returns `None` once input is exhausted, which quits the runtime. The
    /// runtime races this against session notifications, so the future must
    /// be safe to drop before it completes.
    fn next_input(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;
}
