//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Connect to a chat server.
    Connect {
        /// Host name or IP address.
        address: String,
        /// TCP port.
        port: u16,
        /// Name to log in as.
        username: String,
    },

    /// Tear down the current connection.
    Disconnect,

    /// Send a public chat message.
    SendChat {
        /// Message body.
        text: String,
    },

    /// Send a private message.
    SendPrivate {
        /// Recipient username.
        target: String,
        /// Message body.
        text: String,
    },
}
