//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries, enabling
/// deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit the input line).
    Enter,
    /// Backspace key (delete the last character).
    Backspace,
    /// Escape key (quit).
    Esc,
}
