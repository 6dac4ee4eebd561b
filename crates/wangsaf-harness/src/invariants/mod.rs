//! Roster and status properties checked across chat clients.
//!
//! Each check looks at what the clients' [`App`]s show: their status and the
//! users they list as online. A [`SystemSnapshot`] captures that view for one
//! or more clients, and an [`InvariantRegistry`] runs every registered
//! [`Invariant`] over it.
//!
//! Two registries are provided. [`InvariantRegistry::standard()`] holds after
//! every event a client handles. [`InvariantRegistry::settled()`] adds checks
//! that only hold once every roster broadcast has been delivered, so it is
//! for quiet points in a test, after the clients have caught up.
//!
//! ```ignore
//! let snapshot = SystemSnapshot::from_apps([&alice, &bob]);
//! InvariantRegistry::settled().assert_all(&snapshot, "after join");
//! ```
//!
//! [`App`]: wangsaf_app::App

mod checks;
mod snapshot;

pub use checks::{RosterAgreement, RosterHasNoDuplicates, RosterOnlyWhileConnected, SelfInRoster};
pub use snapshot::{ClientSnapshot, SystemSnapshot};

/// Outcome of one check.
pub type InvariantResult = Result<(), Violation>;

/// A client whose view breaks a check.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Check that failed.
    pub invariant: &'static str,
    /// Username of the offending client.
    pub client: String,
    /// What the client shows.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.invariant, self.client, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property of what chat clients show.
pub trait Invariant: Send + Sync {
    /// Snake-case name used in violation reports.
    fn name(&self) -> &'static str;

    /// Check every client in `state`, reporting the first one in breach.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Checks run together against one snapshot.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Checks that hold after every event a client handles:
    /// - [`RosterOnlyWhileConnected`]: no roster unless connected
    /// - [`RosterHasNoDuplicates`]: each user listed once
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(RosterOnlyWhileConnected);
        registry.add(RosterHasNoDuplicates);
        registry
    }

    /// Standard checks plus those that need every roster broadcast delivered:
    /// - [`SelfInRoster`]: a connected client sees itself online
    /// - [`RosterAgreement`]: connected clients see the same roster
    pub fn settled() -> Self {
        let mut registry = Self::standard();
        registry.add(SelfInRoster);
        registry.add(RosterAgreement);
        registry
    }

    /// Register another check.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check against `state`.
    ///
    /// # Errors
    ///
    /// One violation per failing check, in registration order.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check, failing the test on any violation.
    ///
    /// `context` names the point in the scenario, such as `"after join"`.
    ///
    /// # Panics
    ///
    /// If any check fails.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("roster invariants broken {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use wangsaf_client::Status;

    use super::*;

    #[test]
    fn registries_have_invariants() {
        assert_eq!(InvariantRegistry::standard().len(), 2);
        assert_eq!(InvariantRegistry::settled().len(), 4);
        assert!(InvariantRegistry::new().is_empty());
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::settled();
        let snapshot = SystemSnapshot::empty();
        assert!(registry.check_all(&snapshot).is_ok());
    }

    #[test]
    fn violation_names_the_client() {
        let snapshot = SystemSnapshot::single(
            ClientSnapshot::new("alice", Status::Failed).with_users(["alice", "alice"]),
        );

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();

        let reports: Vec<_> = violations.iter().map(ToString::to_string).collect();
        assert_eq!(reports, [
            r#"roster_only_while_connected [alice]: Failed but shows ["alice", "alice"]"#,
            "roster_has_no_duplicates [alice]: lists alice twice",
        ]);
    }
}
