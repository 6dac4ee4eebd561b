//! Roster checks.

use std::collections::HashSet;

use wangsaf_client::Status;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// A client that is not connected shows nobody online.
///
/// The roster is cleared on every status change away from `Connected`, and
/// roster updates arriving outside a connection are ignored.
pub struct RosterOnlyWhileConnected;

impl Invariant for RosterOnlyWhileConnected {
    fn name(&self) -> &'static str {
        "roster_only_while_connected"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.status != Status::Connected && !client.users.is_empty() {
                return Err(Violation {
                    invariant: self.name(),
                    client: client.username.clone(),
                    message: format!("{:?} but shows {:?}", client.status, client.users),
                });
            }
        }
        Ok(())
    }
}

/// No username appears twice in a roster.
pub struct RosterHasNoDuplicates;

impl Invariant for RosterHasNoDuplicates {
    fn name(&self) -> &'static str {
        "roster_has_no_duplicates"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            if let Some(duplicate) = client.users.iter().find(|user| !seen.insert(*user)) {
                return Err(Violation {
                    invariant: self.name(),
                    client: client.username.clone(),
                    message: format!("lists {duplicate} twice"),
                });
            }
        }
        Ok(())
    }
}

/// A connected client sees itself online.
///
/// Only holds once the roster broadcast for its own login has arrived.
pub struct SelfInRoster;

impl Invariant for SelfInRoster {
    fn name(&self) -> &'static str {
        "self_in_roster"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.status == Status::Connected && !client.users.contains(&client.username) {
                return Err(Violation {
                    invariant: self.name(),
                    client: client.username.clone(),
                    message: format!("missing from {:?}", client.users),
                });
            }
        }
        Ok(())
    }
}

/// Connected clients agree on who is online.
///
/// Every roster broadcast reaches every logged-in client, so once the
/// network is quiet all connected clients show the same list.
pub struct RosterAgreement;

impl Invariant for RosterAgreement {
    fn name(&self) -> &'static str {
        "roster_agreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut connected =
            state.clients.iter().filter(|client| client.status == Status::Connected);
        let Some(first) = connected.next() else {
            return Ok(());
        };

        for other in connected {
            if other.users != first.users {
                return Err(Violation {
                    invariant: self.name(),
                    client: other.username.clone(),
                    message: format!(
                        "sees {:?} but {} sees {:?}",
                        other.users, first.username, first.users
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::ClientSnapshot;

    fn connected(name: &str, users: &[&str]) -> ClientSnapshot {
        ClientSnapshot::new(name, Status::Connected).with_users(users.iter().copied())
    }

    #[test]
    fn roster_while_disconnected_is_violation() {
        let snapshot = SystemSnapshot::single(
            ClientSnapshot::new("alice", Status::Disconnected).with_users(["alice"]),
        );
        let violation = RosterOnlyWhileConnected.check(&snapshot).unwrap_err();
        assert_eq!(violation.invariant, "roster_only_while_connected");
    }

    #[test]
    fn duplicate_user_is_violation() {
        let snapshot = SystemSnapshot::single(connected("alice", &["alice", "bob", "alice"]));
        assert!(RosterHasNoDuplicates.check(&snapshot).is_err());
    }

    #[test]
    fn missing_self_is_violation() {
        let snapshot = SystemSnapshot::single(connected("alice", &["bob"]));
        assert!(SelfInRoster.check(&snapshot).is_err());
    }

    #[test]
    fn disagreement_ignores_disconnected_clients() {
        let mut snapshot = SystemSnapshot::single(connected("alice", &["alice", "bob"]));
        snapshot.add_client(connected("bob", &["alice", "bob"]));
        snapshot.add_client(ClientSnapshot::new("carol", Status::Failed));
        assert!(RosterAgreement.check(&snapshot).is_ok());

        snapshot.add_client(connected("dave", &["dave"]));
        assert!(RosterAgreement.check(&snapshot).is_err());
    }
}
