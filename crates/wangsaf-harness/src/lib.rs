//! Deterministic simulation harness for Wangsaf chat testing.
//!
//! Turmoil-based connectors and a reference chat server for deterministic,
//! reproducible testing of the session engine and the application runtime
//! under simulated network conditions.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the App
//! invariants that hold at every step, and [`InvariantRegistry::settled()`]
//! once the network is quiet.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connectors;
pub mod fragment;
pub mod invariants;
pub mod scripted;
pub mod sim_server;

pub use connectors::{SimConnector, StallConnector};
pub use fragment::Fragmenter;
pub use invariants::{
    ClientSnapshot, Invariant, InvariantRegistry, InvariantResult, RosterAgreement,
    RosterHasNoDuplicates, RosterOnlyWhileConnected, SelfInRoster, SystemSnapshot, Violation,
};
pub use scripted::{RenderedFrame, ScriptError, ScriptedFrontend};
pub use sim_server::{ChatServer, relay};
