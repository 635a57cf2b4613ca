//! Domain model for roster entries.
//!
//! # Responsibility
//! - Define the participant record consumed by eligibility and pairing.
//!
//! # Invariants
//! - Participants are keyed by email; nothing else identifies them.
//! - Model values are snapshots; no long-lived mutable state lives here.

pub mod participant;
