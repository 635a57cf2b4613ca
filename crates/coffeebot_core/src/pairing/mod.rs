//! Pairing core: eligibility, canonical keys and the partition engine.
//!
//! # Responsibility
//! - Turn a roster snapshot plus history into disjoint groups of 2-3.
//! - Keep every algorithmic piece pure and storage-agnostic.
//!
//! # Invariants
//! - Nothing in this module performs I/O other than `log` diagnostics.
//! - Randomness always flows through `random::RandomSource`.

pub mod dedup;
pub mod eligibility;
pub mod engine;
pub mod key;
pub mod random;
