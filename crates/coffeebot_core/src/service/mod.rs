//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls and the pairing engine into the generate and
//!   dispatch cycles.
//! - Keep the CLI decoupled from storage details.

pub mod message;
pub mod pairing_service;
