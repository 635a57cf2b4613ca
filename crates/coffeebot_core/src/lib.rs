//! Core domain logic for Coffeebot.
//! This crate is the single source of truth for pairing invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod pairing;
pub mod repo;
pub mod service;

pub use config::{CoffeebotConfig, ConfigError, NotifyMode};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::participant::{Participant, ParticipantRow, ParticipantValidationError};
pub use notify::{LogNotifier, Notifier, NotifyError, OutboxNotifier, OutgoingMessage};
pub use pairing::dedup::uniqify;
pub use pairing::eligibility::{filter_eligible, iso_week_number, should_suppress};
pub use pairing::engine::{
    random_unique_pairing, random_unique_pairing_with, PairingOptions, PairingOutcome,
    PartnerDraw, MAX_PAIRING_TRIES,
};
pub use pairing::key::{decode_key, encode_key, KEY_SEPARATOR};
pub use pairing::random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use repo::assignment_repo::{AssignmentRepository, SqliteAssignmentRepository};
pub use repo::history_repo::{HistoryEntry, HistoryRepository, SqliteHistoryRepository};
pub use repo::outbox_repo::{OutboxRecord, OutboxRepository, SqliteOutboxRepository};
pub use repo::roster_repo::{RosterRepository, SqliteRosterRepository};
pub use repo::{RepoError, RepoResult};
pub use service::message::compose_message;
pub use service::pairing_service::{
    DispatchReport, GenerateReport, PairingService, PairingServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
