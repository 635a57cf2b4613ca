//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define narrow store contracts used by the pairing workflow: roster,
//!   history, next-pairing assignment and notification outbox.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Roster writes enforce `Participant::validate()` before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::participant::ParticipantValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod assignment_repo;
pub mod history_repo;
pub mod outbox_repo;
pub mod roster_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ParticipantValidationError),
    Db(DbError),
    NotFound(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ParticipantValidationError> for RepoError {
    fn from(value: ParticipantValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
