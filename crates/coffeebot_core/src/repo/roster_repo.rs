//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store signed-up participants in signup order.
//! - Provide the raw roster snapshot that eligibility filtering consumes.
//!
//! # Invariants
//! - `email` is the primary key; upsert replaces every other column.
//! - List order is signup order, so a shuffled cycle starts from a stable base.

use crate::model::participant::Participant;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PARTICIPANT_SELECT_SQL: &str = "SELECT
    email,
    name,
    timezone,
    suppress_until,
    cadence,
    topics
FROM participants";

/// Repository interface for roster operations.
pub trait RosterRepository {
    /// Returns every participant in signup order.
    fn list_participants(&self) -> RepoResult<Vec<Participant>>;
    /// Gets one participant by email.
    fn get_participant(&self, email: &str) -> RepoResult<Option<Participant>>;
    /// Inserts a participant or replaces the entry with the same email.
    fn upsert_participant(&self, participant: &Participant) -> RepoResult<()>;
    /// Removes a participant by email.
    fn remove_participant(&self, email: &str) -> RepoResult<()>;
    /// Sets or clears the suppression date of one participant.
    fn set_suppress_until(&self, email: &str, suppress_until: Option<&str>) -> RepoResult<()>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn list_participants(&self) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARTICIPANT_SELECT_SQL} ORDER BY signed_up_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();

        while let Some(row) = rows.next()? {
            participants.push(parse_participant_row(row)?);
        }

        Ok(participants)
    }

    fn get_participant(&self, email: &str) -> RepoResult<Option<Participant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARTICIPANT_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_participant_row(row)?));
        }

        Ok(None)
    }

    fn upsert_participant(&self, participant: &Participant) -> RepoResult<()> {
        participant.validate()?;

        self.conn.execute(
            "INSERT INTO participants (
                email,
                name,
                timezone,
                suppress_until,
                cadence,
                topics
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                timezone = excluded.timezone,
                suppress_until = excluded.suppress_until,
                cadence = excluded.cadence,
                topics = excluded.topics;",
            params![
                participant.email.as_str(),
                participant.name.as_str(),
                participant.timezone.as_str(),
                participant.suppress_until.as_deref(),
                i64::from(participant.cadence),
                participant.topics.as_str(),
            ],
        )?;

        Ok(())
    }

    fn remove_participant(&self, email: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM participants WHERE email = ?1;", [email])?;

        if changed == 0 {
            return Err(RepoError::NotFound(email.to_string()));
        }

        Ok(())
    }

    fn set_suppress_until(&self, email: &str, suppress_until: Option<&str>) -> RepoResult<()> {
        let suppress_until = suppress_until.filter(|value| !value.trim().is_empty());
        let changed = self.conn.execute(
            "UPDATE participants SET suppress_until = ?2 WHERE email = ?1;",
            params![email, suppress_until],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(email.to_string()));
        }

        Ok(())
    }
}

fn parse_participant_row(row: &Row<'_>) -> RepoResult<Participant> {
    let email: String = row.get("email")?;
    let cadence_raw: i64 = row.get("cadence")?;
    let cadence = u32::try_from(cadence_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid cadence `{cadence_raw}` for `{email}` in participants.cadence"
        ))
    })?;

    let participant = Participant {
        name: row.get("name")?,
        email,
        timezone: row.get("timezone")?,
        suppress_until: row.get("suppress_until")?,
        cadence,
        topics: row.get("topics")?,
    };
    participant.validate()?;
    Ok(participant)
}
