//! Pairing history repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Record every group that was actually notified.
//! - Provide the history snapshot the engine checks candidates against.
//!
//! # Invariants
//! - History is append-only; nothing in core rewrites or deletes entries.
//! - Entries are appended after delivery, never by the engine itself.

use crate::repo::{RepoError, RepoResult};
use chrono::{Datelike, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use uuid::Uuid;

/// One recorded group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Pairing date as `YYYY/M/D`.
    pub pairing_date: String,
    /// Canonical key of the notified group.
    pub group_key: String,
    /// Dispatch cycle that notified the group.
    pub cycle_id: Uuid,
}

/// Repository interface for pairing history.
pub trait HistoryRepository {
    /// Returns the set of every recorded canonical key.
    fn load_keys(&self) -> RepoResult<HashSet<String>>;
    /// Appends one notified group.
    fn append(&self, group_key: &str, date: NaiveDate, cycle_id: Uuid) -> RepoResult<()>;
    /// Lists entries newest first, optionally capped.
    fn list_entries(&self, limit: Option<u32>) -> RepoResult<Vec<HistoryEntry>>;
}

/// SQLite-backed history repository.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn load_keys(&self) -> RepoResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT group_key FROM pairing_history;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(keys)
    }

    fn append(&self, group_key: &str, date: NaiveDate, cycle_id: Uuid) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO pairing_history (pairing_date, group_key, cycle_id)
             VALUES (?1, ?2, ?3);",
            params![format_pairing_date(date), group_key, cycle_id.to_string()],
        )?;
        Ok(())
    }

    fn list_entries(&self, limit: Option<u32>) -> RepoResult<Vec<HistoryEntry>> {
        let mut sql = String::from(
            "SELECT pairing_date, group_key, cycle_id
             FROM pairing_history
             ORDER BY id DESC",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let cycle_text: String = row.get("cycle_id")?;
            let cycle_id = Uuid::parse_str(&cycle_text).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid uuid value `{cycle_text}` in pairing_history.cycle_id"
                ))
            })?;
            entries.push(HistoryEntry {
                pairing_date: row.get("pairing_date")?,
                group_key: row.get("group_key")?,
                cycle_id,
            });
        }

        Ok(entries)
    }
}

/// Formats a pairing date the way history records store it (`YYYY/M/D`).
pub fn format_pairing_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day())
}
