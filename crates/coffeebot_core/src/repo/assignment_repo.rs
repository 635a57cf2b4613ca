//! Next-pairing assignment repository.
//!
//! # Responsibility
//! - Hold the pending assignment between a generate cycle and the dispatch
//!   cycle that notifies it.
//!
//! # Invariants
//! - `replace_all` swaps the whole assignment in one transaction.
//! - `read_all` returns keys in the order they were written.

use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Repository interface for the pending assignment.
pub trait AssignmentRepository {
    /// Replaces the stored assignment with `group_keys`.
    fn replace_all(&self, group_keys: &[String]) -> RepoResult<()>;
    /// Returns the stored canonical keys in write order.
    fn read_all(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed assignment repository.
pub struct SqliteAssignmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn replace_all(&self, group_keys: &[String]) -> RepoResult<()> {
        // Repositories share one `&Connection`; nested transactions are not used.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM next_pairings;", [])?;
        {
            let mut insert =
                tx.prepare("INSERT INTO next_pairings (position, group_key) VALUES (?1, ?2);")?;
            for (position, key) in group_keys.iter().enumerate() {
                insert.execute(params![position as i64, key.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn read_all(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT group_key FROM next_pairings ORDER BY position ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
