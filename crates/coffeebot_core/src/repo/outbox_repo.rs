//! Notification outbox repository.
//!
//! # Responsibility
//! - Queue composed messages for an external mail transport.
//! - Let that transport list pending messages and mark them delivered.
//!
//! # Invariants
//! - Recipients are stored as one canonical key string.
//! - Pending messages are listed oldest first.

use crate::notify::OutgoingMessage;
use crate::pairing::key::{decode_key, encode_key};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

/// One queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub id: i64,
    pub message: OutgoingMessage,
    /// Queue timestamp in epoch milliseconds.
    pub queued_at: i64,
}

/// Repository interface for the outbox.
pub trait OutboxRepository {
    /// Queues one message and returns its id.
    fn enqueue(&self, message: &OutgoingMessage) -> RepoResult<i64>;
    /// Lists undelivered messages oldest first, optionally capped.
    fn list_pending(&self, limit: Option<u32>) -> RepoResult<Vec<OutboxRecord>>;
    /// Marks one message delivered.
    fn mark_delivered(&self, id: i64) -> RepoResult<()>;
}

/// SQLite-backed outbox repository.
pub struct SqliteOutboxRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutboxRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OutboxRepository for SqliteOutboxRepository<'_> {
    fn enqueue(&self, message: &OutgoingMessage) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO outbox (sender_name, recipients, subject, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                message.sender_name.as_str(),
                encode_key(&message.recipients),
                message.subject.as_str(),
                message.body.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_pending(&self, limit: Option<u32>) -> RepoResult<Vec<OutboxRecord>> {
        let mut sql = String::from(
            "SELECT id, sender_name, recipients, subject, body, queued_at
             FROM outbox
             WHERE delivered_at IS NULL
             ORDER BY id ASC",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let recipients: String = row.get("recipients")?;
            records.push(OutboxRecord {
                id: row.get("id")?,
                message: OutgoingMessage {
                    sender_name: row.get("sender_name")?,
                    recipients: decode_key(&recipients),
                    subject: row.get("subject")?,
                    body: row.get("body")?,
                },
                queued_at: row.get("queued_at")?,
            });
        }

        Ok(records)
    }

    fn mark_delivered(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE outbox
             SET delivered_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 AND delivered_at IS NULL;",
            [id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(format!("outbox message {id}")));
        }

        Ok(())
    }
}
