//! Store schema history.
//!
//! Each step is one embedded SQL file. Steps use `IF NOT EXISTS`, so a store
//! created by hand is adopted instead of rejected.

use crate::db::{DbError, DbResult, STORE_TABLES};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "roster_history_next_pairings",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "outbox",
        sql: include_str!("0002_outbox.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`] in a single transaction, then
/// checks that every store table exists.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    if from_version < latest {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > from_version) {
            debug!(
                "event=db_migrate_step module=db status=start version={} name={}",
                migration.version, migration.name
            );
            tx.execute_batch(migration.sql)
                .and_then(|()| {
                    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
                })
                .map_err(|source| DbError::Migration {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;
        }
        tx.commit()?;
        info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    }

    verify_store_tables(conn)
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

fn verify_store_tables(conn: &Connection) -> DbResult<()> {
    let mut stmt =
        conn.prepare("SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);")?;
    for table in STORE_TABLES.iter().copied() {
        let exists: bool = stmt.query_row([table], |row| row.get(0))?;
        if !exists {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}
