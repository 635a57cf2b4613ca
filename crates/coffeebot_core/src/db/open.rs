//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the stores.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Returned connections wait up to 5s on a locked database, so a
//!   dispatch run overlapping a generate run blocks instead of failing.

use super::migrations::{apply_migrations, latest_version};
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a SQLite database file and applies migrations.
///
/// # Side effects
/// - Creates the file and all store tables on first use.
/// - Emits a `db_open` event carrying the location and duration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    open_with(&path.display().to_string(), || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all migrations.
///
/// # Side effects
/// - Emits a `db_open` event carrying the location and duration.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(":memory:", Connection::open_in_memory)
}

fn open_with(
    location: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start location={location}");

    let opened = open()
        .map_err(|err| ("db_open_failed", DbError::from(err)))
        .and_then(|mut conn| {
            prepare_store(&mut conn)
                .map(|()| conn)
                .map_err(|err| ("db_bootstrap_failed", err))
        });
    let duration_ms = started_at.elapsed().as_millis();

    match opened {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok location={location} schema_version={} duration_ms={duration_ms}",
                latest_version()
            );
            Ok(conn)
        }
        Err((error_code, err)) => {
            error!(
                "event=db_open module=db status=error location={location} duration_ms={duration_ms} error_code={error_code} error={err}"
            );
            Err(err)
        }
    }
}

/// Connection settings every store relies on, then the schema upgrade.
fn prepare_store(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
