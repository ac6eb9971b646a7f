//! Schema history for the note store.
//!
//! Version 1 creates `folders` and `notes` with their relationship indexes.
//! The applied version lives in `PRAGMA user_version`; a database written by a
//! newer build is refused rather than downgraded.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Ordered `(user_version, sql)` steps. Versions only ever grow.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_notes_and_folders.sql"))];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`] inside one transaction.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|(version, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;
    Ok(())
}
