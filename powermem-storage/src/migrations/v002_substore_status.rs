//! v002: sub-store status table (§6.4) — `(name, status, total_count, migrated_count, started_at, updated_at)`.

use rusqlite::Connection;

use powermem_core::errors::{PowerMemResult, StorageError};

pub fn migrate(conn: &Connection) -> PowerMemResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS substore_status (
            name            TEXT PRIMARY KEY,
            status          TEXT NOT NULL DEFAULT 'dormant',
            total_count     INTEGER NOT NULL DEFAULT 0,
            migrated_count  INTEGER NOT NULL DEFAULT 0,
            started_at      TEXT,
            updated_at      TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
    Ok(())
}
