//! v003: user profile table (§6.4) — `(user_id PK, profile_content, topics_json, created_at, updated_at)`.

use rusqlite::Connection;

use powermem_core::errors::{PowerMemResult, StorageError};

pub fn migrate(conn: &Connection) -> PowerMemResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            user_id         TEXT PRIMARY KEY,
            profile_content TEXT,
            topics_json     TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
    Ok(())
}
