//! Migration runner — version tracking, forward-only, one transaction per migration.

mod v001_initial_schema;
mod v002_substore_status;
mod v003_profiles;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use powermem_core::errors::{PowerMemResult, StorageError};

type MigrationFn = fn(&Connection) -> PowerMemResult<()>;

pub const LATEST_VERSION: u32 = 3;

const MIGRATIONS: [(u32, &str, MigrationFn); 3] = [
    (1, "initial_schema", v001_initial_schema::migrate),
    (2, "substore_status", v002_substore_status::migrate),
    (3, "profiles", v003_profiles::migrate),
];

pub fn current_version(conn: &Connection) -> PowerMemResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| StorageError::Sqlite(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StorageError::Sqlite(e.to_string()).into())
}

/// Run all pending migrations. Each migration is wrapped in its own
/// transaction so a failure midway doesn't leave a partially-applied schema.
pub fn run_migrations(conn: &Connection) -> PowerMemResult<u32> {
    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{current} -> v{LATEST_VERSION}");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
    )
    .map_err(|e| StorageError::Sqlite(e.to_string()))?;

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StorageError::Sqlite(format!("begin v{version:03}: {e}")))?;

        match migrate_fn(conn) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(|e| StorageError::Sqlite(format!("record v{version:03}: {e}")))?;
                conn.execute_batch("COMMIT")
                    .map_err(|e| StorageError::Sqlite(format!("commit v{version:03}: {e}")))?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                }
                .into());
            }
        }
    }

    info!("applied {applied} migration(s), now at v{LATEST_VERSION}");
    Ok(applied)
}
