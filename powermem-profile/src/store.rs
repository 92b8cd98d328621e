//! SQLite persistence for the profile table (§6.4: `(user_id PK,
//! profile_content, topics_json, created_at, updated_at)`), schema owned by
//! `powermem-storage`'s migration runner so both crates share one
//! migration history against the same database file.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use powermem_core::errors::{PowerMemError, PowerMemResult, StorageError};
use powermem_core::profile::{ProfileBlob, ProfileRecord};

pub struct ProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProfileStore {
    pub fn open(path: &str) -> PowerMemResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StorageError::Sqlite(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            .map_err(|e| StorageError::Sqlite(e.to_string()))?;
        powermem_storage::migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> PowerMemResult<T>
    where
        F: FnOnce(&Connection) -> PowerMemResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().expect("sqlite connection mutex poisoned");
            f(&guard)
        })
        .await
        .map_err(|e| PowerMemError::Storage(StorageError::Sqlite(format!("task join error: {e}"))))?
    }

    pub async fn get(&self, user_id: &str) -> PowerMemResult<Option<ProfileRecord>> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT profile_content, topics_json, created_at, updated_at FROM profiles WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        let profile_content: Option<String> = row.get(0)?;
                        let topics_json: Option<String> = row.get(1)?;
                        let created_at: String = row.get(2)?;
                        let updated_at: String = row.get(3)?;
                        Ok((profile_content, topics_json, created_at, updated_at))
                    },
                )
                .optional()
                .map_err(|e| StorageError::Sqlite(e.to_string()))?;

            let Some((profile_content, topics_json, created_at, updated_at)) = row else {
                return Ok(None);
            };

            let topics = topics_json
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(StorageError::Serialization)?;

            Ok(Some(ProfileRecord {
                user_id: user_id.clone(),
                blob: ProfileBlob { profile_content, topics },
                created_at: parse_rfc3339(&created_at)?,
                updated_at: parse_rfc3339(&updated_at)?,
            }))
        })
        .await
    }

    /// Atomic blob replacement (§4.10): one row per `user_id`, upserted
    /// wholesale rather than merged field-by-field, since the extraction
    /// call already received the prior blob and is expected to return the
    /// full new one.
    pub async fn upsert(&self, user_id: &str, blob: ProfileBlob, now: DateTime<Utc>) -> PowerMemResult<()> {
        let user_id = user_id.to_string();
        let topics_json = blob.topics.map(|v| v.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, profile_content, topics_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                   profile_content = excluded.profile_content,
                   topics_json = excluded.topics_json,
                   updated_at = excluded.updated_at",
                params![user_id, blob.profile_content, topics_json, now.to_rfc3339()],
            )
            .map_err(|e| StorageError::Sqlite(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

fn parse_rfc3339(raw: &str) -> PowerMemResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Sqlite(format!("corrupt timestamp column: {e}")).into())
}
