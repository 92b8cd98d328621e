//! v001: the `memories` table, its FTS5 shadow index, and supporting indexes.

use rusqlite::Connection;

use powermem_core::errors::{PowerMemResult, StorageError};

pub fn migrate(conn: &Connection) -> PowerMemResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id                TEXT PRIMARY KEY,
            collection        TEXT NOT NULL,
            dense_embedding   BLOB NOT NULL,
            sparse_embedding  TEXT,
            payload           TEXT NOT NULL,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memories_collection
            ON memories(collection);

        CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
            id UNINDEXED,
            collection UNINDEXED,
            fulltext_content,
            tokenize = 'porter unicode61'
        );

        CREATE TRIGGER IF NOT EXISTS memories_fts_ai AFTER INSERT ON memories BEGIN
            INSERT INTO memories_fts(id, collection, fulltext_content)
            VALUES (new.id, new.collection, json_extract(new.payload, '$.fulltext_content'));
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_ad AFTER DELETE ON memories BEGIN
            DELETE FROM memories_fts WHERE id = old.id;
        END;

        CREATE TRIGGER IF NOT EXISTS memories_fts_au AFTER UPDATE ON memories BEGIN
            DELETE FROM memories_fts WHERE id = old.id;
            INSERT INTO memories_fts(id, collection, fulltext_content)
            VALUES (new.id, new.collection, json_extract(new.payload, '$.fulltext_content'));
        END;
        ",
    )
    .map_err(|e| StorageError::Sqlite(e.to_string()))?;
    Ok(())
}
