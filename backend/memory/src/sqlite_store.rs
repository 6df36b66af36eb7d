//! SQLite-backed dialog log.
//!
//! Rows live in a single `dialogs` table and are never updated or deleted.
//! Timestamps are stored as RFC 3339 text.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reframe_core::ReframeError;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::store::DialogLog;
use crate::types::{DialogRecord, DialogRole};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS dialogs (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id   INTEGER,
    message   TEXT,
    role      TEXT,
    timestamp TEXT
);
CREATE INDEX IF NOT EXISTS idx_dialogs_user ON dialogs(user_id);";

pub struct SqliteDialogLog {
    conn: Mutex<Connection>,
}

impl SqliteDialogLog {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReframeError> {
        let conn = Connection::open(path.as_ref()).map_err(storage)?;
        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .map_err(storage)?;

        info!("SqliteDialogLog opened at {:?}", path.as_ref());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self, ReframeError> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn storage(err: rusqlite::Error) -> ReframeError {
    ReframeError::Storage(err.to_string())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DialogRecord> {
    let role: String = row.get(2)?;
    let timestamp: String = row.get(3)?;
    let role = role.parse::<DialogRole>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(DialogRecord {
        user_id: row.get(0)?,
        message: row.get(1)?,
        role,
        timestamp,
    })
}

#[async_trait]
impl DialogLog for SqliteDialogLog {
    async fn append(&self, record: DialogRecord) -> Result<(), ReframeError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO dialogs (user_id, message, role, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.user_id,
                record.message,
                record.role.as_str(),
                record.timestamp.to_rfc3339(),
            ],
        )
        .map_err(storage)?;
        debug!(user_id = record.user_id, role = %record.role, "Dialog record appended");
        Ok(())
    }

    async fn history(&self, user_id: i64) -> Result<Vec<DialogRecord>, ReframeError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, message, role, timestamp FROM dialogs
                 WHERE user_id = ?1 ORDER BY id ASC",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![user_id], row_to_record)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(rows)
    }

    async fn count(&self) -> Result<u64, ReframeError> {
        let conn = self.conn.lock().await;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM dialogs", [], |row| row.get(0))
            .map_err(storage)?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let log = SqliteDialogLog::in_memory().unwrap();
        log.append(DialogRecord::new(42, DialogRole::User, "Здравствуйте"))
            .await
            .unwrap();
        log.append(DialogRecord::new(42, DialogRole::Persona, "Добрый день"))
            .await
            .unwrap();
        log.append(DialogRecord::new(7, DialogRole::Search, "### Результаты поиска"))
            .await
            .unwrap();

        let history = log.history(42).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, DialogRole::User);
        assert_eq!(history[1].message, "Добрый день");
        assert_eq!(log.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialogs.db");

        {
            let log = SqliteDialogLog::open(&path).unwrap();
            log.append(DialogRecord::new(1, DialogRole::Notice, "⚠️"))
                .await
                .unwrap();
        }

        let log = SqliteDialogLog::open(&path).unwrap();
        assert_eq!(log.count().await.unwrap(), 1);
        let history = log.history(1).await.unwrap();
        assert_eq!(history[0].role, DialogRole::Notice);
    }

    #[tokio::test]
    async fn timestamps_are_rfc3339_text() {
        let log = SqliteDialogLog::in_memory().unwrap();
        log.append(DialogRecord::new(5, DialogRole::User, "hi"))
            .await
            .unwrap();

        let conn = log.conn.lock().await;
        let ts: String = conn
            .query_row("SELECT timestamp FROM dialogs LIMIT 1", [], |row| row.get(0))
            .unwrap();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
