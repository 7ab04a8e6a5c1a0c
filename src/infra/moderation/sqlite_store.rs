// SQLite-backed store for per-user history and the moderation log.
//
// Tables:
// - user_context: one row per user, history as a JSON array of strings
// - moderation_log: append-only final decisions

use crate::core::history::{cap_history, HistoryStore, StorageError};
use crate::core::moderation::{ModerationLog, ModerationRecord};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteModerationStore {
    pool: Pool<Sqlite>,
    max_history: usize,
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// Stored history must be exactly a JSON array of strings; anything else is corrupt.
fn decode_history(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))
}

/// Read-modify-write of one history row. The caller holds the write lock.
async fn append_locked(
    conn: &mut SqliteConnection,
    user_id: u64,
    text: &str,
    max_history: usize,
) -> Result<(), StorageError> {
    let row = sqlx::query("SELECT chat_history FROM user_context WHERE user_id = ?")
        .bind(user_id as i64)
        .fetch_optional(&mut *conn)
        .await
        .map_err(backend)?;

    let mut history = match row {
        Some(row) => decode_history(&row.get::<String, _>("chat_history"))?,
        None => Vec::new(),
    };
    history.push(text.to_string());
    cap_history(&mut history, max_history);

    let encoded =
        serde_json::to_string(&history).map_err(|e| StorageError::Backend(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO user_context (user_id, chat_history, last_updated)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            chat_history = excluded.chat_history,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(user_id as i64)
    .bind(encoded)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await
    .map_err(backend)?;

    Ok(())
}

impl SqliteModerationStore {
    pub fn new(pool: Pool<Sqlite>, max_history: usize) -> Self {
        Self { pool, max_history }
    }

    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &Path, max_history: usize) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(backend)?;

        Ok(Self::new(pool, max_history))
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_context (
                user_id INTEGER PRIMARY KEY,
                chat_history TEXT NOT NULL DEFAULT '[]',
                last_updated TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                chat_id INTEGER NOT NULL,
                message_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                decision TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteModerationStore {
    async fn get_history(&self, user_id: u64) -> Result<Vec<String>, StorageError> {
        let row = sqlx::query("SELECT chat_history FROM user_context WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            Some(row) => decode_history(&row.get::<String, _>("chat_history")),
            None => Ok(Vec::new()),
        }
    }

    async fn append_history(&self, user_id: u64, text: &str) -> Result<(), StorageError> {
        // Take the write lock up front. A deferred transaction upgrading from
        // read to write gets SQLITE_BUSY at once, without honoring busy_timeout.
        let mut conn = self.pool.acquire().await.map_err(backend)?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(backend)?;

        match append_locked(&mut *conn, user_id, text, self.max_history).await {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(backend)?;
                Ok(())
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn clear_history(&self, user_id: u64) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM user_context WHERE user_id = ?")
            .bind(user_id as i64)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl ModerationLog for SqliteModerationStore {
    async fn append_record(&self, record: ModerationRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO moderation_log (user_id, chat_id, message_id, content, decision, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.sender_id as i64)
        .bind(record.context_id as i64)
        .bind(record.message_id as i64)
        .bind(&record.content)
        .bind(record.decision.as_str())
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}
