use super::store::SessionStore;
use super::types::{ChatSession, Message};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// Hosted chat collection: one `chats` row per session, scoped by user id.
pub struct SqliteSessionStore {
    pool: SqlitePool,
    user_id: String,
}

impl SqliteSessionStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn connect(path: &Path, user_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("open chat database {}", path.display()))?;
        Self::new(pool, user_id).await
    }

    /// Create a store on an existing pool and ensure the schema exists.
    pub async fn new(pool: SqlitePool, user_id: &str) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chats (
                 id TEXT PRIMARY KEY,
                 user_id TEXT NOT NULL,
                 title TEXT NOT NULL,
                 messages TEXT NOT NULL,
                 created_at INTEGER NOT NULL,
                 updated_at INTEGER NOT NULL
             )",
        )
        .execute(&pool)
        .await
        .context("create chats table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chats_user_updated
                 ON chats(user_id, updated_at DESC)",
        )
        .execute(&pool)
        .await
        .context("create chats index")?;

        Ok(Self {
            pool,
            user_id: user_id.to_string(),
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .with_context(|| format!("timestamp out of range: {millis}"))
}

fn map_chat_row(row: &SqliteRow) -> Result<ChatSession> {
    let messages_raw: String = row.try_get("messages")?;
    let messages: Vec<Message> =
        serde_json::from_str(&messages_raw).context("deserialize chat messages")?;

    Ok(ChatSession {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        messages,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
        user_id: Some(row.try_get("user_id")?),
    })
}

impl SessionStore for SqliteSessionStore {
    fn put_session<'a>(
        &'a self,
        session: &'a ChatSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let messages =
                serde_json::to_string(&session.messages).context("serialize chat messages")?;

            // Rows owned by another user are never overwritten.
            sqlx::query(
                "INSERT INTO chats (id, user_id, title, messages, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     messages = excluded.messages,
                     updated_at = excluded.updated_at
                 WHERE chats.user_id = excluded.user_id",
            )
            .bind(&session.id)
            .bind(&self.user_id)
            .bind(&session.title)
            .bind(messages)
            .bind(session.created_at.timestamp_millis())
            .bind(session.updated_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .context("upsert chat")?;
            Ok(())
        })
    }

    fn get_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ChatSession>>> + Send + 'a>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, user_id, title, messages, created_at, updated_at
                 FROM chats
                 WHERE id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(&self.user_id)
            .fetch_optional(&self.pool)
            .await
            .context("query chat by id")?;

            row.map(|r| map_chat_row(&r)).transpose()
        })
    }

    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ChatSession>>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, user_id, title, messages, created_at, updated_at
                 FROM chats
                 WHERE user_id = $1
                 ORDER BY updated_at DESC",
            )
            .bind(&self.user_id)
            .fetch_all(&self.pool)
            .await
            .context("list chats")?;

            rows.iter().map(map_chat_row).collect()
        })
    }

    fn delete_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(&self.user_id)
                .execute(&self.pool)
                .await
                .context("delete chat")?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM chats WHERE user_id = $1")
                .bind(&self.user_id)
                .execute(&self.pool)
                .await
                .context("delete all chats")?;
            Ok(())
        })
    }
}
