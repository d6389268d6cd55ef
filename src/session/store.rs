use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::warn;

use crate::error::ApiError;
use crate::models::UserProfile;

const TOKEN_KEY: &str = "access_token";
const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub profile: Option<UserProfile>,
}

/// Client-side storage that outlives the process but not an explicit logout.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredSession>, ApiError>;
    async fn save(&self, session: &StoredSession) -> Result<(), ApiError>;
    async fn clear(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<StoredSession>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Key/value table holding the token and the serialized profile.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn connect(database_url: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // a single connection so `sqlite::memory:` sees one database
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(db).await
    }

    pub async fn with_pool(db: SqlitePool) -> Result<Self, ApiError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await?;
        Ok(Self { db })
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO session_entries (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ApiError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM session_entries")
                .fetch_all(&self.db)
                .await?;

        let mut token = None;
        let mut profile = None;
        for (key, value) in rows {
            match key.as_str() {
                TOKEN_KEY => token = Some(value),
                USER_KEY => match serde_json::from_str::<UserProfile>(&value) {
                    Ok(parsed) => profile = Some(parsed),
                    Err(e) => warn!("ignoring unreadable stored profile: {}", e),
                },
                _ => {}
            }
        }

        Ok(token.map(|token| StoredSession { token, profile }))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ApiError> {
        self.put(TOKEN_KEY, &session.token).await?;
        match &session.profile {
            Some(profile) => {
                let json = serde_json::to_string(profile)
                    .map_err(|e| ApiError::Decode(format!("Failed to serialize profile: {}", e)))?;
                self.put(USER_KEY, &json).await?;
            }
            None => {
                sqlx::query("DELETE FROM session_entries WHERE key = ?1")
                    .bind(USER_KEY)
                    .execute(&self.db)
                    .await?;
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM session_entries")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
