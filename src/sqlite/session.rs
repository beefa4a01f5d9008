use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{database_error, expect_one_row};
use crate::{AuthError, Session, SessionRepository};

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
}

impl From<SessionRecord> for Session {
    fn from(row: SessionRecord) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find(&self, id: Uuid) -> Result<Option<Session>, AuthError> {
        let row: Option<SessionRecord> =
            sqlx::query_as("SELECT id, user_id, token, expires_at FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("find_session"))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, session), fields(session_id = %session.id), err)
    )]
    async fn create(&self, session: &Session) -> Result<(), AuthError> {
        let result = sqlx::query(
            "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(database_error("create_session"))?;

        expect_one_row("insert", "session", result.rows_affected())
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, session), fields(session_id = %session.id), err)
    )]
    async fn update(&self, session: &Session) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE sessions SET user_id = ?, token = ?, expires_at = ? WHERE id = ?",
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .bind(session.id)
        .execute(&self.pool)
        .await
        .map_err(database_error("update_session"))?;

        expect_one_row("update", "session", result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error("delete_session"))?;

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_error("prune_expired_sessions"))?;

        Ok(result.rows_affected())
    }
}
