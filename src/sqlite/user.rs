use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{database_error, expect_one_row};
use crate::{AuthError, Role, User, UserRepository};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, last_login, \
     failed_login_attempts, last_failed_login_attempt, is_disabled, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    last_login: Option<DateTime<Utc>>,
    failed_login_attempts: i64,
    last_failed_login_attempt: Option<DateTime<Utc>>,
    is_disabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_user(self, roles: Vec<Role>) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            last_login: self.last_login,
            failed_login_attempts: u32::try_from(self.failed_login_attempts).unwrap_or(u32::MAX),
            last_failed_login_attempt: self.last_failed_login_attempt,
            is_disabled: self.is_disabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
            roles,
        }
    }
}

impl SqliteUserRepository {
    /// Inserts a user and its role assignments in one transaction.
    ///
    /// # Errors
    ///
    /// `Validation` when the username or email is already taken.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, user), fields(user_id = %user.id), err)
    )]
    pub async fn create_user(&self, user: &User) -> Result<(), AuthError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database_error("create_user"))?;

        sqlx::query(
            "INSERT INTO users (id, username, email, first_name, last_name, password_hash, \
             last_login, failed_login_attempts, last_failed_login_attempt, is_disabled, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.last_login)
        .bind(i64::from(user.failed_login_attempts))
        .bind(user.last_failed_login_attempt)
        .bind(user.is_disabled)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                return AuthError::Validation("username or email already taken".to_owned());
            }
            database_error("create_user")(e)
        })?;

        for role in &user.roles {
            let result = sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = ?",
            )
            .bind(user.id)
            .bind(role.name())
            .execute(&mut *tx)
            .await
            .map_err(database_error("assign_role"))?;
            expect_one_row("insert", "user_roles", result.rows_affected())?;
        }

        tx.commit().await.map_err(database_error("create_user"))?;

        log::info!(
            target: "mainframe_auth",
            "msg=\"user created\" user_id=\"{}\" roles={}",
            user.id,
            user.roles.len()
        );
        Ok(())
    }

    async fn load_roles(&self, user_id: Uuid) -> Result<Vec<Role>, AuthError> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT r.name FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = ? ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("load_roles"))?;

        Ok(names
            .into_iter()
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    log::warn!(
                        target: "mainframe_auth",
                        "msg=\"ignoring unknown role\" user_id=\"{user_id}\" role=\"{name}\""
                    );
                    None
                }
            })
            .collect())
    }

    async fn with_roles(&self, record: Option<UserRecord>) -> Result<Option<User>, AuthError> {
        match record {
            Some(record) => {
                let roles = self.load_roles(record.id).await?;
                Ok(Some(record.into_user(roles)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("find_user_by_id"))?;

        self.with_roles(row).await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER(?)"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("find_user_by_username"))?;

        self.with_roles(row).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, user), fields(user_id = %user.id), err)
    )]
    async fn update_basic(&self, user: &User) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, first_name = ?, last_name = ?, last_login = ?, \
             failed_login_attempts = ?, last_failed_login_attempt = ?, is_disabled = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.last_login)
        .bind(i64::from(user.failed_login_attempts))
        .bind(user.last_failed_login_attempt)
        .bind(user.is_disabled)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(database_error("update_user"))?;

        expect_one_row("update", "user", result.rows_affected())
    }
}
