//! `SQLite` implementations of the user and session stores.
//!
//! Enable the `sqlx_sqlite` feature to use these implementations.

pub mod migrations;
mod session;
mod user;

use std::str::FromStr;

pub use session::SqliteSessionRepository;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
pub use user::SqliteUserRepository;

use crate::AuthError;

/// Opens a pool on `database_url`, creating the database file if needed.
///
/// Foreign keys are enforced so that deleting a user removes its sessions
/// and role assignments.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Creates both repositories over one pool.
pub fn create_repositories(pool: SqlitePool) -> (SqliteUserRepository, SqliteSessionRepository) {
    (
        SqliteUserRepository::new(pool.clone()),
        SqliteSessionRepository::new(pool),
    )
}

pub(crate) fn database_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AuthError {
    move |e| {
        log::error!(
            target: "mainframe_auth",
            "msg=\"database error\" operation=\"{operation}\" error=\"{e}\""
        );
        AuthError::DatabaseError(e.to_string())
    }
}

/// Turns an affected-row count other than one into an error.
pub(crate) fn expect_one_row(verb: &str, table: &str, rows_affected: u64) -> Result<(), AuthError> {
    if rows_affected == 1 {
        return Ok(());
    }
    log::error!(
        target: "mainframe_auth",
        "msg=\"unexpected rows affected\" operation=\"{verb}_{table}\" rows_affected={rows_affected}"
    );
    Err(AuthError::DatabaseError(format!(
        "expected to {verb} 1 {table} row, but rows affected was {rows_affected}"
    )))
}
