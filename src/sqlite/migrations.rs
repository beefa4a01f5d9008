//! Embedded `SQLite` schema migrations.
//!
//! # Example
//!
//! ```rust,ignore
//! use mainframe_auth::sqlite::{connect, migrations};
//!
//! let pool = connect("sqlite://mainframe.db").await?;
//! migrations::run(&pool).await?;
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250101000001_create_users_table",
        include_str!("../../migrations_sqlite/20250101000001_create_users_table.sql"),
    ),
    (
        "20250101000002_create_roles_tables",
        include_str!("../../migrations_sqlite/20250101000002_create_roles_tables.sql"),
    ),
    (
        "20250101000003_create_sessions_table",
        include_str!("../../migrations_sqlite/20250101000003_create_sessions_table.sql"),
    ),
];

/// Applies every migration not yet recorded in `_mainframe_migrations`.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _mainframe_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM _mainframe_migrations WHERE name = ?)",
        )
        .bind(*name)
        .fetch_one(pool)
        .await?;

        if applied {
            continue;
        }

        // statements are split on ';', so migration files must not contain
        // semicolons inside string literals
        let mut tx = pool.begin().await?;
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                (&mut *tx).execute(trimmed).await?;
            }
        }
        sqlx::query("INSERT INTO _mainframe_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!(target: "mainframe_auth", "msg=\"migration applied\" name=\"{name}\"");
    }

    Ok(())
}
