//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary, so a
//! register never needs the files at runtime. sqlx records what has run in
//! `_sqlx_migrations`; only newer files are applied on open.
//!
//! New schema changes go in a new `NNN_description.sql`. Applied files are
//! checksummed and must not be edited.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations, each in its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    debug!(total, applied, "Migration status");

    MIGRATOR.run(pool).await?;

    if applied < total {
        info!(applied = total - applied, "Schema migrated");
    }
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // No bookkeeping table before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied.max(0) as usize))
}
