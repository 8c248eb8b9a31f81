//! Postgres storage for check records.

pub mod checks;

use std::time::Duration;

use sladash_core::AppConfig;
use sqlx::{
    migrate::{MigrateError, Migrator},
    postgres::PgPoolOptions,
    PgPool,
};
use thiserror::Error;

pub use checks::{
    clamp_limit, insert_availability_checks, insert_serviceability_checks,
    list_availability_checks, list_serviceability_checks, AvailabilityCheckRow,
    AvailabilityFilter, PgRecordStore, ServiceabilityCheckRow, ServiceabilityFilter,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};

// Relative to this crate's Cargo.toml.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is empty")]
    MissingDatabaseUrl,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] MigrateError),
}

/// Pool options from the `SLADASH_DB_*` settings.
///
/// The minimum is capped at the maximum so a misconfigured pair still yields
/// a usable pool.
#[must_use]
pub fn pool_options(config: &AppConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections.min(config.db_max_connections))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
}

/// Opens the pool described by `config`.
///
/// # Errors
///
/// [`DbError::MissingDatabaseUrl`] for a blank URL, [`DbError::Sqlx`] if the
/// first connection fails.
pub async fn connect(config: &AppConfig) -> Result<PgPool, DbError> {
    let url = config.database_url.trim();
    if url.is_empty() {
        return Err(DbError::MissingDatabaseUrl);
    }
    Ok(pool_options(config).connect(url).await?)
}

/// Applies the embedded migrations and returns how many were new.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    let pending = pending_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    Ok(pending)
}

async fn pending_migrations(pool: &PgPool) -> usize {
    // The bookkeeping table is absent on a fresh database.
    let applied: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = true")
            .fetch_all(pool)
            .await
            .unwrap_or_default();
    MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !applied.contains(&m.version))
        .count()
}

/// Round-trips `SELECT 1` through the pool.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection answers.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
