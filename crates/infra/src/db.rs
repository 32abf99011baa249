//! Postgres pool construction and schema migration.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{LedgerError, LedgerResult};

/// Build the single shared pool every Postgres-backed store receives.
pub async fn connect(config: &DatabaseConfig) -> LedgerResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.url)
        .await
        .map_err(|e| LedgerError::from_sqlx("connect", e))
}

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &PgPool) -> LedgerResult<()> {
    info!("running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| LedgerError::storage(format!("migrate: {e}")))?;
    info!("database migrations complete");
    Ok(())
}
