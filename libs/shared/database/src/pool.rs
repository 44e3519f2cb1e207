use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use shared_config::AppConfig;

/// Opens the Postgres pool described by `DATABASE_URL`.
pub async fn connect(config: &AppConfig) -> Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL is not configured"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    info!(
        "Connected to Postgres (max {} connections)",
        config.database_max_connections
    );
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!("Database migrations applied");
    Ok(())
}
