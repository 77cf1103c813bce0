// storefront/src/db.rs

//! Process-wide Postgres pool, created on first use and reused afterwards.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::{error, info};

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// The shared pool. The first caller connects; concurrent first callers wait
/// for that connection instead of opening their own.
pub async fn pool(config: &AppConfig) -> Result<PgPool> {
  let database_url = config
    .database_url
    .clone()
    .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
  let max_connections = config.db_max_connections;

  let pool = POOL
    .get_or_try_init(|| async move {
      let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .map_err(|e| {
          error!(error = %e, "Failed to connect to the database.");
          AppError::StoreUnavailable(format!("database connection failed: {}", e))
        })?;
      info!(max_connections, "Successfully connected to the database.");
      Ok::<_, AppError>(pool)
    })
    .await?;
  Ok(pool.clone())
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
  sqlx::migrate!("./migrations")
    .run(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Database migration failed: {}", e)))?;
  info!("Database migrations applied.");
  Ok(())
}
