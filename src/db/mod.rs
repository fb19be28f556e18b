use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates the connection pool shared by the ledger, directory and token store
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!(
        "Connecting to PostgreSQL (pool {}..{} connections)",
        config.min_connections,
        config.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Batch timestamps are stored and compared in UTC
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    log::info!("Database connection pool established");

    Ok(pool)
}

/// Runs all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    log::info!("Database migrations completed");
    Ok(())
}

/// Round-trips a trivial query; used by readiness checks
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
