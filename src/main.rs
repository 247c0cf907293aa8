//! Webhooked webhook capture service.
//!
//! Main entry point. Loads configuration, connects to PostgreSQL, applies
//! migrations and serves the HTTP API until SIGTERM or CTRL+C.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use webhooked_api::{AppState, Config, Environment};
use webhooked_core::{storage::run_migrations, Clock, RealClock, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config)?;

    info!(service = %config.service_name, "Starting webhooked");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        max_connections = config.database_max_connections,
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    run_migrations(&db_pool).await.context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let addr = config.parse_server_addr()?;
    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
    let storage = Storage::postgres(db_pool.clone(), clock.clone());
    let state = AppState::new(storage, config, clock);

    webhooked_api::start_server(state, addr).await.context("Server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Webhooked shutdown complete");
    Ok(())
}

/// Initializes tracing: human-readable output in development, JSON lines in
/// production.
fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(config.log_filter()).context("Invalid log filter directives")?;

    let registry = tracing_subscriber::registry().with(filter);

    match config.environment {
        Environment::Development => registry
            .with(fmt::layer().with_target(true).with_file(true).with_line_number(true))
            .try_init(),
        Environment::Production => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(config.database_idle_timeout))
            .max_lifetime(Duration::from_secs(config.database_max_lifetime))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
