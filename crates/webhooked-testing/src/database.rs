//! PostgreSQL access for tests that need the real repositories.
//!
//! The database is named by `WEBHOOKED_TEST_DATABASE_URL`, falling back to
//! `DATABASE_URL`. When neither is set, [`TestDatabase::from_env`] returns
//! `None` and callers skip.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use webhooked_core::{storage::run_migrations, Clock, Storage};

/// Environment variables checked for a test database, in order.
pub const DATABASE_URL_VARS: [&str; 2] = ["WEBHOOKED_TEST_DATABASE_URL", "DATABASE_URL"];

/// Migrated test database handle.
#[derive(Debug, Clone)]
pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connects to the configured database and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns error if a URL is set but the connection or migrations fail.
    pub async fn from_env() -> Result<Option<Self>> {
        let Some(url) = DATABASE_URL_VARS.iter().find_map(|var| std::env::var(var).ok()) else {
            return Ok(None);
        };

        Self::connect(&url).await.map(Some)
    }

    /// Connects to `url` and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns error if the connection or migrations fail.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .context("failed to connect to test database")?;

        run_migrations(&pool).await.context("failed to migrate test database")?;
        debug!("Test database ready");

        Ok(Self { pool })
    }

    /// PostgreSQL-backed storage over this database.
    pub fn storage(&self, clock: Arc<dyn Clock>) -> Storage {
        Storage::postgres(self.pool.clone(), clock)
    }
}
