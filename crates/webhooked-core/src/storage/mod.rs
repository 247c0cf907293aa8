//! Repository layer for hooks and captured webhooks.
//!
//! Handlers only see the [`HookRepository`] and [`WebhookRepository`]
//! traits. The PostgreSQL repositories back the running service; the
//! in-memory store backs tests and local experiments.
//!
//! All SQL lives in this module.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

pub mod hooks;
pub mod memory;
pub mod webhooks;

use crate::{
    error::Result,
    models::{
        Hook, HookFilter, HookId, NewHook, NewWebhook, PaginatedWebhooks, WebhookFilter,
        WebhookSavedResponse,
    },
    time::Clock,
};

/// Persistence operations for hooks.
#[async_trait]
pub trait HookRepository: Send + Sync {
    /// Stores a new hook with a generated id and the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` if the name is taken.
    async fn create(&self, hook: NewHook) -> Result<Hook>;

    /// Looks up a hook by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_id(&self, id: &HookId) -> Result<Option<Hook>>;

    /// Lists hooks matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_filter(&self, filter: &HookFilter) -> Result<Vec<Hook>>;
}

/// Persistence operations for captured webhooks.
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Stores a captured request.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` if the hook does not exist.
    async fn create(&self, webhook: NewWebhook) -> Result<WebhookSavedResponse>;

    /// Lists one page of a hook's webhooks, newest first, with the total
    /// match count.
    ///
    /// # Errors
    ///
    /// Returns error if either query fails.
    async fn find_by_filter(
        &self,
        hook_id: &HookId,
        filter: &WebhookFilter,
    ) -> Result<PaginatedWebhooks>;
}

/// Container for the repositories used by the HTTP layer.
#[derive(Clone)]
pub struct Storage {
    /// Hook configuration.
    pub hooks: Arc<dyn HookRepository>,

    /// Captured webhooks.
    pub webhooks: Arc<dyn WebhookRepository>,

    pool: Option<PgPool>,
}

impl Storage {
    /// Creates PostgreSQL-backed storage sharing one pool.
    pub fn postgres(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(pool.clone());

        Self {
            hooks: Arc::new(hooks::Repository::new(shared.clone(), clock.clone())),
            webhooks: Arc::new(webhooks::Repository::new(shared, clock)),
            pool: Some(pool),
        }
    }

    /// Creates storage backed by a single in-memory store.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(memory::InMemoryStore::new(clock));

        Self { hooks: store.clone(), webhooks: store, pool: None }
    }

    /// Underlying pool, if PostgreSQL-backed.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Verifies the backing database answers queries.
    ///
    /// In-memory storage is always healthy.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        if let Some(pool) = &self.pool {
            let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("postgres", &self.pool.is_some()).finish_non_exhaustive()
    }
}

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// Returns `CoreError::Database` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("database migrations applied");

    Ok(())
}

/// Escapes `LIKE` metacharacters so user text matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Converts a `u32` limit or `u64` offset into a `BIGINT` bind value.
pub(crate) fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
