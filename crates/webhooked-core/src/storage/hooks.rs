//! PostgreSQL repository for hooks.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use tracing::{info, instrument};

use super::{escape_like, to_bigint, HookRepository};
use crate::{
    error::Result,
    models::{Hook, HookFilter, HookId, NewHook},
    time::Clock,
};

const HOOK_COLUMNS: &str = "id, name, description, correlation_identifier_location, \
                            correlation_identifier_field, created_at";

/// Repository for hook database operations.
pub struct Repository {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn create_impl<'e, E>(&self, executor: E, hook: NewHook) -> Result<Hook>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = HookId::new();
        let sql = format!(
            r"
            INSERT INTO hooks (
                id, name, description, correlation_identifier_location,
                correlation_identifier_field, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {HOOK_COLUMNS}
            "
        );

        let created = sqlx::query_as::<_, Hook>(&sql)
            .bind(&id)
            .bind(&hook.name)
            .bind(&hook.description)
            .bind(hook.correlation_identifier_location)
            .bind(&hook.correlation_identifier_field)
            .bind(self.clock.now_utc())
            .fetch_one(executor)
            .await?;

        info!(hook_id = %created.id, name = %created.name, "hook created");
        Ok(created)
    }
}

#[async_trait]
impl HookRepository for Repository {
    #[instrument(skip(self, hook), fields(name = %hook.name))]
    async fn create(&self, hook: NewHook) -> Result<Hook> {
        self.create_impl(&*self.pool, hook).await
    }

    async fn find_by_id(&self, id: &HookId) -> Result<Option<Hook>> {
        let sql = format!("SELECT {HOOK_COLUMNS} FROM hooks WHERE id = $1");

        let hook = sqlx::query_as::<_, Hook>(&sql).bind(id).fetch_optional(&*self.pool).await?;

        Ok(hook)
    }

    async fn find_by_filter(&self, filter: &HookFilter) -> Result<Vec<Hook>> {
        let sql = format!(
            r"
            SELECT {HOOK_COLUMNS}
            FROM hooks
            WHERE ($1::text IS NULL OR id ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR name ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        );

        let hooks = sqlx::query_as::<_, Hook>(&sql)
            .bind(filter.id.as_deref().map(|id| format!("%{}%", escape_like(id))))
            .bind(filter.name.as_deref().map(|name| format!("%{}%", escape_like(name))))
            .bind(to_bigint(u64::from(filter.effective_limit())))
            .bind(to_bigint(filter.offset))
            .fetch_all(&*self.pool)
            .await?;

        Ok(hooks)
    }
}
