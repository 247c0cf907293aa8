//! PostgreSQL repository for captured webhooks.
//!
//! `query`, `payload` and `headers` are JSONB columns; [`WebhookRow`]
//! carries them through sqlx's `Json` wrapper and converts into the domain
//! [`Webhook`].

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, Executor, PgPool, Postgres};
use tracing::{info, instrument};

use super::{escape_like, to_bigint, WebhookRepository};
use crate::{
    error::Result,
    models::{
        HookId, NewWebhook, PaginatedWebhooks, Webhook, WebhookFilter, WebhookId,
        WebhookSavedResponse,
    },
    time::Clock,
};

/// Repository for webhook database operations.
pub struct Repository {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

#[derive(sqlx::FromRow)]
struct WebhookRow {
    id: WebhookId,
    hook_id: HookId,
    method: String,
    query: Json<Map<String, Value>>,
    payload: Json<Map<String, Value>>,
    headers: Json<BTreeMap<String, String>>,
    correlation_value: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<WebhookRow> for Webhook {
    fn from(row: WebhookRow) -> Self {
        Self {
            id: row.id,
            hook_id: row.hook_id,
            method: row.method,
            query: row.query.0,
            payload: row.payload.0,
            headers: row.headers.0,
            correlation_value: row.correlation_value,
            created_at: row.created_at,
        }
    }
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn create_impl<'e, E>(
        &self,
        executor: E,
        webhook: NewWebhook,
    ) -> Result<WebhookSavedResponse>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, WebhookSavedResponse>(
            r"
            INSERT INTO webhooks (
                id, hook_id, method, query, payload, headers,
                correlation_value, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, hook_id, correlation_value, created_at
            ",
        )
        .bind(WebhookId::new())
        .bind(&webhook.hook_id)
        .bind(&webhook.method)
        .bind(Json(&webhook.query))
        .bind(Json(&webhook.payload))
        .bind(Json(&webhook.headers))
        .bind(&webhook.correlation_value)
        .bind(self.clock.now_utc())
        .fetch_one(executor)
        .await?;

        info!(webhook_id = %saved.id, hook_id = %saved.hook_id, "webhook stored");
        Ok(saved)
    }

    async fn count_impl<'e, E>(
        &self,
        executor: E,
        hook_id: &HookId,
        search: Option<&str>,
        method: Option<&str>,
    ) -> Result<u64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM webhooks
            WHERE hook_id = $1
              AND ($2::text IS NULL OR correlation_value ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR method = $3)
            ",
        )
        .bind(hook_id)
        .bind(search)
        .bind(method)
        .fetch_one(executor)
        .await?;

        Ok(u64::try_from(total).unwrap_or_default())
    }
}

#[async_trait]
impl WebhookRepository for Repository {
    #[instrument(skip(self, webhook), fields(hook_id = %webhook.hook_id, method = %webhook.method))]
    async fn create(&self, webhook: NewWebhook) -> Result<WebhookSavedResponse> {
        self.create_impl(&*self.pool, webhook).await
    }

    async fn find_by_filter(
        &self,
        hook_id: &HookId,
        filter: &WebhookFilter,
    ) -> Result<PaginatedWebhooks> {
        let limit = filter.effective_limit();
        let search = filter.search.as_deref().map(|s| format!("{}%", escape_like(s)));
        let method = filter.method.as_deref();

        let rows = sqlx::query_as::<_, WebhookRow>(
            r"
            SELECT id, hook_id, method, query, payload, headers,
                   correlation_value, created_at
            FROM webhooks
            WHERE hook_id = $1
              AND ($2::text IS NULL OR correlation_value ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR method = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(hook_id)
        .bind(search.as_deref())
        .bind(method)
        .bind(to_bigint(u64::from(limit)))
        .bind(to_bigint(filter.offset))
        .fetch_all(&*self.pool)
        .await?;

        let total = self.count_impl(&*self.pool, hook_id, search.as_deref(), method).await?;

        Ok(PaginatedWebhooks {
            data: rows.into_iter().map(Webhook::from).collect(),
            limit,
            offset: filter.offset,
            total,
        })
    }
}
