//! In-memory implementation of both repositories.
//!
//! Not durable: all state is lost when the process exits. Hooks and
//! webhooks live in `HashMap`s guarded by `tokio::sync::RwLock`; writes are
//! serialized, reads run concurrently.
//!
//! The store mirrors the database constraints that callers can observe:
//! hook names are unique and a webhook must reference an existing hook.
//! Listing scans every row, which is fine for test-sized data.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::{HookRepository, WebhookRepository};
use crate::{
    error::{CoreError, Result},
    models::{
        Hook, HookFilter, HookId, NewHook, NewWebhook, PaginatedWebhooks, Webhook, WebhookFilter,
        WebhookId, WebhookSavedResponse,
    },
    time::Clock,
};

/// Hook and webhook store held entirely in process memory.
pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    hooks: RwLock<HashMap<HookId, Hook>>,
    webhooks: RwLock<HashMap<WebhookId, Webhook>>,
}

impl InMemoryStore {
    /// Creates an empty store stamping rows with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, hooks: RwLock::new(HashMap::new()), webhooks: RwLock::new(HashMap::new()) }
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

fn newest_first<'a>(
    a: (&'a chrono::DateTime<chrono::Utc>, &'a str),
    b: (&'a chrono::DateTime<chrono::Utc>, &'a str),
) -> Ordering {
    b.0.cmp(a.0).then_with(|| b.1.cmp(a.1))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn page<T>(items: Vec<T>, limit: u32, offset: u64) -> Vec<T> {
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(take).collect()
}

#[async_trait]
impl HookRepository for InMemoryStore {
    async fn create(&self, hook: NewHook) -> Result<Hook> {
        let mut hooks = self.hooks.write().await;

        if hooks.values().any(|existing| existing.name == hook.name) {
            return Err(CoreError::ConstraintViolation(format!(
                "unique constraint violation: hook name '{}' already exists",
                hook.name
            )));
        }

        let created = Hook {
            id: HookId::new(),
            name: hook.name,
            description: hook.description,
            correlation_identifier_location: hook.correlation_identifier_location,
            correlation_identifier_field: hook.correlation_identifier_field,
            created_at: self.clock.now_utc(),
        };
        hooks.insert(created.id.clone(), created.clone());

        info!(hook_id = %created.id, name = %created.name, "hook created");
        Ok(created)
    }

    async fn find_by_id(&self, id: &HookId) -> Result<Option<Hook>> {
        Ok(self.hooks.read().await.get(id).cloned())
    }

    async fn find_by_filter(&self, filter: &HookFilter) -> Result<Vec<Hook>> {
        let hooks = self.hooks.read().await;

        let mut matching: Vec<Hook> = hooks
            .values()
            .filter(|hook| {
                filter.id.as_deref().is_none_or(|id| contains_ignore_case(hook.id.as_str(), id))
            })
            .filter(|hook| {
                filter.name.as_deref().is_none_or(|name| contains_ignore_case(&hook.name, name))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            newest_first((&a.created_at, a.id.as_str()), (&b.created_at, b.id.as_str()))
        });

        Ok(page(matching, filter.effective_limit(), filter.offset))
    }
}

#[async_trait]
impl WebhookRepository for InMemoryStore {
    async fn create(&self, webhook: NewWebhook) -> Result<WebhookSavedResponse> {
        if !self.hooks.read().await.contains_key(&webhook.hook_id) {
            return Err(CoreError::ConstraintViolation(format!(
                "foreign key constraint violation: hook '{}' does not exist",
                webhook.hook_id
            )));
        }

        let stored = Webhook {
            id: WebhookId::new(),
            hook_id: webhook.hook_id,
            method: webhook.method,
            query: webhook.query,
            payload: webhook.payload,
            headers: webhook.headers,
            correlation_value: webhook.correlation_value,
            created_at: self.clock.now_utc(),
        };
        let saved = WebhookSavedResponse::from(&stored);
        self.webhooks.write().await.insert(stored.id.clone(), stored);

        info!(webhook_id = %saved.id, hook_id = %saved.hook_id, "webhook stored");
        Ok(saved)
    }

    async fn find_by_filter(
        &self,
        hook_id: &HookId,
        filter: &WebhookFilter,
    ) -> Result<PaginatedWebhooks> {
        let webhooks = self.webhooks.read().await;
        let search = filter.search.as_deref().map(str::to_lowercase);

        let mut matching: Vec<Webhook> = webhooks
            .values()
            .filter(|webhook| &webhook.hook_id == hook_id)
            .filter(|webhook| {
                search.as_deref().is_none_or(|prefix| {
                    webhook
                        .correlation_value
                        .as_deref()
                        .is_some_and(|value| value.to_lowercase().starts_with(prefix))
                })
            })
            .filter(|webhook| filter.method.as_deref().is_none_or(|m| webhook.method == m))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            newest_first((&a.created_at, a.id.as_str()), (&b.created_at, b.id.as_str()))
        });

        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);
        let limit = filter.effective_limit();

        Ok(PaginatedWebhooks {
            data: page(matching, limit, filter.offset),
            limit,
            offset: filter.offset,
            total,
        })
    }
}
