//! Integration tests for the PostgreSQL repositories.
//!
//! Run against the database named by `WEBHOOKED_TEST_DATABASE_URL` (or
//! `DATABASE_URL`). Tests return early when neither is set.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use serde_json::{json, Map, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;
use webhooked_core::{
    storage::run_migrations, CoreError, CorrelationLocation, HookFilter, HookId, NewHook,
    NewWebhook, Storage, TestClock, WebhookFilter,
};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("WEBHOOKED_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    Some(pool)
}

macro_rules! require_db {
    () => {
        match test_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("skipping: WEBHOOKED_TEST_DATABASE_URL not set");
                return;
            },
        }
    };
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn new_hook(name: String) -> NewHook {
    NewHook {
        name,
        description: "integration".to_string(),
        correlation_identifier_location: Some(CorrelationLocation::Payload),
        correlation_identifier_field: Some("$.order.id".to_string()),
    }
}

fn new_webhook(hook_id: &HookId, method: &str, correlation: Option<&str>) -> NewWebhook {
    let mut query = Map::new();
    query.insert("tag".to_string(), json!(["a", "b"]));
    let mut payload = Map::new();
    payload.insert("order".to_string(), json!({"id": correlation}));

    NewWebhook {
        hook_id: hook_id.clone(),
        method: method.to_string(),
        query,
        payload,
        headers: BTreeMap::from([("x-source".to_string(), "test".to_string())]),
        correlation_value: correlation.map(str::to_string),
    }
}

#[tokio::test]
async fn storage_health_check() {
    let pool = require_db!();
    let storage = Storage::postgres(pool, Arc::new(TestClock::new()));

    assert!(storage.health_check().await.is_ok());
}

#[tokio::test]
async fn hooks_table_indexes() {
    let pool = require_db!();

    let indexes: Vec<(String,)> = sqlx::query_as(
        "SELECT indexname FROM pg_indexes WHERE tablename = 'hooks' ORDER BY indexname",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let names: Vec<&str> = indexes.iter().map(|(name,)| name.as_str()).collect();

    assert_eq!(names, ["hooks_name_key", "hooks_pkey", "idx_hooks_created_at"]);
}

#[tokio::test]
async fn hook_round_trips_through_postgres() {
    let pool = require_db!();
    let storage = Storage::postgres(pool, Arc::new(TestClock::new()));

    let hook = storage.hooks.create(new_hook(unique_name("pg-hook"))).await.unwrap();
    let found = storage.hooks.find_by_id(&hook.id).await.unwrap().unwrap();

    assert_eq!(found.id, hook.id);
    assert_eq!(found.correlation_identifier_location, Some(CorrelationLocation::Payload));
    assert_eq!(found.correlation_identifier_field.as_deref(), Some("$.order.id"));
}

#[tokio::test]
async fn duplicate_hook_name_is_constraint_violation() {
    let pool = require_db!();
    let storage = Storage::postgres(pool, Arc::new(TestClock::new()));
    let name = unique_name("pg-dup");

    storage.hooks.create(new_hook(name.clone())).await.unwrap();
    let err = storage.hooks.create(new_hook(name)).await.unwrap_err();

    assert!(matches!(err, CoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn hook_name_filter_treats_wildcards_literally() {
    let pool = require_db!();
    let storage = Storage::postgres(pool, Arc::new(TestClock::new()));
    let marker = unique_name("pct");
    storage.hooks.create(new_hook(format!("{marker}%x"))).await.unwrap();
    storage.hooks.create(new_hook(format!("{marker}ax"))).await.unwrap();

    let hooks = storage
        .hooks
        .find_by_filter(&HookFilter::default().with_name(format!("{}%X", marker.to_uppercase())))
        .await
        .unwrap();

    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0].name, format!("{marker}%x"));
}

#[tokio::test]
async fn webhook_with_unknown_hook_is_constraint_violation() {
    let pool = require_db!();
    let storage = Storage::postgres(pool, Arc::new(TestClock::new()));

    let err = storage
        .webhooks
        .create(new_webhook(&HookId::from(unique_name("hook-missing")), "POST", None))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn webhooks_page_with_totals_and_prefix_search() {
    let pool = require_db!();
    let clock = TestClock::new();
    let storage = Storage::postgres(pool, Arc::new(clock.clone()));
    let hook = storage.hooks.create(new_hook(unique_name("pg-list"))).await.unwrap();

    for value in ["42-a", "x-42", "42_b", "420"] {
        storage.webhooks.create(new_webhook(&hook.id, "POST", Some(value))).await.unwrap();
        clock.advance(Duration::from_millis(5));
    }
    storage.webhooks.create(new_webhook(&hook.id, "PUT", None)).await.unwrap();

    let all = storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::new(2, 0)).await.unwrap();
    assert_eq!(all.total, 5);
    assert_eq!(all.data.len(), 2);
    assert_eq!(all.data[0].method, "PUT");
    assert_eq!(all.data[1].query.get("tag"), Some(&json!(["a", "b"])));

    let search = storage
        .webhooks
        .find_by_filter(&hook.id, &WebhookFilter::default().with_search("42"))
        .await
        .unwrap();
    let values: Vec<_> = search.data.iter().filter_map(|w| w.correlation_value.clone()).collect();
    assert_eq!(values, vec!["420", "42_b", "42-a"]);
    assert_eq!(search.total, 3);

    let underscore = storage
        .webhooks
        .find_by_filter(&hook.id, &WebhookFilter::default().with_search("42_"))
        .await
        .unwrap();
    assert_eq!(underscore.total, 1);

    let by_method = storage
        .webhooks
        .find_by_filter(&hook.id, &WebhookFilter::default().with_method("PUT"))
        .await
        .unwrap();
    assert_eq!(by_method.total, 1);
    assert_eq!(by_method.data[0].payload.get("order"), Some(&json!({"id": Value::Null})));
}
