//! Repository behaviour against the in-memory store.
//!
//! Exercises the same contract the PostgreSQL repositories implement:
//! ordering, filtering, pagination totals and constraint violations.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use serde_json::{json, Map, Value};
use webhooked_core::{
    CoreError, CorrelationLocation, HookFilter, HookId, NewHook, NewWebhook, Storage, TestClock,
    WebhookFilter,
};

fn storage() -> (Storage, TestClock) {
    let clock = TestClock::new();
    (Storage::in_memory(Arc::new(clock.clone())), clock)
}

fn new_hook(name: &str) -> NewHook {
    NewHook {
        name: name.to_string(),
        description: format!("{name} description"),
        correlation_identifier_location: Some(CorrelationLocation::Header),
        correlation_identifier_field: Some("x-order-id".to_string()),
    }
}

fn new_webhook(hook_id: &HookId, method: &str, correlation: Option<&str>) -> NewWebhook {
    let mut payload = Map::new();
    payload.insert("n".to_string(), Value::from(1));

    NewWebhook {
        hook_id: hook_id.clone(),
        method: method.to_string(),
        query: Map::new(),
        payload,
        headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
        correlation_value: correlation.map(str::to_string),
    }
}

#[tokio::test]
async fn create_and_find_hook() {
    let (storage, _clock) = storage();

    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();
    let found = storage.hooks.find_by_id(&hook.id).await.unwrap();

    assert!(hook.id.as_str().starts_with("hook-"));
    assert_eq!(found, Some(hook.clone()));
    assert_eq!(hook.hook_url(), format!("/api/hooks/{}/webhooks/receive", hook.id));
}

#[tokio::test]
async fn unknown_hook_is_none() {
    let (storage, _clock) = storage();

    let found = storage.hooks.find_by_id(&HookId::from("hook-missing")).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn hook_filter_matches_substrings_case_insensitively() {
    let (storage, clock) = storage();
    for name in ["Orders-hook", "payments", "orders-eu"] {
        storage.hooks.create(new_hook(name)).await.unwrap();
        clock.advance(Duration::from_secs(1));
    }

    let hooks = storage.hooks.find_by_filter(&HookFilter::default().with_name("ORDERS")).await.unwrap();

    let names: Vec<_> = hooks.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["orders-eu", "Orders-hook"]);
}

#[tokio::test]
async fn hook_filter_by_partial_id() {
    let (storage, _clock) = storage();
    let target = storage.hooks.create(new_hook("target-hook")).await.unwrap();
    storage.hooks.create(new_hook("other-hook")).await.unwrap();

    let suffix = &target.id.as_str()[target.id.as_str().len() - 12..];
    let hooks = storage.hooks.find_by_filter(&HookFilter::default().with_id(suffix)).await.unwrap();

    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0].id, target.id);
}

#[tokio::test]
async fn hook_listing_paginates() {
    let (storage, clock) = storage();
    for i in 0..5 {
        storage.hooks.create(new_hook(&format!("hook-number-{i}"))).await.unwrap();
        clock.advance(Duration::from_secs(1));
    }

    let page = storage.hooks.find_by_filter(&HookFilter::new(2, 1)).await.unwrap();

    let names: Vec<_> = page.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["hook-number-3", "hook-number-2"]);
}

#[tokio::test]
async fn webhook_requires_existing_hook() {
    let (storage, _clock) = storage();

    let err = storage
        .webhooks
        .create(new_webhook(&HookId::from("hook-missing"), "POST", None))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn saved_response_reflects_stored_row() {
    let (storage, _clock) = storage();
    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();

    let saved = storage.webhooks.create(new_webhook(&hook.id, "POST", Some("42"))).await.unwrap();
    let page = storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default()).await.unwrap();

    assert!(saved.id.as_str().starts_with("wh-"));
    assert_eq!(saved.hook_id, hook.id);
    assert_eq!(saved.correlation_value.as_deref(), Some("42"));
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].id, saved.id);
    assert_eq!(page.data[0].payload.get("n"), Some(&json!(1)));
}

#[tokio::test]
async fn webhook_search_is_a_case_insensitive_prefix() {
    let (storage, clock) = storage();
    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();
    for value in ["42-a", "ORD-42", "42-B", "ord-1"] {
        storage.webhooks.create(new_webhook(&hook.id, "POST", Some(value))).await.unwrap();
        clock.advance(Duration::from_millis(10));
    }
    storage.webhooks.create(new_webhook(&hook.id, "POST", None)).await.unwrap();

    let by_number =
        storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default().with_search("42")).await.unwrap();
    let by_prefix =
        storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default().with_search("Ord")).await.unwrap();

    let values = |page: &webhooked_core::PaginatedWebhooks| {
        page.data.iter().filter_map(|w| w.correlation_value.clone()).collect::<Vec<_>>()
    };
    assert_eq!(values(&by_number), vec!["42-B", "42-a"]);
    assert_eq!(values(&by_prefix), vec!["ord-1", "ORD-42"]);
}

#[tokio::test]
async fn webhook_method_filter_is_exact() {
    let (storage, _clock) = storage();
    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();
    storage.webhooks.create(new_webhook(&hook.id, "POST", None)).await.unwrap();
    storage.webhooks.create(new_webhook(&hook.id, "PUT", None)).await.unwrap();

    let page =
        storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default().with_method("PUT")).await.unwrap();
    let lowercase =
        storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default().with_method("put")).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].method, "PUT");
    assert_eq!(lowercase.total, 0);
}

#[tokio::test]
async fn webhook_total_ignores_pagination() {
    let (storage, clock) = storage();
    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();
    let other = storage.hooks.create(new_hook("other-hook")).await.unwrap();
    for _ in 0..7 {
        storage.webhooks.create(new_webhook(&hook.id, "POST", None)).await.unwrap();
        clock.advance(Duration::from_millis(1));
    }
    storage.webhooks.create(new_webhook(&other.id, "POST", None)).await.unwrap();

    let page = storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::new(3, 5)).await.unwrap();

    assert_eq!(page.total, 7);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.limit, 3);
    assert_eq!(page.offset, 5);
}

#[tokio::test]
async fn webhook_listing_is_stable_when_timestamps_tie() {
    let (storage, _clock) = storage();
    let hook = storage.hooks.create(new_hook("orders-hook")).await.unwrap();
    for _ in 0..4 {
        storage.webhooks.create(new_webhook(&hook.id, "POST", None)).await.unwrap();
    }

    let first = storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default()).await.unwrap();
    let second = storage.webhooks.find_by_filter(&hook.id, &WebhookFilter::default()).await.unwrap();

    assert_eq!(first, second);
    let ids: Vec<_> = first.data.iter().map(|w| w.id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.reverse();
    assert_eq!(ids, sorted);
}
