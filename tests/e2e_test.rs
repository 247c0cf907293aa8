//! End-to-end tests for complete capture workflows.
//!
//! Drives the full router from hook registration through webhook capture to
//! listing. The in-memory tests always run; the PostgreSQL variant runs when
//! a test database is configured.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;
use webhooked_testing::{
    contracts::{assert_hook, assert_paginated_webhooks, assert_saved_webhook},
    HookBuilder, TestClock, TestDatabase, TestEnv, TestRequest, TEST_API_KEY,
};

/// Registers `orders-hook`, captures a webhook correlated by header and
/// reads it back.
async fn golden_capture_flow(env: &TestEnv, hook_name: &str) -> Result<()> {
    let response = env
        .send(TestRequest::new(Method::POST, "/api/hooks").api_key(TEST_API_KEY).json(&json!({
            "name": hook_name,
            "description": "x",
            "correlation_identifier_location": "header",
            "correlation_identifier_field": "X-Order-Id",
        })))
        .await?;
    assert_eq!(response.status, StatusCode::CREATED);

    let hook = response.json()?;
    assert_hook(&hook);
    let hook_id = hook["id"].as_str().unwrap_or_default();
    assert!(hook_id.starts_with("hook-"));
    let hook_url = hook["hook_url"].as_str().unwrap_or_default();
    assert_eq!(hook_url, format!("/api/hooks/{hook_id}/webhooks/receive"));

    let response = env
        .send(
            TestRequest::new(Method::POST, hook_url)
                .header("X-Order-Id", "42")
                .json(&json!({})),
        )
        .await?;
    assert_eq!(response.status, StatusCode::CREATED);
    let saved = response.json()?;
    assert_saved_webhook(&saved);
    assert_eq!(saved["correlation_value"], "42");

    let page = env.get(&format!("/api/hooks/{hook_id}/webhooks")).await?.json()?;
    assert_paginated_webhooks(&page);
    assert_eq!(page["total"], 1);

    let stored = &page["data"][0];
    assert_eq!(stored["id"], saved["id"]);
    assert_eq!(stored["method"], "POST");
    assert_eq!(stored["payload"], json!({}));
    assert_eq!(stored["headers"]["x-order-id"], "42");
    assert_eq!(stored["correlation_value"], "42");

    Ok(())
}

#[tokio::test]
async fn golden_capture_flow_in_memory() -> Result<()> {
    let env = TestEnv::new();

    golden_capture_flow(&env, "orders-hook").await
}

#[tokio::test]
async fn golden_capture_flow_postgres() -> Result<()> {
    let Some(database) = TestDatabase::from_env().await? else {
        eprintln!("skipping: WEBHOOKED_TEST_DATABASE_URL not set");
        return Ok(());
    };
    let clock = TestClock::new();
    let env = TestEnv::with_storage(database.storage(Arc::new(clock.clone())), clock);

    // Names are unique across runs sharing one database.
    let name = format!("orders-{}", &Uuid::new_v4().simple().to_string()[..8]);
    golden_capture_flow(&env, &name).await
}

#[tokio::test]
async fn search_matches_only_correlation_prefixes() -> Result<()> {
    let env = TestEnv::new();
    let hook = env
        .create_hook(HookBuilder::new().header_correlation("X-Order-Id"))
        .await?;
    let hook_id = hook["id"].as_str().unwrap_or_default().to_string();

    for value in ["42", "42-b", "order-42", "1420", "ORDER-1"] {
        env.receive(&hook_id, TestRequest::webhook(Method::POST).header("X-Order-Id", value))
            .await?;
        env.advance_time(Duration::from_secs(1));
    }

    let page = env.get(&format!("/api/hooks/{hook_id}/webhooks?search=42")).await?.json()?;
    let values: Vec<&str> = page["data"]
        .as_array()
        .map(|data| data.iter().filter_map(|w| w["correlation_value"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(values, ["42-b", "42"]);
    assert_eq!(page["total"], 2);

    let page = env.get(&format!("/api/hooks/{hook_id}/webhooks?search=order")).await?.json()?;
    assert_eq!(page["total"], 2, "prefix search is case-insensitive");

    Ok(())
}

#[tokio::test]
async fn hooks_do_not_see_each_others_webhooks() -> Result<()> {
    let env = TestEnv::new();
    let orders = env.create_hook(HookBuilder::new()).await?;
    let billing = env.create_hook(HookBuilder::new()).await?;

    let orders_id = orders["id"].as_str().unwrap_or_default();
    let billing_id = billing["id"].as_str().unwrap_or_default();
    for _ in 0..3 {
        env.receive(orders_id, TestRequest::webhook(Method::PUT)).await?;
    }
    env.receive(billing_id, TestRequest::webhook(Method::DELETE)).await?;

    let orders_page: Value = env.get(&format!("/api/hooks/{orders_id}/webhooks")).await?.json()?;
    let billing_page: Value = env.get(&format!("/api/hooks/{billing_id}/webhooks")).await?.json()?;

    assert_eq!(orders_page["total"], 3);
    assert_eq!(billing_page["total"], 1);
    assert_eq!(billing_page["data"][0]["method"], "DELETE");

    Ok(())
}
