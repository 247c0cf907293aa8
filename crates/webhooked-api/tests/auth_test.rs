//! API key enforcement on hook creation and the shared response headers.

use http::{Method, StatusCode};
use webhooked_testing::{contracts::assert_error, HookBuilder, TestEnv, TestRequest};

fn create_without_key() -> TestRequest {
    TestRequest::new(Method::POST, "/api/hooks").json(&HookBuilder::new().build())
}

#[tokio::test]
async fn create_hook_without_key_is_unauthorized() {
    let env = TestEnv::new();

    let response = env.send(create_without_key()).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let body = response.json().unwrap();
    assert_error(&body);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["message"], "Missing API key");
}

#[tokio::test]
async fn create_hook_with_wrong_key_is_unauthorized() {
    let env = TestEnv::new();

    let response = env.send(create_without_key().api_key("not-the-key")).await.unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json().unwrap()["message"], "Invalid API key");
}

#[tokio::test]
async fn rejected_creation_stores_nothing() {
    let env = TestEnv::new();

    env.send(create_without_key()).await.unwrap();

    let hooks = env.get("/api/hooks").await.unwrap().json().unwrap();
    assert_eq!(hooks, serde_json::json!([]));
}

#[tokio::test]
async fn reads_do_not_require_a_key() {
    let env = TestEnv::new();
    let hook = env.create_hook(HookBuilder::new()).await.unwrap();
    let id = hook["id"].as_str().unwrap();

    for uri in [
        "/api/hooks".to_string(),
        format!("/api/hooks/{id}"),
        format!("/api/hooks/{id}/webhooks"),
    ] {
        assert_eq!(env.get(&uri).await.unwrap().status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let env = TestEnv::new();

    let ok = env.get("/api/healthcheck/liveness").await.unwrap();
    let unauthorized = env.send(create_without_key()).await.unwrap();

    for response in [ok, unauthorized] {
        let id = response.header("x-request-id").expect("missing x-request-id");
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let env = TestEnv::new();

    let response = env
        .send(
            TestRequest::new(Method::OPTIONS, "/api/hooks")
                .header("origin", "https://dashboard.example")
                .header("access-control-request-method", "POST"),
        )
        .await
        .unwrap();

    assert!(response.status.is_success());
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://dashboard.example")
    );
}
