//! OpenAPI document and Swagger UI tests.

use http::StatusCode;
use webhooked_testing::TestEnv;

#[tokio::test]
async fn openapi_json_is_served() {
    let env = TestEnv::new();

    let response = env.get("/api/openapi.json").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let doc = response.json().unwrap();
    assert_eq!(doc["info"]["title"], "Webhooked");
    assert!(doc["paths"]["/api/hooks"]["post"].is_object());
    assert!(doc["paths"]["/api/hooks/{hook_id}/webhooks"]["get"].is_object());
    assert!(doc["components"]["schemas"]["Hook"]["properties"]["hook_url"].is_object());
}

#[tokio::test]
async fn swagger_ui_is_served_without_api_key() {
    let env = TestEnv::new();

    let response = env.get("/docs/").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.content_type().unwrap_or_default().starts_with("text/html"));
    assert!(response.text().to_ascii_lowercase().contains("swagger"));
}

#[tokio::test]
async fn documented_limits_match_validation() {
    let env = TestEnv::new();

    let doc = env.get("/api/openapi.json").await.unwrap().json().unwrap();
    let params = doc["paths"]["/api/hooks/{hook_id}/webhooks"]["get"]["parameters"]
        .as_array()
        .unwrap()
        .clone();
    let limit = params.iter().find(|p| p["name"] == "limit").unwrap();

    assert_eq!(limit["in"], "query");
    assert_eq!(limit["schema"]["maximum"].as_f64(), Some(100.0));
}
